//! Scalar helpers for turning raw network outputs into normalized values.

/// Logistic function, evaluated without overflowing `exp` for large `|x|`.
///
/// Both networks emit logits: BlazeFace for face scores, the regressor for
/// crop-relative landmark coordinates.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Clamps a coordinate into the normalized `[0, 1]` range.
#[inline]
pub fn clamp_unit(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_sigmoid_saturates_without_nan() {
        assert!((sigmoid(1000.0) - 1.0).abs() < f32::EPSILON);
        assert!(sigmoid(-1000.0).abs() < f32::EPSILON);
        assert!(!sigmoid(-1000.0).is_nan());
    }

    #[test]
    fn test_sigmoid_is_symmetric() {
        for x in [0.3, 2.0, 7.5] {
            assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_clamp_unit() {
        assert!(clamp_unit(-0.2).abs() < f32::EPSILON);
        assert!((clamp_unit(0.4) - 0.4).abs() < f32::EPSILON);
        assert!((clamp_unit(1.7) - 1.0).abs() < f32::EPSILON);
    }
}
