//! Models directory override behavior.

use std::path::PathBuf;

use face_landmarks_adapters::models::{all_models_installed, list_models};
use face_landmarks_adapters::{model_path, models_dir, set_models_dir};

#[test]
#[allow(clippy::unwrap_used)]
fn test_override_controls_model_paths() {
    let dir = tempfile::tempdir().unwrap();
    set_models_dir(Some(dir.path().to_path_buf()));

    assert_eq!(models_dir(), dir.path());
    assert_eq!(
        model_path("blazeface"),
        Some(dir.path().join("blazeface.safetensors"))
    );
    assert_eq!(model_path("unknown"), None);
    assert!(!all_models_installed());

    std::fs::write(dir.path().join("blazeface.safetensors"), b"").unwrap();
    let listed = list_models();
    assert!(listed.contains(&("blazeface".to_string(), true)));
    assert!(listed.contains(&("landmarks68".to_string(), false)));

    set_models_dir(None);
    assert_ne!(models_dir(), PathBuf::from(dir.path()));
}
