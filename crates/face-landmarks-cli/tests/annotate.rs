//! End-to-end tests for the annotate subcommand.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::path::Path;

use assert_cmd::Command;
use face_landmarks_test_support::SyntheticImageBuilder;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("face-landmarks").unwrap();
    cmd.current_dir(home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"));
    cmd
}

fn write_png(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    SyntheticImageBuilder::checkerboard(64, 64, 8)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

#[test]
fn test_empty_input_directory_succeeds() {
    let home = tempfile::tempdir().unwrap();
    let input = home.path().join("in");
    std::fs::create_dir_all(&input).unwrap();

    cmd(&home)
        .args(["annotate", "--quiet", "--output"])
        .arg(home.path().join("out"))
        .arg(&input)
        .assert()
        .success();
}

#[test]
fn test_missing_models_stop_on_first_image() {
    let home = tempfile::tempdir().unwrap();
    let models = tempfile::tempdir().unwrap();
    let input = home.path().join("in");
    write_png(&input.join("a.png"));
    write_png(&input.join("b.png"));

    cmd(&home)
        .args(["annotate", "--quiet", "--models-dir"])
        .arg(models.path())
        .arg("--output")
        .arg(home.path().join("out"))
        .arg(&input)
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("error: ").and(predicate::str::contains("model not found")),
        );

    assert!(!home.path().join("out").join("a.json").exists());
}

#[test]
fn test_keep_going_still_fails_at_end() {
    let home = tempfile::tempdir().unwrap();
    let models = tempfile::tempdir().unwrap();
    let input = home.path().join("in");
    write_png(&input.join("a.png"));
    write_png(&input.join("nested").join("b.png"));

    cmd(&home)
        .args(["annotate", "-r", "--keep-going", "--models-dir"])
        .arg(models.path())
        .arg("--output")
        .arg(home.path().join("out"))
        .arg(&input)
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("b.png: ").and(predicate::str::contains("model not found")),
        );
}

#[test]
fn test_missing_output_flag_is_a_clap_error() {
    let home = tempfile::tempdir().unwrap();

    cmd(&home)
        .args(["annotate", "photos"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("path to .jpg").not())
        .stderr(predicate::str::contains("--output"));
}
