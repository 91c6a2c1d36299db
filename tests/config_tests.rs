// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration defaults and the output directory

mod common;

use common::temp_dir;
use snapcam::config::{AppTheme, Config};
use snapcam::pipelines::photo::EncodingQuality;
use snapcam::session::LensFacing;
use snapcam::storage::{OutputDirectory, StorageLocation};

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.app_theme, AppTheme::System);
    assert_eq!(config.lens_facing, LensFacing::Back);
    assert_eq!(config.storage_location, StorageLocation::Scoped);
    assert_eq!(config.photo_quality, EncodingQuality::High);
    assert!(config.shutter_sound);
}

#[test]
fn test_output_directory_is_created() {
    let root = temp_dir("snapcam-output");
    let primary = root.join("Pictures").join("SnapCam");

    let dir = OutputDirectory::resolve_with(Some(primary.clone()), root.join("fallback"));
    assert_eq!(dir.path(), primary.as_path());
    assert!(primary.is_dir());

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_output_directory_falls_back_when_primary_is_a_file() {
    let root = temp_dir("snapcam-output");
    let blocked = root.join("blocked");
    std::fs::write(&blocked, b"not a directory").unwrap();
    let fallback = root.join("fallback");

    let dir = OutputDirectory::resolve_with(Some(blocked.join("SnapCam")), fallback.clone());
    assert_eq!(dir.path(), fallback.as_path());
    assert!(fallback.is_dir());

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_output_directory_without_primary_uses_fallback() {
    let root = temp_dir("snapcam-output");
    let dir = OutputDirectory::resolve_with(None, root.clone());
    assert_eq!(dir.path(), root.as_path());
    std::fs::remove_dir_all(&root).unwrap();
}
