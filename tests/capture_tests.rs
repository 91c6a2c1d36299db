// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture routine and the status line

mod common;

use common::{FakeCamera, temp_dir};
use snapcam::errors::ImageCaptureError;
use snapcam::pipelines::photo::{EncodingQuality, take_photo};
use snapcam::session::{
    CameraProvider, CameraSelector, CaptureExecutor, ImageCapture, Lifecycle, Preview,
};
use snapcam::storage::{CapturedFile, StatusLabel};
use std::path::Path;
use std::sync::mpsc;
use url::Url;

type CaptureResult = Result<CapturedFile, ImageCaptureError>;

fn capture_once(capture: &ImageCapture, dir: &Path, executor: &CaptureExecutor) -> CaptureResult {
    let (tx, rx) = mpsc::channel();
    take_photo(
        capture,
        dir,
        executor,
        None,
        Box::new(move |result: CaptureResult| {
            tx.send(result).unwrap();
        }),
    );
    rx.recv().unwrap()
}

/// `yyyy-MM-dd-HH-mm-ss-SSS.jpg`
fn is_timestamp_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".jpg") else {
        return false;
    };
    let groups: Vec<&str> = stem.split('-').collect();
    let widths = [4, 2, 2, 2, 2, 2, 3];
    groups.len() == widths.len()
        && groups
            .iter()
            .zip(widths)
            .all(|(g, w)| g.len() == w && g.chars().all(|c| c.is_ascii_digit()))
}

#[test]
fn test_two_captures_write_two_files_and_status_shows_latest() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let owner = Lifecycle::new("test");
    let capture = ImageCapture::new(EncodingQuality::High);
    provider
        .bind_to_lifecycle(&owner, &CameraSelector::default(), &Preview::new(), &capture)
        .unwrap();
    camera.push_frame(200);

    // A space in the path exercises the %20 decoding
    let root = temp_dir("snapcam storage");
    let dir = root.join("SnapCam");
    std::fs::create_dir_all(&dir).unwrap();
    let executor = CaptureExecutor::new().unwrap();
    let mut status = StatusLabel::new(Url::from_directory_path(&root).ok(), "Internal storage: ");

    let first = capture_once(&capture, &dir, &executor).unwrap();
    status.show_capture(&first);
    let second = capture_once(&capture, &dir, &executor).unwrap();
    status.show_capture(&second);

    assert_ne!(first.path, second.path);
    assert!(first.path.is_file());
    assert!(second.path.is_file());
    assert!(is_timestamp_name(&first.file_name()));
    assert!(is_timestamp_name(&second.file_name()));

    let decoded = image::open(&second.path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 2));

    assert_eq!(
        status.text(),
        format!("Internal storage: SnapCam/{}", second.file_name())
    );
    assert!(!status.text().contains(&first.file_name()));
    assert!(!status.text().contains("file://"));
    assert!(!status.text().contains("%20"));

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_back_to_back_captures_both_land() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let owner = Lifecycle::new("test");
    let capture = ImageCapture::new(EncodingQuality::Medium);
    provider
        .bind_to_lifecycle(&owner, &CameraSelector::default(), &Preview::new(), &capture)
        .unwrap();
    camera.push_frame(90);

    let dir = temp_dir("snapcam-burst");
    let executor = CaptureExecutor::new().unwrap();
    let (tx, rx) = mpsc::channel();
    // Second request is issued before the first one has been answered
    for _ in 0..2 {
        let tx = tx.clone();
        take_photo(
            &capture,
            &dir,
            &executor,
            None,
            Box::new(move |result: CaptureResult| {
                tx.send(result).unwrap();
            }),
        );
    }

    let first = rx.recv().unwrap().unwrap();
    let second = rx.recv().unwrap().unwrap();
    assert_ne!(first.path, second.path);
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_relative_output_dir_reports_absolute_file() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let owner = Lifecycle::new("test");
    let capture = ImageCapture::new(EncodingQuality::High);
    provider
        .bind_to_lifecycle(&owner, &CameraSelector::default(), &Preview::new(), &capture)
        .unwrap();
    camera.push_frame(128);

    let dir = Path::new("target").join(format!("snapcam-relative-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let executor = CaptureExecutor::new().unwrap();

    let saved = capture_once(&capture, &dir, &executor).unwrap();
    assert!(saved.path.is_absolute());
    assert!(saved.path.is_file());
    assert!(saved.uri.as_str().starts_with("file:///"));
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_capture_without_frame_reports_error() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let owner = Lifecycle::new("test");
    let capture = ImageCapture::new(EncodingQuality::Low);
    provider
        .bind_to_lifecycle(&owner, &CameraSelector::default(), &Preview::new(), &capture)
        .unwrap();

    let dir = temp_dir("snapcam-noframe");
    let executor = CaptureExecutor::new().unwrap();
    let result = capture_once(&capture, &dir, &executor);
    assert!(matches!(result, Err(ImageCaptureError::NoFrameAvailable)));
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_capture_after_owner_destroyed_reports_camera_closed() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let owner = Lifecycle::new("test");
    let capture = ImageCapture::new(EncodingQuality::High);
    provider
        .bind_to_lifecycle(&owner, &CameraSelector::default(), &Preview::new(), &capture)
        .unwrap();
    camera.push_frame(10);
    owner.destroy();

    let dir = temp_dir("snapcam-closed");
    let executor = CaptureExecutor::new().unwrap();
    let result = capture_once(&capture, &dir, &executor);
    assert!(matches!(result, Err(ImageCaptureError::CameraClosed)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_shut_down_executor_still_answers_callback() {
    let capture = ImageCapture::new(EncodingQuality::High);
    let executor = CaptureExecutor::new().unwrap();
    executor.shutdown();

    let result = capture_once(&capture, &std::env::temp_dir(), &executor);
    assert!(matches!(result, Err(ImageCaptureError::Rejected(_))));
}
