// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for session binding

mod common;

use common::FakeCamera;
use snapcam::pipelines::photo::EncodingQuality;
use snapcam::session::{
    CameraProvider, CameraSelector, ImageCapture, LensFacing, Lifecycle, Preview,
};

fn bind(
    provider: &CameraProvider,
    owner: &Lifecycle,
    facing: LensFacing,
    capture: &ImageCapture,
) -> snapcam::session::BoundCamera {
    provider
        .bind_to_lifecycle(owner, &CameraSelector::new(facing), &Preview::new(), capture)
        .expect("bind should succeed on the fake backend")
}

#[test]
fn test_rebinding_never_leaves_two_sessions() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let owner = Lifecycle::new("test");
    let capture = ImageCapture::new(EncodingQuality::High);

    for facing in [LensFacing::Back, LensFacing::Front, LensFacing::Back] {
        bind(&provider, &owner, facing, &capture);
        assert_eq!(camera.running_sessions(), 1);
    }
    assert_eq!(camera.initializations(), 3);
}

#[test]
fn test_lens_toggle_selects_other_camera() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let owner = Lifecycle::new("test");
    let capture = ImageCapture::new(EncodingQuality::High);

    let back = bind(&provider, &owner, LensFacing::Back, &capture);
    assert_eq!(back.device.name, "Rear");

    let front = bind(&provider, &owner, LensFacing::Back.toggled(), &capture);
    assert_eq!(front.device.name, "Selfie");
    assert_eq!(camera.current_device().map(|d| d.name), Some("Selfie".to_string()));
}

#[test]
fn test_destroying_owner_unbinds() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let owner = Lifecycle::new("test");
    let capture = ImageCapture::new(EncodingQuality::High);

    bind(&provider, &owner, LensFacing::Back, &capture);
    assert!(provider.is_bound());
    assert!(capture.is_bound());

    owner.destroy();
    assert!(!provider.is_bound());
    assert!(!capture.is_bound());
    assert_eq!(camera.running_sessions(), 0);
}

#[test]
fn test_stale_owner_does_not_unbind_newer_session() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let capture = ImageCapture::new(EncodingQuality::High);

    let first_owner = Lifecycle::new("first");
    bind(&provider, &first_owner, LensFacing::Back, &capture);

    let second_owner = Lifecycle::new("second");
    bind(&provider, &second_owner, LensFacing::Front, &capture);

    first_owner.destroy();
    assert!(provider.is_bound());
    assert_eq!(camera.running_sessions(), 1);
}

#[test]
fn test_frames_reach_preview_and_capture() {
    let camera = FakeCamera::default();
    let provider = CameraProvider::new(camera.backend());
    let owner = Lifecycle::new("test");
    let preview = Preview::new();
    let capture = ImageCapture::new(EncodingQuality::High);

    let (tx, mut rx) = futures::channel::mpsc::channel(4);
    preview.set_surface_provider(Some(tx));
    provider
        .bind_to_lifecycle(&owner, &CameraSelector::default(), &preview, &capture)
        .unwrap();

    camera.push_frame(128);
    assert!(capture.has_frame());
    let frame = rx.try_next().unwrap().unwrap();
    assert_eq!((frame.width, frame.height), (4, 2));
}
