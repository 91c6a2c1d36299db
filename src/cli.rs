// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! - Listing available cameras
//! - Taking a single photo headlessly, through the same session binder and
//!   capture routine the window uses

use snapcam::backends::camera::get_backend;
use snapcam::config::Config;
use snapcam::constants::timing;
use snapcam::errors::ImageCaptureError;
use snapcam::pipelines::photo::take_photo;
use snapcam::session::{
    CameraProvider, CameraSelector, CaptureExecutor, ImageCapture, Lifecycle, Preview,
};
use snapcam::storage::{CapturedFile, OutputDirectory};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    let backend = get_backend();
    if !backend.is_available() {
        return Err("PipeWire camera source is not available".into());
    }
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        match camera.location {
            Some(location) => println!("  [{}] {} ({})", index, camera.name, location),
            None => println!("  [{}] {}", index, camera.name),
        }

        let formats = backend.get_formats(camera);
        if !formats.is_empty() {
            // Group formats by resolution and show best framerate
            let mut resolutions: Vec<(u32, u32, u32)> = Vec::new();
            for format in &formats {
                let fps = format.framerate.map(|f| f.as_int()).unwrap_or(30);
                if let Some(existing) = resolutions
                    .iter_mut()
                    .find(|(w, h, _)| *w == format.width && *h == format.height)
                {
                    existing.2 = existing.2.max(fps);
                } else {
                    resolutions.push((format.width, format.height, fps));
                }
            }

            // Highest resolution first
            resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

            let res_strs: Vec<String> = resolutions
                .iter()
                .take(3)
                .map(|(w, h, fps)| format!("{}x{}@{}fps", w, h, fps))
                .collect();

            println!("      Formats: {}", res_strs.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Take a photo with the configured lens, or the camera at `camera_index`
pub fn take_single_photo(
    camera_index: Option<usize>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;
    let (_, config) = Config::load();

    // A file path is captured next to itself, then renamed
    let output_dir = match output.as_ref() {
        Some(path) if path.is_dir() => path.clone(),
        Some(path) => match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            None => std::env::current_dir()?,
        },
        None => OutputDirectory::resolve(config.storage_location)
            .path()
            .to_path_buf(),
    };
    let output_dir = std::path::absolute(&output_dir)?;

    let mut selector = CameraSelector::new(config.lens_facing);
    if let Some(index) = camera_index {
        selector = selector.with_device_index(index);
    }

    let provider = pollster::block_on(CameraProvider::get_instance())?;
    let lifecycle = Lifecycle::new("cli");
    let image_capture = ImageCapture::new(config.photo_quality);
    let bound =
        provider.bind_to_lifecycle(&lifecycle, &selector, &Preview::new(), &image_capture)?;
    println!("Using camera: {}", bound.device.name);
    println!("Capture format: {}", bound.format);

    // Wait for a first frame, then let auto-exposure settle
    println!("Capturing...");
    let start = Instant::now();
    while !image_capture.has_frame() {
        if start.elapsed() > Duration::from_secs(timing::CLI_FRAME_TIMEOUT_SECS) {
            lifecycle.destroy();
            return Err(ImageCaptureError::NoFrameAvailable.into());
        }
        std::thread::sleep(Duration::from_millis(timing::TERMINAL_POLL_MS));
    }
    std::thread::sleep(Duration::from_millis(timing::CLI_WARMUP_MS));

    let executor = CaptureExecutor::new()?;
    let (tx, rx) = std::sync::mpsc::channel();
    take_photo(
        &image_capture,
        &output_dir,
        &executor,
        None,
        Box::new(move |result: Result<CapturedFile, ImageCaptureError>| {
            let _ = tx.send(result);
        }),
    );
    let result = rx.recv().map_err(|_| ImageCaptureError::CameraClosed);
    lifecycle.destroy();
    let saved = result??;

    if let Some(user_path) = output
        && !user_path.is_dir()
    {
        std::fs::rename(&saved.path, &user_path)?;
        println!("Photo saved: {}", user_path.display());
        return Ok(());
    }

    println!("Photo saved: {}", saved.path.display());
    Ok(())
}
