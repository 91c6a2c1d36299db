// SPDX-License-Identifier: MPL-2.0

//! Photo capture pipeline
//!
//! ```text
//! Latest session frame → RGB conversion → JPEG encoding → New file on disk
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! Runs synchronously on the capture worker, so the preview stream is
//! never blocked by encoding or disk I/O.

pub mod capture;
pub mod encoding;
pub mod processing;

pub use capture::{next_capture_time, photo_filename, take_photo};
pub use encoding::EncodingQuality;

use crate::backends::camera::types::CameraFrame;
use crate::errors::PhotoError;
use std::path::Path;
use tracing::debug;

/// Frame-to-file pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoPipeline {
    quality: EncodingQuality,
}

impl PhotoPipeline {
    pub fn new(quality: EncodingQuality) -> Self {
        Self { quality }
    }

    /// Convert, encode and write `frame` to exactly `path`
    pub fn save_to(&self, frame: &CameraFrame, path: &Path) -> Result<(), PhotoError> {
        debug!(
            width = frame.width,
            height = frame.height,
            path = %path.display(),
            "Saving frame"
        );

        let image = processing::frame_to_rgb(frame)?;
        let data = encoding::encode_jpeg(&image, self.quality)?;
        encoding::write_new_file(path, &data)
    }
}
