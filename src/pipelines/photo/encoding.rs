// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding and file output

use crate::errors::PhotoError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Encoding quality settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    pub const ALL: [EncodingQuality; 4] = [
        EncodingQuality::Low,
        EncodingQuality::Medium,
        EncodingQuality::High,
        EncodingQuality::Maximum,
    ];

    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Encode an RGB image as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, PhotoError> {
    let mut buffer = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality());

    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    debug!(size = buffer.len(), quality = quality.jpeg_quality(), "JPEG encoded");
    Ok(buffer)
}

/// Write encoded bytes to `path`
///
/// Never replaces an existing file.
pub fn write_new_file(path: &Path, data: &[u8]) -> Result<(), PhotoError> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| PhotoError::SaveFailed(format!("{}: {}", path.display(), e)))?;
    file.write_all(data)?;
    file.sync_all()?;

    info!(path = %path.display(), size = data.len(), "Photo saved");
    Ok(())
}
