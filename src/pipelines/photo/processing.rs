// SPDX-License-Identifier: MPL-2.0

//! Frame to image conversion
//!
//! Sessions deliver RGBA rows that may carry padding past the visible width.

use crate::backends::camera::types::CameraFrame;
use crate::errors::PhotoError;
use image::RgbImage;
use tracing::debug;

/// Convert a frame into an RGB image, dropping alpha and row padding
pub fn frame_to_rgb(frame: &CameraFrame) -> Result<RgbImage, PhotoError> {
    check_dimensions(frame)?;

    let (width, height) = (frame.width, frame.height);
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height as usize {
        rgb.extend(
            visible_row(frame, y)?
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]]),
        );
    }

    debug!(width, height, stride = frame.stride, "Frame converted to RGB");
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| PhotoError::ConversionFailed("RGB buffer size mismatch".to_string()))
}

/// Tightly packed RGBA pixels for display
pub fn frame_to_rgba(frame: &CameraFrame) -> Result<Vec<u8>, PhotoError> {
    check_dimensions(frame)?;

    let (width, height) = (frame.width as usize, frame.height as usize);
    let row_bytes = width * 4;

    if frame.stride as usize == row_bytes {
        let len = row_bytes * height;
        return frame
            .data
            .get(..len)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| PhotoError::ConversionFailed("RGBA data too small".to_string()));
    }

    let mut rgba = Vec::with_capacity(row_bytes * height);
    for y in 0..height {
        rgba.extend_from_slice(visible_row(frame, y)?);
    }
    Ok(rgba)
}

fn check_dimensions(frame: &CameraFrame) -> Result<(), PhotoError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PhotoError::ConversionFailed(format!(
            "Invalid frame size {}x{}",
            frame.width, frame.height
        )));
    }
    Ok(())
}

/// Row `y` without its padding
fn visible_row(frame: &CameraFrame, y: usize) -> Result<&[u8], PhotoError> {
    let start = y * frame.stride as usize;
    frame
        .data
        .get(start..start + frame.width as usize * 4)
        .ok_or_else(|| PhotoError::ConversionFailed("RGBA data too small".to_string()))
}

/// Sample one pixel as RGB
///
/// Coordinates are clamped to the frame. Out-of-range buffer reads yield black.
pub fn sample_pixel_rgb(frame: &CameraFrame, x: u32, y: u32) -> (u8, u8, u8) {
    let x = x.min(frame.width.saturating_sub(1)) as usize;
    let y = y.min(frame.height.saturating_sub(1)) as usize;
    let idx = y * frame.stride as usize + x * 4;
    match frame.data.get(idx..idx + 3) {
        Some(px) => (px[0], px[1], px[2]),
        None => (0, 0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn padded_frame() -> CameraFrame {
        // 2x1 frame, stride 12 (4 bytes of padding)
        CameraFrame {
            width: 2,
            height: 1,
            data: Arc::from(vec![1, 2, 3, 255, 4, 5, 6, 255, 9, 9, 9, 9]),
            stride: 12,
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn test_rgba_with_padding_drops_alpha_and_padding() {
        let frame = padded_frame();
        let rgb = frame_to_rgb(&frame).unwrap();
        assert_eq!(rgb.as_raw(), &vec![1, 2, 3, 4, 5, 6]);

        let rgba = frame_to_rgba(&frame).unwrap();
        assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_sample_clamps_coordinates() {
        let frame = padded_frame();
        assert_eq!(sample_pixel_rgb(&frame, 1, 0), (4, 5, 6));
        assert_eq!(sample_pixel_rgb(&frame, 7, 3), (4, 5, 6));
    }

    #[test]
    fn test_truncated_data_is_rejected() {
        let frame = CameraFrame::from_rgba(2, 2, vec![0; 8]);
        assert!(frame_to_rgb(&frame).is_err());
        assert!(frame_to_rgba(&frame).is_err());
        assert_eq!(sample_pixel_rgb(&frame, 1, 1), (0, 0, 0));
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let frame = CameraFrame::from_rgba(0, 0, Vec::new());
        assert!(frame_to_rgb(&frame).is_err());
    }
}
