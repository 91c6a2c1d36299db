// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use std::sync::Arc;
use std::time::Instant;

/// Physical mounting of a camera, as reported by libcamera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraLocation {
    Front,
    Back,
    External,
}

impl CameraLocation {
    /// Parse the `api.libcamera.location` property value
    pub fn from_property(value: &str) -> Option<Self> {
        match value.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "front" => Some(CameraLocation::Front),
            "back" => Some(CameraLocation::Back),
            "external" => Some(CameraLocation::External),
            _ => None,
        }
    }
}

impl std::fmt::Display for CameraLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraLocation::Front => write!(f, "front"),
            CameraLocation::Back => write!(f, "back"),
            CameraLocation::External => write!(f, "external"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// PipeWire target (`pipewire-<serial>`) or empty for the default camera
    pub path: String,
    /// PipeWire node id, used for property lookups
    pub metadata_path: Option<String>,
    pub location: Option<CameraLocation>,
}

impl CameraDevice {
    /// Placeholder for "whatever camera PipeWire picks"
    pub fn default_camera() -> Self {
        Self {
            name: "Default Camera".to_string(),
            path: String::new(),
            metadata_path: None,
            location: None,
        }
    }
}

/// Framerate as a fraction (numerator/denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    pub fn from_int(fps: u32) -> Self {
        Self { num: fps, denom: 1 }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }

    /// Integer part of the rate (59.94 becomes 59)
    pub fn as_int(&self) -> u32 {
        self.num / self.denom
    }

    /// GStreamer fraction string (e.g., "30/1")
    pub fn as_gst_fraction(&self) -> String {
        format!("{}/{}", self.num, self.denom)
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denom != 1 {
            write!(f, "{:.2}", self.as_f64())
        } else {
            write!(f, "{}", self.num)
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self { num: 30, denom: 1 }
    }
}

/// Camera format specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<Framerate>,
    /// FourCC code (e.g., "MJPG", "YUYV")
    pub pixel_format: String,
}

impl CameraFormat {
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_mjpeg(&self) -> bool {
        self.pixel_format == "MJPG"
    }
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = &self.framerate {
            write!(
                f,
                "{}x{} @ {}fps {}",
                self.width, self.height, fps, self.pixel_format
            )
        } else {
            write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
        }
    }
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    /// Bytes per row, including padding
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }
}

/// Consumer of frames produced by a running session
///
/// Called on the streaming thread; implementations must return quickly.
pub type FrameSink = Arc<dyn Fn(Arc<CameraFrame>) + Send + Sync>;

/// Frame receiver type for preview streams
pub type FrameReceiver = cosmic::iced::futures::channel::mpsc::Receiver<Arc<CameraFrame>>;

/// Frame sender type for preview streams
pub type FrameSender = cosmic::iced::futures::channel::mpsc::Sender<Arc<CameraFrame>>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parsing() {
        assert_eq!(
            CameraLocation::from_property("\"front\""),
            Some(CameraLocation::Front)
        );
        assert_eq!(
            CameraLocation::from_property("Back"),
            Some(CameraLocation::Back)
        );
        assert_eq!(CameraLocation::from_property("side"), None);
    }

    #[test]
    fn test_framerate_zero_denominator() {
        let fps = Framerate::new(30, 0);
        assert_eq!(fps.as_int(), 30);
        assert_eq!(fps.to_string(), "30");
        assert_eq!(Framerate::new(60000, 1001).to_string(), "59.94");
    }

    #[test]
    fn test_rgba_frame_stride() {
        let frame = CameraFrame::from_rgba(2, 1, vec![0; 8]);
        assert_eq!(frame.stride, 8);
    }
}
