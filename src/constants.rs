// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Application identity
pub mod app_info {
    use std::path::Path;

    /// Reverse-DNS application id (config namespace and window id)
    pub const APP_ID: &str = "io.github.snapcam.SnapCam";

    /// Name of the per-application output directory
    pub const APP_NAME: &str = "SnapCam";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Check if the application is running inside a Flatpak sandbox
    pub fn is_flatpak() -> bool {
        Path::new("/.flatpak-info").exists()
    }

    /// Get the runtime environment string (e.g., "Flatpak" or "Native")
    pub fn runtime_environment() -> &'static str {
        if is_flatpak() { "Flatpak" } else { "Native" }
    }
}

/// Still capture constants
pub mod capture {
    /// chrono format for photo file stems (millisecond resolution)
    pub const FILENAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

    /// Photo file extension
    pub const EXTENSION: &str = "jpg";
}

/// UI Constants
pub mod ui {
    /// Capture button size (outer)
    pub const CAPTURE_BUTTON_OUTER: f32 = 72.0;

    /// Capture button size (inner)
    pub const CAPTURE_BUTTON_INNER: f32 = 60.0;

    /// Capture button border radius
    pub const CAPTURE_BUTTON_RADIUS: f32 = 30.0;

    /// Capture button ring width
    pub const CAPTURE_BUTTON_RING: f32 = 3.0;

    /// Overlay background transparency (0.0 = transparent, 1.0 = opaque)
    pub const OVERLAY_BACKGROUND_ALPHA: f32 = 0.6;

    /// Width of the permission request column
    pub const PERMISSION_COLUMN_WIDTH: f32 = 420.0;
}

/// Session format constants
pub mod formats {
    /// Common frame rates to try when exact enumeration fails
    pub const COMMON_FRAMERATES: &[u32] = &[30, 15];

    /// Largest session resolution preferred for preview + capture
    pub const MAX_SESSION_WIDTH: u32 = 1920;
    pub const MAX_SESSION_HEIGHT: u32 = 1080;

    /// Lowest framerate accepted for a live preview
    pub const MIN_PREVIEW_FPS: u32 = 15;
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Output pixel format for appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Capacity of the preview frame channel
    pub const PREVIEW_CHANNEL_CAPACITY: usize = 4;
}

/// Timing constants
pub mod timing {
    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Terminal input poll interval
    pub const TERMINAL_POLL_MS: u64 = 16;

    /// Time the headless capture waits for auto-exposure to settle
    pub const CLI_WARMUP_MS: u64 = 500;

    /// Time the headless capture waits for a first frame
    pub const CLI_FRAME_TIMEOUT_SECS: u64 = 5;
}

/// Shutter sound lookup
pub mod sound {
    /// Candidate shutter sounds, first existing file wins
    pub const SHUTTER_SOUND_PATHS: &[&str] = &[
        "/usr/share/sounds/freedesktop/stereo/camera-shutter.oga",
        "/usr/share/sounds/Yaru/stereo/camera-shutter.oga",
        "/usr/share/sounds/ubuntu/stereo/camera-shutter.ogg",
        "/run/host/usr/share/sounds/freedesktop/stereo/camera-shutter.oga",
    ];
}
