// SPDX-License-Identifier: GPL-3.0-only

//! Camera and format selection for a session

use crate::backends::camera::types::{CameraDevice, CameraFormat, CameraLocation};
use crate::constants::formats;
use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which way the bound camera faces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LensFacing {
    #[default]
    Back,
    Front,
}

impl LensFacing {
    pub fn toggled(self) -> Self {
        match self {
            LensFacing::Back => LensFacing::Front,
            LensFacing::Front => LensFacing::Back,
        }
    }

    fn location(self) -> CameraLocation {
        match self {
            LensFacing::Back => CameraLocation::Back,
            LensFacing::Front => CameraLocation::Front,
        }
    }
}

impl std::fmt::Display for LensFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LensFacing::Back => write!(f, "back"),
            LensFacing::Front => write!(f, "front"),
        }
    }
}

/// Picks the device a session binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSelector {
    lens_facing: LensFacing,
    /// Enumeration index that overrides the facing match
    device_index: Option<usize>,
}

impl CameraSelector {
    pub const DEFAULT_BACK_CAMERA: CameraSelector = CameraSelector {
        lens_facing: LensFacing::Back,
        device_index: None,
    };
    pub const DEFAULT_FRONT_CAMERA: CameraSelector = CameraSelector {
        lens_facing: LensFacing::Front,
        device_index: None,
    };

    pub fn new(lens_facing: LensFacing) -> Self {
        Self {
            lens_facing,
            device_index: None,
        }
    }

    /// Select the camera at `index` in enumeration order
    pub fn with_device_index(mut self, index: usize) -> Self {
        self.device_index = Some(index);
        self
    }

    pub fn lens_facing(&self) -> LensFacing {
        self.lens_facing
    }

    /// Choose a camera
    ///
    /// Exact location matches win. Otherwise the first camera with an
    /// unknown or external location is used.
    pub fn select<'a>(&self, cameras: &'a [CameraDevice]) -> Result<&'a CameraDevice, CameraError> {
        if cameras.is_empty() {
            return Err(CameraError::NoCameraFound);
        }

        if let Some(index) = self.device_index {
            return cameras.get(index).ok_or_else(|| {
                CameraError::NoMatchingCamera(format!(
                    "index {} out of range (0-{})",
                    index,
                    cameras.len() - 1
                ))
            });
        }

        let wanted = self.lens_facing.location();
        let chosen = cameras
            .iter()
            .find(|camera| camera.location == Some(wanted))
            .or_else(|| {
                cameras.iter().find(|camera| {
                    matches!(camera.location, None | Some(CameraLocation::External))
                })
            })
            .ok_or_else(|| CameraError::NoMatchingCamera(self.lens_facing.to_string()))?;

        debug!(facing = %self.lens_facing, camera = %chosen.name, "Camera selected");
        Ok(chosen)
    }
}

impl Default for CameraSelector {
    fn default() -> Self {
        Self::DEFAULT_BACK_CAMERA
    }
}

/// Pick the session format from what a camera offers
///
/// Prefers the largest format within the session size limit that also
/// keeps a usable preview rate, then the higher rate, then MJPEG.
/// Falls back to the smallest format when nothing fits.
pub fn select_session_format(available: &[CameraFormat]) -> Option<CameraFormat> {
    let fits = |f: &&CameraFormat| {
        f.width <= formats::MAX_SESSION_WIDTH
            && f.height <= formats::MAX_SESSION_HEIGHT
            && f.framerate
                .is_none_or(|fps| fps.as_int() >= formats::MIN_PREVIEW_FPS)
    };

    available
        .iter()
        .filter(fits)
        .max_by_key(|f| {
            (
                f.pixels(),
                f.framerate.map(|fps| fps.as_int()).unwrap_or(0),
                f.is_mjpeg(),
            )
        })
        .or_else(|| available.iter().min_by_key(|f| f.pixels()))
        .cloned()
}
