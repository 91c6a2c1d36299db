// SPDX-License-Identifier: GPL-3.0-only

//! Shutter sound playback

use crate::constants::sound::SHUTTER_SOUND_PATHS;
use gstreamer::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Preloaded shutter sound
///
/// Silent when disabled or when no sound file is installed.
pub struct ShutterSound {
    playbin: Option<gstreamer::Element>,
}

impl ShutterSound {
    pub fn load(enabled: bool) -> Self {
        if !enabled {
            return Self { playbin: None };
        }
        let playbin = find_sound_file(SHUTTER_SOUND_PATHS).and_then(|path| build_playbin(&path));
        Self { playbin }
    }

    pub fn is_enabled(&self) -> bool {
        self.playbin.is_some()
    }

    /// Play from the start; never blocks
    pub fn play(&self) {
        let Some(playbin) = &self.playbin else {
            return;
        };
        let _ = playbin.set_state(gstreamer::State::Paused);
        if let Err(e) = playbin.seek_simple(
            gstreamer::SeekFlags::FLUSH | gstreamer::SeekFlags::KEY_UNIT,
            gstreamer::ClockTime::ZERO,
        ) {
            debug!(error = %e, "Shutter sound seek failed");
        }
        if let Err(e) = playbin.set_state(gstreamer::State::Playing) {
            warn!(error = %e, "Failed to play shutter sound");
        }
    }
}

impl Drop for ShutterSound {
    fn drop(&mut self) {
        if let Some(playbin) = &self.playbin {
            let _ = playbin.set_state(gstreamer::State::Null);
        }
    }
}

fn find_sound_file(candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(Path::new)
        .find(|path| path.is_file())
        .map(Path::to_path_buf)
}

fn build_playbin(path: &Path) -> Option<gstreamer::Element> {
    if let Err(e) = gstreamer::init() {
        warn!(error = %e, "GStreamer unavailable, shutter sound disabled");
        return None;
    }
    let uri = url::Url::from_file_path(path).ok()?;
    let playbin = gstreamer::ElementFactory::make("playbin")
        .property("uri", uri.as_str())
        .build()
        .map_err(|e| warn!(error = %e, "playbin unavailable, shutter sound disabled"))
        .ok()?;
    // Prerolled so the first capture does not wait on decoding
    let _ = playbin.set_state(gstreamer::State::Paused);
    debug!(path = %path.display(), "Shutter sound loaded");
    Some(playbin)
}
