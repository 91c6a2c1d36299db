// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::app_info;
use crate::pipelines::photo::EncodingQuality;
use crate::session::LensFacing;
use crate::storage::StorageLocation;
use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use cosmic::{Theme, theme};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Application theme preference
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum AppTheme {
    /// Follow system theme (dark or light based on system setting)
    #[default]
    System,
    /// Always use dark theme
    Dark,
    /// Always use light theme
    Light,
}

impl AppTheme {
    /// Get the COSMIC theme for this app theme preference
    pub fn theme(&self) -> Theme {
        match self {
            Self::Dark => {
                let mut theme = theme::system_dark();
                theme.theme_type.prefer_dark(Some(true));
                theme
            }
            Self::Light => {
                let mut theme = theme::system_light();
                theme.theme_type.prefer_dark(Some(false));
                theme
            }
            Self::System => theme::system_preference(),
        }
    }
}

#[derive(Debug, Clone, CosmicConfigEntry, Eq, PartialEq, Serialize, Deserialize)]
#[version = 1]
pub struct Config {
    /// Application theme preference (System, Dark, Light)
    pub app_theme: AppTheme,
    /// Which way the bound camera should face
    pub lens_facing: LensFacing,
    /// App-private or shared pictures directory
    pub storage_location: StorageLocation,
    /// JPEG quality preset
    pub photo_quality: EncodingQuality,
    /// Play a shutter sound before each capture
    pub shutter_sound: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_theme: AppTheme::default(),
            lens_facing: LensFacing::Back,
            storage_location: StorageLocation::Scoped,
            photo_quality: EncodingQuality::High,
            shutter_sound: true,
        }
    }
}

impl Config {
    /// Load the stored configuration, falling back to defaults on any error
    ///
    /// Returns the handler too so callers can write changes back.
    pub fn load() -> (Option<cosmic_config::Config>, Config) {
        match cosmic_config::Config::new(app_info::APP_ID, Config::VERSION) {
            Ok(handler) => {
                let config = match Config::get_entry(&handler) {
                    Ok(config) => config,
                    Err((errors, config)) => {
                        error!(?errors, "Errors loading config");
                        config
                    }
                };
                (Some(handler), config)
            }
            Err(err) => {
                error!(%err, "Failed to create config handler");
                (None, Config::default())
            }
        }
    }
}
