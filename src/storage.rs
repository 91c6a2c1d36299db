// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for the photo output directory and saved-file display

use crate::constants::app_info;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

/// Where captured photos go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageLocation {
    /// App-private directory under the user data dir
    #[default]
    Scoped,
    /// User-visible pictures directory
    Shared,
}

impl StorageLocation {
    /// Preferred directory for this location, if the platform reports one
    pub fn primary_dir(&self) -> Option<PathBuf> {
        let base = match self {
            StorageLocation::Scoped => dirs::data_dir(),
            StorageLocation::Shared => dirs::picture_dir(),
        };
        base.map(|dir| dir.join(app_info::APP_NAME))
    }
}

/// Directory captured photos are written to
///
/// Resolved once when the app starts and kept for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirectory {
    path: PathBuf,
}

impl OutputDirectory {
    /// Resolve and create the output directory for `location`
    pub fn resolve(location: StorageLocation) -> Self {
        Self::resolve_with(location.primary_dir(), fallback_dir())
    }

    /// Create `primary`, or fall back to `fallback` when that fails
    pub fn resolve_with(primary: Option<PathBuf>, fallback: PathBuf) -> Self {
        if let Some(primary) = primary {
            match std::fs::create_dir_all(&primary) {
                Ok(()) if primary.is_dir() => {
                    info!(path = %primary.display(), "Photo directory ready");
                    return Self { path: primary };
                }
                Ok(()) => warn!(path = %primary.display(), "Photo directory is not a directory"),
                Err(e) => {
                    warn!(path = %primary.display(), error = %e, "Failed to create photo directory")
                }
            }
        }

        if let Err(e) = std::fs::create_dir_all(&fallback) {
            warn!(path = %fallback.display(), error = %e, "Failed to create fallback directory");
        }
        info!(path = %fallback.display(), "Using fallback photo directory");
        Self { path: fallback }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn fallback_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
}

/// A photo that has been written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFile {
    pub path: PathBuf,
    pub uri: Url,
}

impl CapturedFile {
    /// Build the reference for a file path, resolving it against the
    /// working directory when relative
    pub fn new(path: PathBuf) -> AppResult<Self> {
        let path = std::path::absolute(&path)?;
        let uri = Url::from_file_path(&path)
            .map_err(|_| AppError::Storage(format!("Not an absolute path: {}", path.display())))?;
        Ok(Self { path, uri })
    }

    /// File name without the directory
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// URI of the user's storage root (home directory)
pub fn storage_root() -> Option<Url> {
    dirs::home_dir().and_then(|home| Url::from_directory_path(home).ok())
}

/// Human-readable form of a saved-file URI
///
/// The storage root prefix becomes `label` and `%20` escapes become spaces.
pub fn status_display(uri: &str, storage_root: &str, label: &str) -> String {
    let labelled = if storage_root.is_empty() {
        uri.to_string()
    } else {
        uri.replace(storage_root, label)
    };
    labelled.replace("%20", " ")
}

/// Status line shown under the preview
///
/// Holds only the most recent message. A new capture replaces the previous one.
#[derive(Debug, Clone, Default)]
pub struct StatusLabel {
    root: String,
    label: String,
    text: String,
}

impl StatusLabel {
    pub fn new(root: Option<Url>, label: impl Into<String>) -> Self {
        Self {
            root: root.map(String::from).unwrap_or_default(),
            label: label.into(),
            text: String::new(),
        }
    }

    /// Show a freshly saved file
    pub fn show_capture(&mut self, file: &CapturedFile) {
        self.text = status_display(file.uri.as_str(), &self.root, &self.label);
        debug!(status = %self.text, "Status updated");
    }

    /// Show an error message verbatim
    pub fn show_message(&mut self, message: impl Into<String>) {
        self.text = message.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
