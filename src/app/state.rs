// SPDX-License-Identifier: GPL-3.0-only

//! Application state

use crate::backends::camera::types::CameraFrame;
use crate::config::Config;
use crate::errors::CameraError;
use crate::permissions::{PermissionBroker, PermissionSet, PermissionStatus};
use crate::session::{BoundCamera, CameraProvider, CaptureExecutor, ImageCapture, Lifecycle, Preview};
use crate::sound::ShutterSound;
use crate::storage::{CapturedFile, OutputDirectory, StatusLabel};
use cosmic::cosmic_config;
use cosmic::widget::about::About;
use std::sync::Arc;

/// Where the camera session is
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// Nothing bound (permissions pending, or bind failed)
    #[default]
    Unbound,
    /// A bind task is in flight
    Binding,
    Bound(BoundCamera),
}

impl SessionState {
    pub fn generation(&self) -> Option<u64> {
        match self {
            SessionState::Bound(bound) => Some(bound.generation),
            _ => None,
        }
    }
}

/// The application model stores app-specific state used to describe its interface and
/// drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Display a context drawer with the designated page if defined.
    pub context_page: ContextPage,
    /// The about page for this app.
    pub about: About,
    /// Configuration data that persists between application runs.
    pub config: Config,
    /// Configuration handler for saving settings
    pub config_handler: Option<cosmic_config::Config>,

    /// Permissions required in this environment
    pub permission_set: PermissionSet,
    /// Last known permission states
    pub permission_status: PermissionStatus,
    pub broker: Arc<dyn PermissionBroker>,
    /// True until the first permission check returns
    pub checking_permissions: bool,

    /// Owner the camera session follows; the window's lifetime
    pub lifecycle: Lifecycle,
    pub provider: Option<CameraProvider>,
    pub session: SessionState,
    pub preview: Preview,
    pub image_capture: ImageCapture,
    pub executor: Option<Arc<CaptureExecutor>>,
    pub shutter: ShutterSound,

    pub preview_handle: Option<cosmic::widget::image::Handle>,
    /// Capture requests submitted and not yet answered
    pub captures_in_flight: usize,

    pub output_dir: OutputDirectory,
    pub status: StatusLabel,

    /// Dropdown labels for the settings drawer
    pub theme_options: Vec<String>,
    pub quality_options: Vec<String>,
    pub storage_options: Vec<String>,
}

/// The context page to display in the context drawer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ContextPage {
    #[default]
    About,
    Settings,
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    // ===== UI Navigation =====
    /// Open external URL (repository, etc.)
    LaunchUrl(String),
    /// Toggle context drawer page (About, Settings)
    ToggleContextPage(ContextPage),

    // ===== Permissions =====
    /// Result of checking or requesting permissions
    PermissionsChecked(PermissionStatus),
    /// User pressed the grant button
    RequestPermissions,

    // ===== Camera Session =====
    /// Bind task finished
    SessionBound(Result<(CameraProvider, BoundCamera, usize), CameraError>),
    /// New preview frame from the bound session
    PreviewFrame(Arc<CameraFrame>),
    /// Toggle between back and front lens
    SwitchCamera,

    // ===== Capture =====
    Capture,
    /// Capture callback fired
    CaptureFinished(Result<CapturedFile, String>),

    // ===== Settings =====
    SetAppTheme(usize),
    SetPhotoQuality(usize),
    SetStorageLocation(usize),
    SetShutterSound(bool),
    /// Update configuration from the config watcher
    UpdateConfig(Config),
}
