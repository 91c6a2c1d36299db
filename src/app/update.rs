// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` dispatches each message to a focused handler method.

use crate::app::state::{AppModel, ContextPage, Message, SessionState};
use crate::backends::camera::types::CameraFrame;
use crate::config::{AppTheme, Config};
use crate::constants::app_info;
use crate::errors::{CameraError, ImageCaptureError};
use crate::fl;
use crate::permissions::{self, GateView, PermissionSet, PermissionStatus};
use crate::pipelines::photo::processing::frame_to_rgba;
use crate::pipelines::photo::{EncodingQuality, take_photo};
use crate::session::{BoundCamera, CameraProvider, CameraSelector};
use crate::sound::ShutterSound;
use crate::storage::{CapturedFile, OutputDirectory, StorageLocation};
use cosmic::Task;
use cosmic::cosmic_config::CosmicConfigEntry;
use cosmic::iced::futures::channel::oneshot;
use std::sync::Arc;
use tracing::{debug, error, info};

impl AppModel {
    /// Main message handler
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            // ===== UI Navigation =====
            Message::LaunchUrl(url) => self.handle_launch_url(url),
            Message::ToggleContextPage(page) => self.handle_toggle_context_page(page),

            // ===== Permissions =====
            Message::PermissionsChecked(status) => self.handle_permissions_checked(status),
            Message::RequestPermissions => self.handle_request_permissions(),

            // ===== Camera Session =====
            Message::SessionBound(result) => self.handle_session_bound(result),
            Message::PreviewFrame(frame) => self.handle_preview_frame(frame),
            Message::SwitchCamera => self.handle_switch_camera(),

            // ===== Capture =====
            Message::Capture => self.handle_capture(),
            Message::CaptureFinished(result) => self.handle_capture_finished(result),

            // ===== Settings =====
            Message::SetAppTheme(index) => self.handle_set_app_theme(index),
            Message::SetPhotoQuality(index) => {
                let Some(quality) = EncodingQuality::ALL.get(index).copied() else {
                    return Task::none();
                };
                let mut config = self.config.clone();
                config.photo_quality = quality;
                self.apply_config(config, true)
            }
            Message::SetStorageLocation(index) => {
                let location = match index {
                    0 => StorageLocation::Scoped,
                    1 => StorageLocation::Shared,
                    _ => return Task::none(),
                };
                let mut config = self.config.clone();
                config.storage_location = location;
                self.apply_config(config, true)
            }
            Message::SetShutterSound(enabled) => {
                let mut config = self.config.clone();
                config.shutter_sound = enabled;
                self.apply_config(config, true)
            }
            Message::UpdateConfig(config) => {
                info!("UpdateConfig received");
                self.apply_config(config, false)
            }
        }
    }

    fn handle_launch_url(&self, url: String) -> Task<cosmic::Action<Message>> {
        if let Err(err) = open::that_detached(&url) {
            error!(url = %url, error = %err, "Failed to open URL");
        }
        Task::none()
    }

    fn handle_toggle_context_page(&mut self, page: ContextPage) -> Task<cosmic::Action<Message>> {
        if self.context_page == page {
            self.core.window.show_context = !self.core.window.show_context;
        } else {
            self.context_page = page;
            self.core.window.show_context = true;
        }
        Task::none()
    }

    // =========================================================================
    // Permissions
    // =========================================================================

    fn handle_permissions_checked(
        &mut self,
        status: PermissionStatus,
    ) -> Task<cosmic::Action<Message>> {
        self.checking_permissions = false;
        let view = status.view();
        info!(?view, states = ?status.states(), "Permission states updated");
        self.permission_status = status;

        let unbound = matches!(self.session, SessionState::Unbound);
        match view {
            GateView::Preview if unbound => self.bind_session(),
            GateView::Preview => Task::none(),
            GateView::Rationale | GateView::Request => {
                self.release_session();
                Task::none()
            }
        }
    }

    fn handle_request_permissions(&mut self) -> Task<cosmic::Action<Message>> {
        let broker = Arc::clone(&self.broker);
        let set = self.permission_set.clone();
        let status = self.permission_status.clone();
        Task::perform(
            async move { permissions::request_missing(broker.as_ref(), &set, status).await },
            |status| cosmic::Action::App(Message::PermissionsChecked(status)),
        )
    }

    // =========================================================================
    // Camera session
    // =========================================================================

    /// Bind preview and capture to the configured lens
    ///
    /// Any running session is replaced by the provider.
    pub(crate) fn bind_session(&mut self) -> Task<cosmic::Action<Message>> {
        if self.permission_status.view() != GateView::Preview {
            return Task::none();
        }
        self.session = SessionState::Binding;

        let lifecycle = self.lifecycle.clone();
        let selector = CameraSelector::new(self.config.lens_facing);
        let preview = self.preview.clone();
        let image_capture = self.image_capture.clone();

        Task::perform(
            async move {
                let provider = CameraProvider::get_instance().await?;
                // Pipeline startup blocks until the device is playing
                let session = tokio::task::spawn_blocking(move || -> Result<_, CameraError> {
                    let count = provider.available_cameras().len();
                    let bound =
                        provider.bind_to_lifecycle(&lifecycle, &selector, &preview, &image_capture)?;
                    Ok((provider, bound, count))
                })
                .await
                .map_err(|e| CameraError::InitializationFailed(e.to_string()))??;
                Ok::<_, CameraError>(session)
            },
            |result| cosmic::Action::App(Message::SessionBound(result)),
        )
    }

    fn handle_session_bound(
        &mut self,
        result: Result<(CameraProvider, BoundCamera, usize), CameraError>,
    ) -> Task<cosmic::Action<Message>> {
        match result {
            Ok((provider, bound, count)) => {
                info!(
                    generation = bound.generation,
                    camera = %bound.device.name,
                    format = %bound.format,
                    cameras = count,
                    "Camera session ready"
                );
                self.provider = Some(provider);
                self.session = SessionState::Bound(bound);
            }
            Err(e) => {
                error!(error = %e, "Failed to bind camera session");
                self.session = SessionState::Unbound;
                self.status
                    .show_message(fl!("camera-unavailable", error = e.to_string()));
            }
        }
        Task::none()
    }

    fn release_session(&mut self) {
        if let Some(provider) = &self.provider {
            provider.unbind_all();
        }
        self.session = SessionState::Unbound;
        self.preview_handle = None;
    }

    fn handle_preview_frame(&mut self, frame: Arc<CameraFrame>) -> Task<cosmic::Action<Message>> {
        match frame_to_rgba(&frame) {
            Ok(rgba) => {
                self.preview_handle = Some(cosmic::widget::image::Handle::from_rgba(
                    frame.width,
                    frame.height,
                    rgba,
                ));
            }
            Err(e) => debug!(error = %e, "Dropping unconvertible preview frame"),
        }
        Task::none()
    }

    fn handle_switch_camera(&mut self) -> Task<cosmic::Action<Message>> {
        let mut config = self.config.clone();
        config.lens_facing = config.lens_facing.toggled();
        info!(facing = %config.lens_facing, "Switching lens facing");
        self.apply_config(config, true)
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Queue a capture; presses while others are in flight run after them
    fn handle_capture(&mut self) -> Task<cosmic::Action<Message>> {
        let Some(executor) = self.executor.as_ref() else {
            self.status.show_message(fl!("no-executor"));
            return Task::none();
        };

        let (tx, rx) = oneshot::channel();
        take_photo(
            &self.image_capture,
            self.output_dir.path(),
            executor,
            Some(&self.shutter),
            Box::new(move |result: Result<CapturedFile, ImageCaptureError>| {
                let _ = tx.send(result.map_err(|e| e.to_string()));
            }),
        );
        self.captures_in_flight += 1;

        Task::perform(
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(ImageCaptureError::CameraClosed.to_string()))
            },
            |result| cosmic::Action::App(Message::CaptureFinished(result)),
        )
    }

    fn handle_capture_finished(
        &mut self,
        result: Result<CapturedFile, String>,
    ) -> Task<cosmic::Action<Message>> {
        self.captures_in_flight = self.captures_in_flight.saturating_sub(1);
        match result {
            Ok(file) => {
                info!(path = %file.path.display(), "Photo saved");
                self.status.show_capture(&file);
            }
            Err(e) => {
                error!(error = %e, "Photo capture failed");
                self.status.show_message(fl!("capture-failed", error = e));
            }
        }
        Task::none()
    }

    // =========================================================================
    // Settings
    // =========================================================================

    fn handle_set_app_theme(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let app_theme = match index {
            0 => AppTheme::System,
            1 => AppTheme::Dark,
            2 => AppTheme::Light,
            _ => return Task::none(),
        };
        info!(?app_theme, "Setting application theme");
        let mut config = self.config.clone();
        config.app_theme = app_theme;
        self.apply_config(config, true)
    }

    /// Apply a new configuration, reacting to whichever fields changed
    fn apply_config(&mut self, config: Config, persist: bool) -> Task<cosmic::Action<Message>> {
        if config == self.config {
            return Task::none();
        }
        let previous = std::mem::replace(&mut self.config, config);

        if persist
            && let Some(handler) = self.config_handler.as_ref()
            && let Err(err) = self.config.write_entry(handler)
        {
            error!(?err, "Failed to save config");
        }

        let mut tasks = Vec::new();

        if previous.app_theme != self.config.app_theme {
            tasks.push(cosmic::command::set_theme(self.config.app_theme.theme()));
        }
        if previous.photo_quality != self.config.photo_quality {
            self.image_capture.set_quality(self.config.photo_quality);
        }
        if previous.shutter_sound != self.config.shutter_sound {
            self.shutter = ShutterSound::load(self.config.shutter_sound);
        }
        if previous.storage_location != self.config.storage_location {
            self.output_dir = OutputDirectory::resolve(self.config.storage_location);
            self.permission_set =
                PermissionSet::required(app_info::is_flatpak(), self.config.storage_location);
            info!(
                path = %self.output_dir.path().display(),
                "Output directory changed, re-checking permissions"
            );
            tasks.push(self.check_permissions());
        }
        if previous.lens_facing != self.config.lens_facing {
            tasks.push(self.bind_session());
        }

        Task::batch(tasks)
    }
}
