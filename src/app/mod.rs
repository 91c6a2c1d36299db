// SPDX-License-Identifier: MPL-2.0

//! libcosmic window
//!
//! # Architecture
//!
//! - `state`: AppModel, Message and session state
//! - `update`: message handling
//! - `view`: permission gate and preview layout
//! - `controls`: shutter and camera-switch buttons
//! - `settings`: settings drawer

mod controls;
mod settings;
mod state;
mod update;
mod view;

use crate::config::Config;
use crate::constants::{app_info, pipeline};
use crate::fl;
use crate::permissions::{self, PermissionSet, PermissionStatus, PortalBroker};
use crate::session::{CaptureExecutor, ImageCapture, Lifecycle, Preview};
use crate::sound::ShutterSound;
use crate::storage::{OutputDirectory, StatusLabel, storage_root};
use cosmic::app::context_drawer;
use cosmic::iced::Subscription;
use cosmic::widget::{self, about::About};
use cosmic::{Element, Task};
pub use state::{AppModel, ContextPage, Message, SessionState};
use std::sync::Arc;
use tracing::{error, info};

const REPOSITORY: &str = "https://github.com/snapcam/snapcam";

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = app_info::APP_ID;

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        let about = About::default()
            .name(fl!("app-title"))
            .icon(widget::icon::from_name(app_info::APP_ID).handle())
            .version(app_info::version())
            .links([(fl!("repository"), REPOSITORY)])
            .license(env!("CARGO_PKG_LICENSE"));

        let (config_handler, config) = Config::load();

        // Required before the shutter sound builds its playbin
        if let Err(e) = gstreamer::init() {
            error!(error = %e, "Failed to initialize GStreamer");
        }

        let executor = match CaptureExecutor::new() {
            Ok(executor) => Some(Arc::new(executor)),
            Err(e) => {
                error!(error = %e, "Failed to start capture worker");
                None
            }
        };

        let permission_set =
            PermissionSet::required(app_info::is_flatpak(), config.storage_location);
        let output_dir = OutputDirectory::resolve(config.storage_location);

        let app = AppModel {
            core,
            context_page: ContextPage::default(),
            about,
            config_handler,
            permission_status: PermissionStatus::unrequested(&permission_set),
            permission_set,
            broker: Arc::new(PortalBroker::new(app_info::is_flatpak())),
            checking_permissions: true,
            lifecycle: Lifecycle::new("window"),
            provider: None,
            session: SessionState::Unbound,
            preview: Preview::new(),
            image_capture: ImageCapture::new(config.photo_quality),
            executor,
            shutter: ShutterSound::load(config.shutter_sound),
            preview_handle: None,
            captures_in_flight: 0,
            output_dir,
            status: StatusLabel::new(storage_root(), fl!("internal-storage")),
            theme_options: vec![fl!("theme-system"), fl!("theme-dark"), fl!("theme-light")],
            quality_options: vec![
                fl!("quality-low"),
                fl!("quality-medium"),
                fl!("quality-high"),
                fl!("quality-maximum"),
            ],
            storage_options: vec![fl!("storage-scoped"), fl!("storage-shared")],
            config,
        };

        info!(
            runtime = app_info::runtime_environment(),
            output = %app.output_dir.path().display(),
            "Application initialized"
        );

        let check = app.check_permissions();
        (app, check)
    }

    /// Elements to pack at the end of the header bar.
    fn header_end(&self) -> Vec<Element<'_, Self::Message>> {
        vec![
            widget::button::icon(widget::icon::from_name("preferences-system-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::Settings))
                .into(),
            widget::button::icon(widget::icon::from_name("help-about-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::About))
                .into(),
        ]
    }

    /// Display a context drawer if the context page is requested.
    fn context_drawer(&self) -> Option<context_drawer::ContextDrawer<'_, Self::Message>> {
        if !self.core.window.show_context {
            return None;
        }

        Some(match self.context_page {
            ContextPage::About => context_drawer::about(
                &self.about,
                |url| Message::LaunchUrl(url.to_string()),
                Message::ToggleContextPage(ContextPage::About),
            ),
            ContextPage::Settings => self.settings_view(),
        })
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> Subscription<Self::Message> {
        use cosmic::iced::futures::{SinkExt, StreamExt};

        let config_sub = self
            .core()
            .watch_config::<Config>(Self::APP_ID)
            .map(|update| Message::UpdateConfig(update.config));

        // One preview stream per bound session; a rebind restarts it
        let Some(generation) = self.session.generation() else {
            return config_sub;
        };
        let preview = self.preview.clone();

        let preview_sub = Subscription::run_with_id(
            ("preview", generation),
            cosmic::iced::stream::channel(pipeline::PREVIEW_CHANNEL_CAPACITY, move |mut output| {
                async move {
                    let (sender, mut receiver) = cosmic::iced::futures::channel::mpsc::channel(
                        pipeline::PREVIEW_CHANNEL_CAPACITY,
                    );
                    preview.set_surface_provider(Some(sender));
                    info!(generation, "Preview surface attached");

                    while let Some(frame) = receiver.next().await {
                        if output.send(Message::PreviewFrame(frame)).await.is_err() {
                            break;
                        }
                    }
                    info!(generation, "Preview stream ended");
                }
            }),
        );

        Subscription::batch([config_sub, preview_sub])
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }
}

impl AppModel {
    /// Query every required permission without prompting
    pub(crate) fn check_permissions(&self) -> Task<cosmic::Action<Message>> {
        let broker = Arc::clone(&self.broker);
        let set = self.permission_set.clone();
        Task::perform(
            async move { permissions::check_all(broker.as_ref(), &set).await },
            |status| cosmic::Action::App(Message::PermissionsChecked(status)),
        )
    }
}
