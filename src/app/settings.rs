// SPDX-License-Identifier: MPL-2.0

//! Settings drawer view

use crate::app::state::{AppModel, ContextPage, Message};
use crate::config::AppTheme;
use crate::constants::app_info;
use crate::fl;
use crate::pipelines::photo::EncodingQuality;
use crate::storage::StorageLocation;
use cosmic::Element;
use cosmic::app::context_drawer;
use cosmic::iced::{Alignment, Length};
use cosmic::widget;

impl AppModel {
    /// Create the settings view for the context drawer
    pub fn settings_view(&self) -> context_drawer::ContextDrawer<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let theme_index = match self.config.app_theme {
            AppTheme::System => 0,
            AppTheme::Dark => 1,
            AppTheme::Light => 2,
        };
        let quality_index = EncodingQuality::ALL
            .iter()
            .position(|q| *q == self.config.photo_quality);
        let storage_index = match self.config.storage_location {
            StorageLocation::Scoped => 0,
            StorageLocation::Shared => 1,
        };

        let heading = |text: String| widget::text(text).size(16).font(cosmic::font::bold());

        let settings_column: Element<'_, Message> = widget::column()
            .push(heading(fl!("settings-appearance")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(widget::dropdown(
                &self.theme_options,
                Some(theme_index),
                Message::SetAppTheme,
            ))
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("settings-photo-quality")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(widget::dropdown(
                &self.quality_options,
                quality_index,
                Message::SetPhotoQuality,
            ))
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("settings-storage")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(widget::dropdown(
                &self.storage_options,
                Some(storage_index),
                Message::SetStorageLocation,
            ))
            .push(
                widget::text(self.output_dir.path().display().to_string())
                    .size(12)
                    .class(cosmic::theme::Text::Accent),
            )
            .push(widget::vertical_space().height(spacing.space_l))
            .push(widget::divider::horizontal::default())
            .push(widget::vertical_space().height(spacing.space_s))
            .push(
                widget::row()
                    .push(heading(fl!("settings-shutter-sound")))
                    .push(widget::horizontal_space().width(Length::Fill))
                    .push(
                        widget::toggler(self.config.shutter_sound)
                            .on_toggle(Message::SetShutterSound),
                    )
                    .align_y(Alignment::Center),
            )
            .push(widget::vertical_space().height(spacing.space_l))
            .push(widget::divider::horizontal::default())
            .push(widget::vertical_space().height(spacing.space_s))
            .push(
                widget::text(fl!(
                    "version",
                    version = app_info::version(),
                    runtime = app_info::runtime_environment()
                ))
                .size(12)
                .class(cosmic::theme::Text::Accent),
            )
            .spacing(0)
            .into();

        context_drawer::context_drawer(
            settings_column,
            Message::ToggleContextPage(ContextPage::Settings),
        )
        .title(fl!("settings"))
    }
}
