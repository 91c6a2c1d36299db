// SPDX-License-Identifier: GPL-3.0-only

//! Main application view
//!
//! The permission gate decides between the request view, the rationale
//! view and the live preview with its overlay controls.

use crate::app::controls::overlay_container_style;
use crate::app::state::{AppModel, Message, SessionState};
use crate::constants::ui;
use crate::fl;
use crate::permissions::{GateView, Permission};
use cosmic::Element;
use cosmic::iced::{Alignment, Background, Color, ContentFit, Length};
use cosmic::widget;

impl AppModel {
    /// Build the main application view
    pub fn view(&self) -> Element<'_, Message> {
        if self.checking_permissions {
            return self.build_placeholder(fl!("waiting-for-camera"));
        }

        match self.permission_status.view() {
            GateView::Preview => self.build_preview_screen(),
            GateView::Rationale => self.build_permission_view(fl!("permission-rationale")),
            GateView::Request => self.build_permission_view(fl!("permission-request")),
        }
    }

    fn build_placeholder(&self, text: String) -> Element<'_, Message> {
        widget::container(widget::text(text))
            .center(Length::Fill)
            .style(|_theme| widget::container::Style {
                background: Some(Background::Color(Color::BLACK)),
                text_color: Some(Color::WHITE),
                ..Default::default()
            })
            .into()
    }

    fn build_permission_view(&self, message: String) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let mut column = widget::column()
            .push(widget::icon::from_name("camera-disabled-symbolic").size(64))
            .push(widget::text(message))
            .spacing(spacing.space_s)
            .align_x(Alignment::Center)
            .width(Length::Fixed(ui::PERMISSION_COLUMN_WIDTH));

        if self.permission_set.contains(Permission::SharedStorage) {
            column = column.push(widget::text(fl!("permission-storage")).size(12));
        }

        column = column.push(
            widget::button::suggested(fl!("permission-button"))
                .on_press(Message::RequestPermissions),
        );

        widget::container(column).center(Length::Fill).into()
    }

    fn build_preview_screen(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let preview: Element<'_, Message> = match (&self.preview_handle, &self.session) {
            (Some(handle), SessionState::Bound(_)) => widget::image::Image::new(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            (_, SessionState::Binding) => self.build_placeholder(fl!("binding-camera")),
            _ => self.build_placeholder(fl!("waiting-for-camera")),
        };
        let preview = widget::container(preview)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme| widget::container::Style {
                background: Some(Background::Color(Color::BLACK)),
                ..Default::default()
            });

        let status: Element<'_, Message> = if self.status.text().is_empty() {
            widget::Space::new(Length::Shrink, Length::Shrink).into()
        } else {
            widget::container(widget::text(self.status.text()).size(12))
                .padding([spacing.space_xxs, spacing.space_s])
                .style(overlay_container_style)
                .into()
        };

        // [Fill] [Shutter] [Switch] [Fill], switcher balanced by an equal spacer
        let switch_width = Length::Fixed(52.0);
        let controls = widget::row()
            .push(widget::Space::new(Length::Fill, Length::Shrink))
            .push(widget::Space::new(switch_width, Length::Shrink))
            .push(self.build_capture_button())
            .push(self.build_camera_switcher())
            .push(widget::Space::new(Length::Fill, Length::Shrink))
            .spacing(spacing.space_m)
            .align_y(Alignment::Center)
            .width(Length::Fill);

        let overlay = widget::column()
            .push(widget::Space::new(Length::Fill, Length::Fill))
            .push(
                widget::container(status)
                    .width(Length::Fill)
                    .center_x(Length::Fill),
            )
            .push(controls)
            .spacing(spacing.space_xs)
            .padding(spacing.space_s)
            .width(Length::Fill)
            .height(Length::Fill);

        cosmic::iced::widget::stack![preview, overlay]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}
