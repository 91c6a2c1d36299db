// SPDX-License-Identifier: MPL-2.0

//! Shutter and camera-switch buttons

use crate::app::state::{AppModel, Message, SessionState};
use crate::constants::ui;
use cosmic::Element;
use cosmic::iced::{Background, Color, Length};
use cosmic::widget;

impl AppModel {
    /// Build the shutter button
    ///
    /// White ring with a filled circle. Gray and shrunk while captures are in
    /// flight; non-interactive until a session is bound. Presses during a
    /// capture are queued behind it.
    pub fn build_capture_button(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();
        let is_bound = matches!(self.session, SessionState::Bound(_));
        let busy = self.captures_in_flight > 0;

        let color = if !is_bound {
            Color::from_rgba(0.5, 0.5, 0.5, 0.3)
        } else if busy {
            Color::from_rgb(0.7, 0.7, 0.7)
        } else {
            Color::WHITE
        };

        let (inner_size, outer_size) = if busy {
            (
                ui::CAPTURE_BUTTON_INNER * 0.85,
                ui::CAPTURE_BUTTON_OUTER * 0.85,
            )
        } else {
            (ui::CAPTURE_BUTTON_INNER, ui::CAPTURE_BUTTON_OUTER)
        };

        let button_inner = widget::container(widget::Space::new(
            Length::Fixed(inner_size),
            Length::Fixed(inner_size),
        ))
        .style(move |_theme| widget::container::Style {
            background: Some(Background::Color(color)),
            border: cosmic::iced::Border {
                radius: [ui::CAPTURE_BUTTON_RADIUS * (inner_size / ui::CAPTURE_BUTTON_INNER); 4]
                    .into(),
                ..Default::default()
            },
            ..Default::default()
        });

        let ring = widget::container(button_inner)
            .center(Length::Fixed(outer_size))
            .style(move |_theme| widget::container::Style {
                border: cosmic::iced::Border {
                    radius: [outer_size / 2.0; 4].into(),
                    width: ui::CAPTURE_BUTTON_RING,
                    color,
                },
                ..Default::default()
            });

        let mut button = widget::button::custom(ring)
            .padding(0)
            .width(Length::Fixed(outer_size))
            .height(Length::Fixed(outer_size))
            .class(cosmic::theme::Button::Text);
        if is_bound {
            button = button.on_press(Message::Capture);
        }

        // Fixed-size wrapper so the press effect does not shift the layout
        let wrapper = widget::container(button)
            .width(Length::Fixed(ui::CAPTURE_BUTTON_OUTER))
            .height(Length::Fixed(ui::CAPTURE_BUTTON_OUTER))
            .center_x(ui::CAPTURE_BUTTON_OUTER)
            .center_y(ui::CAPTURE_BUTTON_OUTER);

        widget::container(wrapper)
            .padding([spacing.space_xs, 0])
            .into()
    }

    /// Build the lens toggle
    ///
    /// Disabled while a bind is in flight.
    pub fn build_camera_switcher(&self) -> Element<'_, Message> {
        let icon = widget::icon::from_name("camera-switch-symbolic").size(32);
        let content = widget::container(icon).center(Length::Fixed(52.0));

        let mut button = widget::button::custom(content)
            .padding(0)
            .class(cosmic::theme::Button::Text);
        if !matches!(self.session, SessionState::Binding) {
            button = button.on_press(Message::SwitchCamera);
        }

        widget::container(button)
            .style(overlay_container_style)
            .into()
    }
}

/// Translucent rounded background for controls drawn over the preview
pub fn overlay_container_style(theme: &cosmic::Theme) -> widget::container::Style {
    let cosmic = theme.cosmic();
    let bg = cosmic.bg_color();
    widget::container::Style {
        background: Some(Background::Color(Color::from_rgba(
            bg.red,
            bg.green,
            bg.blue,
            ui::OVERLAY_BACKGROUND_ALPHA,
        ))),
        border: cosmic::iced::Border {
            radius: cosmic.corner_radii.radius_m.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}
