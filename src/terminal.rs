// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based camera viewer
//!
//! Same permission gate, session binding and capture routine as the window,
//! rendered with Unicode half-block characters for double vertical
//! resolution.

use crate::backends::camera::types::{CameraFrame, FrameReceiver};
use crate::config::Config;
use crate::constants::{app_info, pipeline, timing};
use crate::errors::ImageCaptureError;
use crate::fl;
use crate::permissions::{self, GateView, PermissionSet, PermissionStatus, PortalBroker};
use crate::pipelines::photo::processing::sample_pixel_rgb;
use crate::pipelines::photo::take_photo;
use crate::session::{
    CameraProvider, CameraSelector, CaptureExecutor, ImageCapture, LensFacing, Lifecycle, Preview,
};
use crate::sound::ShutterSound;
use crate::storage::{CapturedFile, OutputDirectory, StatusLabel, storage_root};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::channel::mpsc;
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

type CaptureResult = Result<CapturedFile, ImageCaptureError>;

/// Run the terminal camera viewer
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;
    let (_, config) = Config::load();
    let mut session = TerminalSession::new(&config)?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut session);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    session.lifecycle.destroy();
    result
}

/// Everything the terminal loop owns
struct TerminalSession {
    broker: PortalBroker,
    permission_set: PermissionSet,
    permission_status: PermissionStatus,
    lifecycle: Lifecycle,
    lens_facing: LensFacing,
    preview: Preview,
    image_capture: ImageCapture,
    executor: CaptureExecutor,
    shutter: ShutterSound,
    output_dir: OutputDirectory,
    status: StatusLabel,
    frames: Option<FrameReceiver>,
    /// Set after a failed bind; cleared by a lens switch or permission change
    bind_failed: bool,
    captures_tx: std::sync::mpsc::Sender<CaptureResult>,
    captures_rx: std::sync::mpsc::Receiver<CaptureResult>,
}

impl TerminalSession {
    fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let sandboxed = app_info::is_flatpak();
        let broker = PortalBroker::new(sandboxed);
        let permission_set = PermissionSet::required(sandboxed, config.storage_location);
        let permission_status = pollster::block_on(permissions::check_all(&broker, &permission_set));
        let (captures_tx, captures_rx) = std::sync::mpsc::channel();

        Ok(Self {
            broker,
            permission_set,
            permission_status,
            lifecycle: Lifecycle::new("terminal"),
            lens_facing: config.lens_facing,
            preview: Preview::new(),
            image_capture: ImageCapture::new(config.photo_quality),
            executor: CaptureExecutor::new()?,
            shutter: ShutterSound::load(config.shutter_sound),
            output_dir: OutputDirectory::resolve(config.storage_location),
            status: StatusLabel::new(storage_root(), fl!("internal-storage")),
            frames: None,
            bind_failed: false,
            captures_tx,
            captures_rx,
        })
    }

    fn gate(&self) -> GateView {
        self.permission_status.view()
    }

    /// Bind once the gate opens; a failure is shown and not retried
    fn ensure_bound(&mut self) {
        if self.frames.is_some() || self.bind_failed || self.gate() != GateView::Preview {
            return;
        }

        let result = pollster::block_on(CameraProvider::get_instance()).and_then(|provider| {
            provider.bind_to_lifecycle(
                &self.lifecycle,
                &CameraSelector::new(self.lens_facing),
                &self.preview,
                &self.image_capture,
            )
        });

        match result {
            Ok(bound) => {
                info!(camera = %bound.device.name, format = %bound.format, "Terminal session bound");
                let (sender, receiver) = mpsc::channel(pipeline::PREVIEW_CHANNEL_CAPACITY);
                self.preview.set_surface_provider(Some(sender));
                self.frames = Some(receiver);
            }
            Err(e) => {
                error!(error = %e, "Failed to bind camera session");
                self.bind_failed = true;
                self.status
                    .show_message(fl!("camera-unavailable", error = e.to_string()));
            }
        }
    }

    fn release(&mut self) {
        self.preview.set_surface_provider(None);
        self.frames = None;
        if let Ok(provider) = pollster::block_on(CameraProvider::get_instance()) {
            provider.unbind_all();
        }
    }

    fn request_permissions(&mut self) {
        let status = self.permission_status.clone();
        self.permission_status = pollster::block_on(permissions::request_missing(
            &self.broker,
            &self.permission_set,
            status,
        ));
        info!(view = ?self.gate(), "Permission request finished");
        self.bind_failed = false;
    }

    fn switch_lens(&mut self) {
        self.lens_facing = self.lens_facing.toggled();
        info!(facing = %self.lens_facing, "Switching lens facing");
        self.release();
        self.bind_failed = false;
    }

    fn capture(&mut self) {
        if self.frames.is_none() {
            return;
        }
        let tx = self.captures_tx.clone();
        take_photo(
            &self.image_capture,
            self.output_dir.path(),
            &self.executor,
            Some(&self.shutter),
            Box::new(move |result: CaptureResult| {
                let _ = tx.send(result);
            }),
        );
    }

    /// Newest frame waiting in the preview channel, if any
    fn latest_frame(&mut self) -> Option<Arc<CameraFrame>> {
        let receiver = self.frames.as_mut()?;
        let mut latest = None;
        while let Ok(Some(frame)) = receiver.try_next() {
            latest = Some(frame);
        }
        latest
    }

    fn drain_captures(&mut self) {
        while let Ok(result) = self.captures_rx.try_recv() {
            match result {
                Ok(file) => {
                    info!(path = %file.path.display(), "Photo saved");
                    self.status.show_capture(&file);
                }
                Err(e) => {
                    error!(error = %e, "Photo capture failed");
                    self.status
                        .show_message(fl!("capture-failed", error = e.to_string()));
                }
            }
        }
    }

    fn status_line(&self) -> String {
        if !self.status.text().is_empty() {
            return self.status.text().to_string();
        }
        match self.gate() {
            GateView::Preview => fl!("terminal-help"),
            _ => fl!("terminal-request"),
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut TerminalSession,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frame_widget = FrameWidget::new();

    loop {
        session.ensure_bound();
        if let Some(frame) = session.latest_frame() {
            frame_widget.update_frame(frame);
        }
        session.drain_captures();

        let gate = session.gate();
        let status_message = session.status_line();

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let main_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };

            match gate {
                GateView::Preview => f.render_widget(&frame_widget, main_area),
                GateView::Rationale => f.render_widget(
                    CenteredText {
                        text: fl!("permission-rationale"),
                    },
                    main_area,
                ),
                GateView::Request => f.render_widget(
                    CenteredText {
                        text: fl!("permission-request"),
                    },
                    main_area,
                ),
            }

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(timing::TERMINAL_POLL_MS))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('q') => break,
                KeyCode::Char('p') | KeyCode::Char(' ') if gate == GateView::Preview => {
                    session.capture();
                }
                KeyCode::Char('s') if gate == GateView::Preview => {
                    session.switch_lens();
                    frame_widget = FrameWidget::new();
                }
                KeyCode::Char('r') if gate != GateView::Preview => session.request_permissions(),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Size in cells of a `frame_width`×`frame_height` image fitted into
/// `area_width`×`area_height` cells, two pixel rows per cell
fn fit_frame(
    frame_width: u32,
    frame_height: u32,
    area_width: u16,
    area_height: u16,
) -> (u16, u16) {
    if frame_width == 0 || frame_height == 0 {
        return (0, 0);
    }
    let frame_aspect = frame_width as f64 / frame_height as f64;
    let term_width = area_width as f64;
    let term_height = (area_height as f64) * 2.0;

    if term_width / term_height > frame_aspect {
        // Terminal is wider - fit to height
        let w = term_height * frame_aspect;
        (w as u16, area_height)
    } else {
        // Terminal is taller - fit to width
        let h = term_width / frame_aspect;
        (area_width, (h / 2.0) as u16)
    }
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<Arc<CameraFrame>>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn update_frame(&mut self, frame: Arc<CameraFrame>) {
        self.frame = Some(frame);
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            CenteredText {
                text: fl!("waiting-for-camera"),
            }
            .render(area, buf);
            return;
        };

        let (display_width, display_height) =
            fit_frame(frame.width, frame.height, area.width, area.height);
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height as f64 * 2.0);

        // Upper half (▀) is the foreground, lower half the background
        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = sample_pixel_rgb(frame, src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = sample_pixel_rgb(frame, src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Single line of text centered in the area
struct CenteredText {
    text: String,
}

impl Widget for CenteredText {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = truncate(&self.text, area.width as usize);
        let width = text.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height / 2;
        if y < area.y + area.height {
            buf.set_string(x, y, text, ratatui::style::Style::default());
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_string(
            area.x,
            area.y,
            truncate(self.message, area.width as usize),
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}

/// First `max` characters of `text`
fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_wide_terminal() {
        // 4:3 frame into 80x20 cells (80x40 pixels) fits to height
        assert_eq!(fit_frame(640, 480, 80, 20), (53, 20));
    }

    #[test]
    fn test_fit_tall_terminal() {
        assert_eq!(fit_frame(640, 480, 40, 40), (40, 15));
    }

    #[test]
    fn test_fit_empty_frame() {
        assert_eq!(fit_frame(0, 480, 40, 40), (0, 0));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("カメラ", 2), "カメ");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn test_frame_widget_draws_half_blocks() {
        let mut widget = FrameWidget::new();
        widget.update_frame(Arc::new(CameraFrame::from_rgba(2, 2, vec![255; 16])));
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);
        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 255, 255));
    }
}
