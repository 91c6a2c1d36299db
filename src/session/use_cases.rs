// SPDX-License-Identifier: GPL-3.0-only

//! Outputs a session can be bound with: live preview and still capture

use super::executor::CaptureExecutor;
use crate::backends::camera::types::{CameraFrame, FrameSender, FrameSink};
use crate::errors::ImageCaptureError;
use crate::pipelines::photo::{EncodingQuality, PhotoPipeline};
use crate::storage::CapturedFile;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, warn};

/// Live preview output
///
/// Frames go to the surface provider's channel. A full channel drops frames.
#[derive(Clone, Default)]
pub struct Preview {
    surface: Arc<Mutex<Option<FrameSender>>>,
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach (or detach with `None`) the surface that renders frames
    pub fn set_surface_provider(&self, sender: Option<FrameSender>) {
        if let Ok(mut surface) = self.surface.lock() {
            *surface = sender;
        }
    }

    pub fn has_surface(&self) -> bool {
        self.surface.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    pub(crate) fn sink(&self) -> FrameSink {
        let surface = Arc::clone(&self.surface);
        Arc::new(move |frame| {
            let Ok(mut guard) = surface.lock() else {
                return;
            };
            if let Some(sender) = guard.as_mut()
                && let Err(e) = sender.try_send(frame)
                && e.is_disconnected()
            {
                debug!("Preview surface went away");
                *guard = None;
            }
        })
    }
}

/// Where a capture is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFileOptions {
    pub path: PathBuf,
}

impl OutputFileOptions {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Completion of a still capture
///
/// Exactly one of the two methods is called per request, including when the
/// capture job is lost to a panic.
pub trait OnImageSavedCallback: Send + 'static {
    fn on_image_saved(self: Box<Self>, saved: CapturedFile);
    fn on_error(self: Box<Self>, error: ImageCaptureError);
}

impl<F> OnImageSavedCallback for F
where
    F: FnOnce(Result<CapturedFile, ImageCaptureError>) + Send + 'static,
{
    fn on_image_saved(self: Box<Self>, saved: CapturedFile) {
        (*self)(Ok(saved))
    }

    fn on_error(self: Box<Self>, error: ImageCaptureError) {
        (*self)(Err(error))
    }
}

/// Callback that can be claimed by whichever path finishes the request
#[derive(Clone)]
struct CallbackSlot(Arc<PendingCallback>);

/// Reports an abandoned request when the last slot handle goes away unfinished
struct PendingCallback(Mutex<Option<Box<dyn OnImageSavedCallback>>>);

impl Drop for PendingCallback {
    fn drop(&mut self) {
        let pending = match self.0.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(callback) = pending {
            warn!("Capture request abandoned before completing");
            callback.on_error(ImageCaptureError::Rejected(
                "capture job did not complete".to_string(),
            ));
        }
    }
}

impl CallbackSlot {
    fn new(callback: Box<dyn OnImageSavedCallback>) -> Self {
        Self(Arc::new(PendingCallback(Mutex::new(Some(callback)))))
    }

    fn take(&self) -> Option<Box<dyn OnImageSavedCallback>> {
        self.0.0.lock().ok().and_then(|mut slot| slot.take())
    }

    fn finish(&self, result: Result<CapturedFile, ImageCaptureError>) {
        let Some(callback) = self.take() else {
            return;
        };
        match result {
            Ok(saved) => callback.on_image_saved(saved),
            Err(e) => callback.on_error(e),
        }
    }
}

struct CaptureState {
    bound: bool,
    latest: Option<Arc<CameraFrame>>,
    quality: EncodingQuality,
}

/// Still capture output
///
/// Keeps the newest frame of the bound session and writes it on request.
#[derive(Clone)]
pub struct ImageCapture {
    state: Arc<Mutex<CaptureState>>,
}

impl ImageCapture {
    pub fn new(quality: EncodingQuality) -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState {
                bound: false,
                latest: None,
                quality,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_quality(&self, quality: EncodingQuality) {
        self.lock().quality = quality;
    }

    pub fn is_bound(&self) -> bool {
        self.lock().bound
    }

    pub fn has_frame(&self) -> bool {
        self.lock().latest.is_some()
    }

    pub(crate) fn attach(&self) {
        let mut state = self.lock();
        state.bound = true;
        state.latest = None;
    }

    pub(crate) fn detach(&self) {
        let mut state = self.lock();
        state.bound = false;
        state.latest = None;
    }

    pub(crate) fn sink(&self) -> FrameSink {
        let state = Arc::clone(&self.state);
        Arc::new(move |frame| {
            if let Ok(mut state) = state.lock()
                && state.bound
            {
                state.latest = Some(frame);
            }
        })
    }

    /// Write the newest frame to `options.path` on `executor`
    pub fn take_picture(
        &self,
        options: OutputFileOptions,
        executor: &CaptureExecutor,
        callback: Box<dyn OnImageSavedCallback>,
    ) {
        let slot = CallbackSlot::new(callback);

        let snapshot = {
            let state = self.lock();
            if !state.bound {
                Err(ImageCaptureError::CameraClosed)
            } else {
                state
                    .latest
                    .clone()
                    .map(|frame| (frame, state.quality))
                    .ok_or(ImageCaptureError::NoFrameAvailable)
            }
        };

        let job_slot = slot.clone();
        let submitted = executor.execute(move || {
            let result = snapshot.and_then(|(frame, quality)| {
                // Resolved before writing so a failure leaves no file behind
                let saved = CapturedFile::new(options.path.clone())
                    .map_err(|e| ImageCaptureError::Rejected(e.to_string()))?;
                PhotoPipeline::new(quality).save_to(&frame, &saved.path)?;
                Ok(saved)
            });
            if let Err(e) = &result {
                warn!(error = %e, "Capture failed");
            }
            job_slot.finish(result);
        });

        if let Err(e) = submitted {
            error!(error = %e, "Capture request rejected");
            slot.finish(Err(e.into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::CameraFrame;
    use cosmic::iced::futures::channel::mpsc;

    #[test]
    fn test_preview_drops_when_full() {
        let preview = Preview::new();
        let (tx, mut rx) = mpsc::channel(0);
        assert!(!preview.has_surface());
        preview.set_surface_provider(Some(tx));
        assert!(preview.has_surface());
        let sink = preview.sink();

        for _ in 0..5 {
            sink(Arc::new(CameraFrame::from_rgba(1, 1, vec![0; 4])));
        }

        let mut received = 0;
        while let Ok(Some(_)) = rx.try_next() {
            received += 1;
        }
        assert!(received >= 1 && received < 5);
    }

    #[test]
    fn test_unbound_capture_ignores_frames() {
        let capture = ImageCapture::new(EncodingQuality::High);
        capture.sink()(Arc::new(CameraFrame::from_rgba(1, 1, vec![0; 4])));
        assert!(!capture.has_frame());

        capture.attach();
        capture.sink()(Arc::new(CameraFrame::from_rgba(1, 1, vec![0; 4])));
        assert!(capture.has_frame());

        capture.detach();
        assert!(!capture.has_frame());
    }

    #[test]
    fn test_unbound_capture_reports_camera_closed() {
        let capture = ImageCapture::new(EncodingQuality::High);
        let executor = CaptureExecutor::new().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        capture.take_picture(
            OutputFileOptions::new(std::env::temp_dir().join("never-written.jpg")),
            &executor,
            Box::new(move |result: Result<CapturedFile, ImageCaptureError>| {
                let _ = tx.send(result);
            }),
        );

        let result = rx.recv().unwrap();
        assert!(matches!(result, Err(ImageCaptureError::CameraClosed)));
    }

    #[test]
    fn test_abandoned_request_reports_error() {
        let executor = CaptureExecutor::new().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let slot = CallbackSlot::new(Box::new(
            move |result: Result<CapturedFile, ImageCaptureError>| {
                let _ = tx.send(result);
            },
        ));

        // The job panics before finishing; the slot is dropped while unwinding
        let job_slot = slot.clone();
        drop(slot);
        executor
            .execute(move || {
                let _held = job_slot;
                panic!("encoder crashed");
            })
            .unwrap();
        executor.shutdown();

        let result = rx.recv().unwrap();
        assert!(matches!(result, Err(ImageCaptureError::Rejected(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_finished_request_is_not_reported_again() {
        let (tx, rx) = std::sync::mpsc::channel();
        let slot = CallbackSlot::new(Box::new(
            move |result: Result<CapturedFile, ImageCaptureError>| {
                let _ = tx.send(result);
            },
        ));
        slot.clone().finish(Err(ImageCaptureError::NoFrameAvailable));
        drop(slot);

        assert!(matches!(
            rx.recv().unwrap(),
            Err(ImageCaptureError::NoFrameAvailable)
        ));
        assert!(rx.try_recv().is_err());
    }
}
