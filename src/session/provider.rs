// SPDX-License-Identifier: GPL-3.0-only

//! Process-wide camera provider and session binding
//!
//! The provider owns the backend and at most one bound session. Binding
//! replaces the session wholesale: the old one is stopped before the new
//! one starts, all under one lock.

use super::lifecycle::Lifecycle;
use super::selector::{CameraSelector, select_session_format};
use super::use_cases::{ImageCapture, Preview};
use crate::backends::camera::{CameraBackend, CameraDevice, CameraFormat, get_backend};
use crate::errors::CameraError;
use cosmic::iced::futures::channel::oneshot;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};
use tracing::{error, info, warn};

static PROVIDER: OnceLock<CameraProvider> = OnceLock::new();

/// Description of a freshly bound session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundCamera {
    pub device: CameraDevice,
    pub format: CameraFormat,
    /// Increases with every bind; identifies the session
    pub generation: u64,
}

struct BoundSession {
    generation: u64,
    image_capture: ImageCapture,
}

struct ProviderState {
    backend: Box<dyn CameraBackend>,
    session: Option<BoundSession>,
    generation: u64,
}

impl ProviderState {
    fn unbind(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.image_capture.detach();
        if let Err(e) = self.backend.shutdown() {
            warn!(error = %e, generation = session.generation, "Backend shutdown failed");
        }
        info!(generation = session.generation, "Session unbound");
    }
}

struct ProviderInner {
    state: Mutex<ProviderState>,
}

/// Handle to the camera provider
#[derive(Clone)]
pub struct CameraProvider {
    inner: Arc<ProviderInner>,
}

impl CameraProvider {
    /// Get the shared provider, bringing it up on first use
    ///
    /// Initialization runs on a helper thread and resumes the caller once.
    pub async fn get_instance() -> Result<CameraProvider, CameraError> {
        if let Some(provider) = PROVIDER.get() {
            return Ok(provider.clone());
        }

        let (tx, rx) = oneshot::channel();
        std::thread::Builder::new()
            .name("camera-provider".to_string())
            .spawn(move || {
                let backend = get_backend();
                let result = if backend.is_available() {
                    Ok(backend)
                } else {
                    Err(CameraError::ProviderUnavailable(
                        "PipeWire camera source is not available".to_string(),
                    ))
                };
                let _ = tx.send(result);
            })
            .map_err(|e| CameraError::ProviderUnavailable(e.to_string()))?;

        let backend = rx.await.map_err(|_| {
            CameraError::ProviderUnavailable("Provider initialization was abandoned".to_string())
        })??;

        info!("Camera provider ready");
        Ok(PROVIDER
            .get_or_init(|| CameraProvider::new(backend))
            .clone())
    }

    /// Provider over a specific backend
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                state: Mutex::new(ProviderState {
                    backend,
                    session: None,
                    generation: 0,
                }),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        match self.inner.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn available_cameras(&self) -> Vec<CameraDevice> {
        self.lock().backend.enumerate_cameras()
    }

    /// Bind `preview` and `image_capture` to a camera chosen by `selector`
    ///
    /// Any existing session is unbound first. The session ends when `owner`
    /// is destroyed.
    pub fn bind_to_lifecycle(
        &self,
        owner: &Lifecycle,
        selector: &CameraSelector,
        preview: &Preview,
        image_capture: &ImageCapture,
    ) -> Result<BoundCamera, CameraError> {
        if owner.is_destroyed() {
            return Err(CameraError::LifecycleDestroyed);
        }

        let bound = {
            let mut state = self.lock();
            state.unbind();

            let cameras = state.backend.enumerate_cameras();
            let device = selector.select(&cameras)?.clone();
            let available = state.backend.get_formats(&device);
            let format = select_session_format(&available).ok_or_else(|| {
                CameraError::InitializationFailed(format!("{} offers no formats", device.name))
            })?;

            image_capture.attach();
            let sinks = vec![preview.sink(), image_capture.sink()];
            if let Err(e) = state.backend.initialize(&device, &format, sinks) {
                image_capture.detach();
                error!(error = %e, device = %device.name, "Failed to bind session");
                return Err(e.into());
            }

            state.generation += 1;
            let generation = state.generation;
            state.session = Some(BoundSession {
                generation,
                image_capture: image_capture.clone(),
            });

            info!(
                generation,
                device = %device.name,
                format = %format,
                facing = %selector.lens_facing(),
                "Session bound"
            );
            BoundCamera {
                device,
                format,
                generation,
            }
        };

        // One observer per provider and owner; it tracks the latest generation
        let key = Arc::as_ptr(&self.inner) as usize;
        let provider: Weak<ProviderInner> = Arc::downgrade(&self.inner);
        let generation = bound.generation;
        owner.on_destroy_keyed(key, move || {
            if let Some(inner) = provider.upgrade() {
                CameraProvider { inner }.unbind_generation(generation);
            }
        });

        Ok(bound)
    }

    /// Stop the bound session, if any
    pub fn unbind_all(&self) {
        self.lock().unbind();
    }

    fn unbind_generation(&self, generation: u64) {
        let mut state = self.lock();
        if state.session.as_ref().map(|s| s.generation) == Some(generation) {
            state.unbind();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Device of the bound session
    pub fn active_camera(&self) -> Option<CameraDevice> {
        let state = self.lock();
        state.session.as_ref()?;
        state.backend.current_device().cloned()
    }
}

impl std::fmt::Debug for CameraProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraProvider")
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{BackendError, BackendResult, FrameSink, Framerate};
    use crate::pipelines::photo::EncodingQuality;

    #[derive(Default)]
    struct StubBackend {
        device: Option<CameraDevice>,
        fail: bool,
    }

    impl CameraBackend for StubBackend {
        fn enumerate_cameras(&self) -> Vec<CameraDevice> {
            vec![CameraDevice::default_camera()]
        }

        fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
            vec![CameraFormat {
                width: 640,
                height: 480,
                framerate: Some(Framerate::from_int(30)),
                pixel_format: "YUY2".to_string(),
            }]
        }

        fn initialize(
            &mut self,
            device: &CameraDevice,
            _format: &CameraFormat,
            _sinks: Vec<FrameSink>,
        ) -> BackendResult<()> {
            if self.fail {
                return Err(BackendError::InitializationFailed("busy".to_string()));
            }
            self.device = Some(device.clone());
            Ok(())
        }

        fn shutdown(&mut self) -> BackendResult<()> {
            self.device = None;
            Ok(())
        }

        fn is_initialized(&self) -> bool {
            self.device.is_some()
        }

        fn is_available(&self) -> bool {
            true
        }

        fn current_device(&self) -> Option<&CameraDevice> {
            self.device.as_ref()
        }
    }

    #[test]
    fn test_generation_increases_per_bind() {
        let provider = CameraProvider::new(Box::new(StubBackend::default()));
        let owner = Lifecycle::new("test");
        let preview = Preview::new();
        let capture = ImageCapture::new(EncodingQuality::High);

        let first = provider
            .bind_to_lifecycle(&owner, &CameraSelector::default(), &preview, &capture)
            .unwrap();
        let second = provider
            .bind_to_lifecycle(&owner, &CameraSelector::default(), &preview, &capture)
            .unwrap();
        assert!(second.generation > first.generation);
        assert!(provider.is_bound());
        assert!(provider.active_camera().is_some());
    }

    #[test]
    fn test_rebinding_keeps_one_observer_per_owner() {
        let provider = CameraProvider::new(Box::new(StubBackend::default()));
        let owner = Lifecycle::new("test");
        let preview = Preview::new();
        let capture = ImageCapture::new(EncodingQuality::High);

        for _ in 0..10 {
            provider
                .bind_to_lifecycle(&owner, &CameraSelector::default(), &preview, &capture)
                .unwrap();
        }
        assert_eq!(owner.observer_count(), 1);

        owner.destroy();
        assert!(!provider.is_bound());
    }

    #[test]
    fn test_old_owner_does_not_unbind_newer_session() {
        let provider = CameraProvider::new(Box::new(StubBackend::default()));
        let first = Lifecycle::new("first");
        let second = Lifecycle::new("second");
        let preview = Preview::new();
        let capture = ImageCapture::new(EncodingQuality::High);

        provider
            .bind_to_lifecycle(&first, &CameraSelector::default(), &preview, &capture)
            .unwrap();
        provider
            .bind_to_lifecycle(&second, &CameraSelector::default(), &preview, &capture)
            .unwrap();

        first.destroy();
        assert!(provider.is_bound());
        second.destroy();
        assert!(!provider.is_bound());
    }

    #[test]
    fn test_failed_bind_leaves_nothing_bound() {
        let provider = CameraProvider::new(Box::new(StubBackend {
            fail: true,
            ..Default::default()
        }));
        let owner = Lifecycle::new("test");
        let capture = ImageCapture::new(EncodingQuality::High);

        let result =
            provider.bind_to_lifecycle(&owner, &CameraSelector::default(), &Preview::new(), &capture);
        assert!(matches!(result, Err(CameraError::InitializationFailed(_))));
        assert!(!provider.is_bound());
        assert!(!capture.is_bound());
    }

    #[test]
    fn test_destroyed_owner_is_rejected() {
        let provider = CameraProvider::new(Box::new(StubBackend::default()));
        let owner = Lifecycle::new("test");
        owner.destroy();

        let result = provider.bind_to_lifecycle(
            &owner,
            &CameraSelector::default(),
            &Preview::new(),
            &ImageCapture::new(EncodingQuality::High),
        );
        assert!(matches!(result, Err(CameraError::LifecycleDestroyed)));
    }
}
