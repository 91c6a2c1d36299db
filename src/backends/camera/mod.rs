// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  CameraProvider     │  ← Session binding, lifecycle
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Device access + frame delivery
//! └──────────┬──────────┘
//!            │
//!            ▼
//!       ┌────────┐
//!       │PipeWire│
//!       └────────┘
//! ```

pub mod pipewire;
pub mod types;

pub use types::*;

/// Device access used by the camera provider
///
/// A backend runs at most one session. Frames of the running session are
/// handed to every sink passed to [`CameraBackend::initialize`].
pub trait CameraBackend: Send {
    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Get supported formats for a specific camera device
    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat>;

    /// Start a session on `device` with `format`
    ///
    /// Any running session is shut down first.
    fn initialize(
        &mut self,
        device: &CameraDevice,
        format: &CameraFormat,
        sinks: Vec<FrameSink>,
    ) -> BackendResult<()>;

    /// Stop the running session and release the device
    fn shutdown(&mut self) -> BackendResult<()>;

    /// Check if a session is running
    fn is_initialized(&self) -> bool;

    /// Check if this backend can run on the current system
    fn is_available(&self) -> bool;

    /// Device of the running session
    fn current_device(&self) -> Option<&CameraDevice>;
}

/// Get a concrete backend instance (PipeWire only)
pub fn get_backend() -> Box<dyn CameraBackend> {
    Box::new(pipewire::PipeWireBackend::new())
}
