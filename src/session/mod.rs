// SPDX-License-Identifier: GPL-3.0-only

//! Camera session binding
//!
//! ```text
//! Lifecycle ──owns──▶ bound session ◀──binds── CameraProvider
//!                         │
//!            ┌────────────┴────────────┐
//!            ▼                         ▼
//!         Preview                 ImageCapture ──▶ CaptureExecutor
//! ```

mod executor;
mod lifecycle;
mod provider;
mod selector;
mod use_cases;

pub use executor::CaptureExecutor;
pub use lifecycle::Lifecycle;
pub use provider::{BoundCamera, CameraProvider};
pub use selector::{CameraSelector, LensFacing, select_session_format};
pub use use_cases::{ImageCapture, OnImageSavedCallback, OutputFileOptions, Preview};
