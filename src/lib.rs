// SPDX-License-Identifier: MPL-2.0

//! SnapCam - camera preview and still capture for the COSMIC desktop
//!
//! # Architecture
//!
//! - [`permissions`]: permission gate and desktop portal broker
//! - [`session`]: camera provider, lifecycle binding and capture use-cases
//! - [`backends`]: PipeWire camera backend
//! - [`pipelines`]: frame conversion, JPEG encoding and the capture routine
//! - [`storage`]: output directory and status display
//! - [`app`]: libcosmic window
//! - [`terminal`]: ratatui terminal surface
//! - [`config`]: user configuration handling

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod i18n;
pub mod permissions;
pub mod pipelines;
pub mod session;
pub mod sound;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{AppModel, Message};
pub use config::Config;
pub use errors::{AppError, AppResult};
