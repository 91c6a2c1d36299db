// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             Session layer                    │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │            ┌──────────────────┐              │
//! │            │     Camera       │              │
//! │            │    (PipeWire)    │              │
//! │            └──────────────────┘              │
//! └─────────────────────────────────────────────┘
//! ```

pub mod camera;
