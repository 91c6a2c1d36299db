// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera application

use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Photo capture errors
    Photo(ImageCaptureError),
    /// Permission errors
    Permission(PermissionError),
    /// Storage/filesystem errors
    Storage(String),
}

/// Camera provider and session errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// The camera provider could not be brought up
    ProviderUnavailable(String),
    /// No camera devices found
    NoCameraFound,
    /// No camera satisfies the selector
    NoMatchingCamera(String),
    /// Camera session failed to start
    InitializationFailed(String),
    /// Binding was attempted on a destroyed lifecycle
    LifecycleDestroyed,
    /// Backend error (e.g., PipeWire)
    BackendError(String),
}

/// Frame-to-file errors
#[derive(Debug, Clone)]
pub enum PhotoError {
    /// Frame could not be converted to an image
    ConversionFailed(String),
    /// Encoding failed
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
}

/// Errors delivered to `OnImageSavedCallback::on_error`
#[derive(Debug, Clone)]
pub enum ImageCaptureError {
    /// The capture use-case is not bound to a running session
    CameraClosed,
    /// Session is bound but has not produced a frame yet
    NoFrameAvailable,
    /// Processing, encoding or writing failed
    Photo(PhotoError),
    /// The capture executor refused the job
    Rejected(String),
}

/// Capture worker errors
#[derive(Debug, Clone)]
pub enum ExecutorError {
    /// The worker thread could not be started
    SpawnFailed(String),
    /// The executor no longer accepts jobs
    ShutDown,
}

/// Permission query/request errors
#[derive(Debug, Clone)]
pub enum PermissionError {
    /// Could not reach the session bus
    Bus(String),
    /// Portal call failed
    Portal(String),
    /// The portal request ended without a response
    NoResponse,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Permission(e) => write!(f, "Permission error: {}", e),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::ProviderUnavailable(msg) => {
                write!(f, "Camera provider unavailable: {}", msg)
            }
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::NoMatchingCamera(facing) => {
                write!(f, "No camera matches lens facing {}", facing)
            }
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::LifecycleDestroyed => write!(f, "Lifecycle owner already destroyed"),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::ConversionFailed(msg) => write!(f, "Conversion failed: {}", msg),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for ImageCaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageCaptureError::CameraClosed => write!(f, "Camera is not bound"),
            ImageCaptureError::NoFrameAvailable => write!(f, "No frame available for capture"),
            ImageCaptureError::Photo(e) => write!(f, "{}", e),
            ImageCaptureError::Rejected(msg) => write!(f, "Capture rejected: {}", msg),
        }
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorError::SpawnFailed(msg) => write!(f, "Failed to start capture worker: {}", msg),
            ExecutorError::ShutDown => write!(f, "Capture worker is shut down"),
        }
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::Bus(msg) => write!(f, "D-Bus unavailable: {}", msg),
            PermissionError::Portal(msg) => write!(f, "Portal call failed: {}", msg),
            PermissionError::NoResponse => write!(f, "Portal request ended without a response"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}
impl std::error::Error for ImageCaptureError {}
impl std::error::Error for ExecutorError {}
impl std::error::Error for PermissionError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<ImageCaptureError> for AppError {
    fn from(err: ImageCaptureError) -> Self {
        AppError::Photo(err)
    }
}

impl From<PermissionError> for AppError {
    fn from(err: PermissionError) -> Self {
        AppError::Permission(err)
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::EncodingFailed(err.to_string())
    }
}

impl From<PhotoError> for ImageCaptureError {
    fn from(err: PhotoError) -> Self {
        ImageCaptureError::Photo(err)
    }
}

impl From<ExecutorError> for ImageCaptureError {
    fn from(err: ExecutorError) -> Self {
        ImageCaptureError::Rejected(err.to_string())
    }
}

impl From<ExecutorError> for AppError {
    fn from(err: ExecutorError) -> Self {
        AppError::Photo(err.into())
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotAvailable(msg) => CameraError::ProviderUnavailable(msg),
            BackendError::InitializationFailed(msg) => CameraError::InitializationFailed(msg),
            other => CameraError::BackendError(other.to_string()),
        }
    }
}

impl From<zbus::Error> for PermissionError {
    fn from(err: zbus::Error) -> Self {
        PermissionError::Portal(err.to_string())
    }
}
