// SPDX-License-Identifier: GPL-3.0-only

//! Hardware-free camera backend shared by the integration tests

#![allow(dead_code)]

use snapcam::backends::camera::{
    BackendResult, CameraBackend, CameraDevice, CameraFormat, CameraFrame, CameraLocation,
    FrameSink, Framerate,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeState {
    sinks: Vec<FrameSink>,
    device: Option<CameraDevice>,
    /// Sessions started and not yet shut down
    running: usize,
    initializations: usize,
}

/// Test-side handle to the fake backend
#[derive(Clone, Default)]
pub struct FakeCamera {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCamera {
    pub fn backend(&self) -> Box<dyn CameraBackend> {
        Box::new(FakeBackend {
            state: Arc::clone(&self.state),
        })
    }

    /// Deliver a solid-gray RGBA frame to every sink of the running session
    pub fn push_frame(&self, shade: u8) {
        let frame = Arc::new(CameraFrame::from_rgba(4, 2, vec![shade; 4 * 2 * 4]));
        let sinks = self.state.lock().unwrap().sinks.clone();
        for sink in sinks {
            sink(Arc::clone(&frame));
        }
    }

    pub fn running_sessions(&self) -> usize {
        self.state.lock().unwrap().running
    }

    pub fn initializations(&self) -> usize {
        self.state.lock().unwrap().initializations
    }

    pub fn current_device(&self) -> Option<CameraDevice> {
        self.state.lock().unwrap().device.clone()
    }
}

struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl CameraBackend for FakeBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![
            CameraDevice {
                name: "Rear".to_string(),
                path: "pipewire-serial-1".to_string(),
                metadata_path: Some("1".to_string()),
                location: Some(CameraLocation::Back),
            },
            CameraDevice {
                name: "Selfie".to_string(),
                path: "pipewire-serial-2".to_string(),
                metadata_path: Some("2".to_string()),
                location: Some(CameraLocation::Front),
            },
        ]
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        vec![CameraFormat {
            width: 1280,
            height: 720,
            framerate: Some(Framerate::from_int(30)),
            pixel_format: "MJPG".to_string(),
        }]
    }

    fn initialize(
        &mut self,
        device: &CameraDevice,
        _format: &CameraFormat,
        sinks: Vec<FrameSink>,
    ) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.device.is_some() {
            state.running -= 1;
        }
        state.sinks = sinks;
        state.device = Some(device.clone());
        state.running += 1;
        state.initializations += 1;
        Ok(())
    }

    fn shutdown(&mut self) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.device.take().is_some() {
            state.running -= 1;
        }
        state.sinks.clear();
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.state.lock().unwrap().device.is_some()
    }

    fn is_available(&self) -> bool {
        true
    }

    fn current_device(&self) -> Option<&CameraDevice> {
        None
    }
}

/// Fresh uuid-named directory under the system temp dir
pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
