// SPDX-License-Identifier: MPL-2.0

//! PipeWire camera backend
//!
//! Uses PipeWire for camera enumeration, format detection and capture.

mod enumeration;
mod pipeline;

pub use enumeration::{
    enumerate_pipewire_cameras, get_pipewire_formats, is_pipewire_available, parse_enum_formats,
    parse_location, parse_node_list,
};
pub use pipeline::{PipeWirePipeline, build_pipeline_string, determine_pipewire_path};

use super::CameraBackend;
use super::types::*;
use tracing::info;

/// PipeWire backend implementation
#[derive(Default)]
pub struct PipeWireBackend {
    current_device: Option<CameraDevice>,
    current_format: Option<CameraFormat>,
    pipeline: Option<PipeWirePipeline>,
}

impl PipeWireBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CameraBackend for PipeWireBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        match enumerate_pipewire_cameras() {
            Some(cameras) => {
                info!(count = cameras.len(), "PipeWire cameras enumerated");
                cameras
            }
            None => {
                info!("PipeWire enumeration returned None");
                Vec::new()
            }
        }
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        get_pipewire_formats(&device.path, device.metadata_path.as_deref())
    }

    fn initialize(
        &mut self,
        device: &CameraDevice,
        format: &CameraFormat,
        sinks: Vec<FrameSink>,
    ) -> BackendResult<()> {
        info!(
            device = %device.name,
            format = %format,
            sinks = sinks.len(),
            "Initializing PipeWire backend"
        );

        if self.is_initialized() {
            self.shutdown()?;
        }

        let pipeline = PipeWirePipeline::new(device, format, sinks)?;
        self.pipeline = Some(pipeline);
        self.current_device = Some(device.clone());
        self.current_format = Some(format.clone());

        info!("PipeWire backend initialized successfully");
        Ok(())
    }

    fn shutdown(&mut self) -> BackendResult<()> {
        info!("Shutting down PipeWire backend");

        self.current_device = None;
        self.current_format = None;
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.stop()?;
        }

        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.pipeline.is_some() && self.current_device.is_some()
    }

    fn is_available(&self) -> bool {
        is_pipewire_available()
    }

    fn current_device(&self) -> Option<&CameraDevice> {
        self.current_device.as_ref()
    }
}
