// SPDX-License-Identifier: MPL-2.0

//! PipeWire GStreamer pipeline for camera capture

use super::super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::{VideoFormat, VideoInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// MJPEG decoders in preference order
const MJPEG_DECODERS: &[&str] = &["jpegdec", "avdec_mjpeg"];

/// PipeWire camera pipeline
///
/// Decodes to RGBA and hands every frame to the session's sinks.
pub struct PipeWirePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
}

impl PipeWirePipeline {
    /// Create and start a pipeline for `device` in `format`
    pub fn new(
        device: &CameraDevice,
        format: &CameraFormat,
        sinks: Vec<FrameSink>,
    ) -> BackendResult<Self> {
        info!(
            device = %device.name,
            format = %format,
            "Creating PipeWire pipeline"
        );

        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let decoder = if format.is_mjpeg() {
            Some(find_mjpeg_decoder().ok_or_else(|| {
                BackendError::NotAvailable("No MJPEG decoder available".to_string())
            })?)
        } else {
            None
        };

        let description = build_pipeline_string(&device.path, format, decoder);
        info!(pipeline = %description, "Launching pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast to pipeline".to_string())
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast appsink".to_string())
            })?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let frame_counter = Arc::new(AtomicU64::new(0));
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);
                    let frame = pull_frame(appsink, frame_num)?;
                    let frame = Arc::new(frame);

                    for sink in &sinks {
                        sink(Arc::clone(&frame));
                    }

                    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        debug!(
                            frame = frame_num,
                            width = frame.width,
                            height = frame.height,
                            latency_us = frame.captured_at.elapsed().as_micros(),
                            "Frame delivered"
                        );
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            check_bus_for_errors(&pipeline);
            let _ = pipeline.set_state(gstreamer::State::Null);
            BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
        })?;

        let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(?result, ?state, ?pending, "Pipeline state");
        if result.is_err() {
            check_bus_for_errors(&pipeline);
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::InitializationFailed(format!(
                "Pipeline failed to start (state: {:?})",
                state
            )));
        }
        if state != gstreamer::State::Playing {
            // Devices can take a while; frames arrive once PLAYING is reached
            warn!(?state, ?pending, "Pipeline is not in PLAYING state yet");
        }

        info!("PipeWire camera initialization complete");
        Ok(Self { pipeline, appsink })
    }

    /// Stop the pipeline and release the camera
    pub fn stop(self) -> BackendResult<()> {
        info!("Stopping PipeWire pipeline");

        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(state = ?state, "PipeWire pipeline stopped"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }

        Ok(())
    }
}

impl Drop for PipeWirePipeline {
    fn drop(&mut self) {
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

/// Pull the next sample and copy it into a [`CameraFrame`]
fn pull_frame(appsink: &AppSink, frame_num: u64) -> Result<CameraFrame, gstreamer::FlowError> {
    let captured_at = Instant::now();
    let should_log = frame_num % timing::FRAME_LOG_INTERVAL == 0;

    let sample = appsink.pull_sample().map_err(|e| {
        if should_log {
            error!(frame = frame_num, error = ?e, "Failed to pull sample");
        }
        gstreamer::FlowError::Eos
    })?;

    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
        if should_log {
            warn!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
        }
        return Err(gstreamer::FlowError::Error);
    }

    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
    let video_info = VideoInfo::from_caps(caps).map_err(|e| {
        if should_log {
            error!(frame = frame_num, error = ?e, "Failed to get video info");
        }
        gstreamer::FlowError::Error
    })?;

    // The appsink caps pin RGBA; anything else is a negotiation bug
    if video_info.format() != VideoFormat::Rgba {
        if should_log {
            error!(frame = frame_num, format = ?video_info.format(), "Unexpected frame format");
        }
        return Err(gstreamer::FlowError::NotNegotiated);
    }

    let map = buffer
        .map_readable()
        .map_err(|_| gstreamer::FlowError::Error)?;

    Ok(CameraFrame {
        width: video_info.width(),
        height: video_info.height(),
        data: Arc::from(map.as_slice()),
        stride: video_info.stride()[0] as u32,
        captured_at,
    })
}

/// First MJPEG decoder with an installed factory
fn find_mjpeg_decoder() -> Option<&'static str> {
    MJPEG_DECODERS
        .iter()
        .copied()
        .find(|name| gstreamer::ElementFactory::find(name).is_some())
}

/// Translate a device path into pipewiresrc properties
///
/// Empty path lets PipeWire pick the default camera.
pub fn determine_pipewire_path(device_path: &str) -> String {
    if device_path.is_empty() {
        String::new()
    } else if let Some(serial) = device_path.strip_prefix("pipewire-serial-") {
        format!("target-object={} ", serial)
    } else if let Some(node_id) = device_path.strip_prefix("pipewire-") {
        format!("target-object={} ", node_id)
    } else if device_path.starts_with("/dev/video") {
        format!("path=v4l2:{} ", device_path)
    } else {
        format!("path={} ", device_path)
    }
}

/// Build the gst-launch description for a session
///
/// `decoder` is required for MJPEG formats. Everything ends in RGBA.
pub fn build_pipeline_string(
    device_path: &str,
    format: &CameraFormat,
    decoder: Option<&str>,
) -> String {
    let source = format!(
        "pipewiresrc {}do-timestamp=true",
        determine_pipewire_path(device_path)
    );
    let mut caps = format!("width=(int){},height=(int){}", format.width, format.height);
    if let Some(fps) = format.framerate {
        caps.push_str(&format!(",framerate=(fraction){}", fps.as_gst_fraction()));
    }
    let output = format!(
        "videoconvert ! video/x-raw,format={} ! appsink name=sink",
        pipeline::OUTPUT_FORMAT
    );

    match (format.is_mjpeg(), decoder) {
        (true, Some(decoder)) => format!(
            "{} ! image/jpeg,{} ! jpegparse ! {} ! {}",
            source, caps, decoder, output
        ),
        (true, None) => format!("{} ! image/jpeg,{} ! decodebin ! {}", source, caps, output),
        (false, _) => {
            let raw_format = match format.pixel_format.as_str() {
                "YUYV" => "YUY2",
                other => other,
            };
            format!(
                "{} ! video/x-raw,format={},{} ! {}",
                source, raw_format, caps, output
            )
        }
    }
}

/// Log the first error or warning posted on the pipeline bus
fn check_bus_for_errors(pipeline: &gstreamer::Pipeline) {
    if let Some(bus) = pipeline.bus()
        && let Some(msg) = bus.timed_pop_filtered(
            gstreamer::ClockTime::from_mseconds(100),
            &[
                gstreamer::MessageType::Error,
                gstreamer::MessageType::Warning,
            ],
        )
    {
        match msg.view() {
            gstreamer::MessageView::Error(err) => {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "GStreamer error during pipeline start"
                );
            }
            gstreamer::MessageView::Warning(warn_msg) => {
                warn!(
                    warning = %warn_msg.error(),
                    debug = ?warn_msg.debug(),
                    "GStreamer warning during pipeline start"
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(pixel_format: &str, fps: Option<u32>) -> CameraFormat {
        CameraFormat {
            width: 1280,
            height: 720,
            framerate: fps.map(Framerate::from_int),
            pixel_format: pixel_format.to_string(),
        }
    }

    #[test]
    fn test_pipewire_path_mapping() {
        assert_eq!(determine_pipewire_path(""), "");
        assert_eq!(
            determine_pipewire_path("pipewire-serial-2146"),
            "target-object=2146 "
        );
        assert_eq!(determine_pipewire_path("pipewire-76"), "target-object=76 ");
        assert_eq!(
            determine_pipewire_path("/dev/video0"),
            "path=v4l2:/dev/video0 "
        );
    }

    #[test]
    fn test_mjpeg_pipeline_decodes_to_rgba() {
        let desc = build_pipeline_string("pipewire-76", &format("MJPG", Some(30)), Some("jpegdec"));
        assert!(desc.starts_with("pipewiresrc target-object=76 do-timestamp=true"));
        assert!(desc.contains("image/jpeg,width=(int)1280,height=(int)720,framerate=(fraction)30/1"));
        assert!(desc.contains("jpegdec"));
        assert!(desc.ends_with("video/x-raw,format=RGBA ! appsink name=sink"));
    }

    #[test]
    fn test_raw_pipeline_maps_yuyv() {
        let desc = build_pipeline_string("", &format("YUYV", None), None);
        assert!(desc.contains("video/x-raw,format=YUY2,width=(int)1280,height=(int)720 !"));
        assert!(!desc.contains("framerate"));
    }
}
