// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera enumeration and format detection
//!
//! Discovery shells out to `pw-cli`. The parsers work on captured text so
//! they can be exercised without a running PipeWire daemon.

use super::super::types::{CameraDevice, CameraFormat, CameraLocation, Framerate};
use crate::constants::formats;
use tracing::{debug, info, warn};

/// Enumerate cameras using PipeWire
///
/// Returns `None` when `pipewiresrc` is unavailable. When PipeWire is up but
/// `pw-cli` reports nothing, a single default camera is returned so PipeWire
/// can auto-select.
pub fn enumerate_pipewire_cameras() -> Option<Vec<CameraDevice>> {
    debug!("Attempting to enumerate cameras via PipeWire");

    if !is_pipewire_available() {
        debug!("pipewiresrc not available");
        return None;
    }

    let cameras = run_pw_cli(&["ls", "Node"])
        .map(|stdout| parse_node_list(&stdout))
        .unwrap_or_default();

    if !cameras.is_empty() {
        let cameras = cameras
            .into_iter()
            .map(|mut camera| {
                if let Some(id) = camera.metadata_path.as_deref() {
                    camera.location = query_node_location(id);
                }
                debug!(name = %camera.name, path = %camera.path, location = ?camera.location, "Found video camera");
                camera
            })
            .collect::<Vec<_>>();
        debug!(count = cameras.len(), "Found PipeWire cameras");
        return Some(cameras);
    }

    info!("Using PipeWire auto-selection (default camera)");
    Some(vec![CameraDevice::default_camera()])
}

fn run_pw_cli(args: &[&str]) -> Option<String> {
    let output = std::process::Command::new("pw-cli")
        .args(args)
        .output()
        .ok()?;

    if !output.status.success() {
        debug!(?args, "pw-cli command failed");
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[derive(Default)]
struct NodeEntry {
    id: Option<String>,
    serial: Option<String>,
    name: Option<String>,
    is_video_source: bool,
}

impl NodeEntry {
    fn into_camera(self) -> Option<CameraDevice> {
        if !self.is_video_source {
            return None;
        }
        let id = self.id?;
        let name = self.name?;
        let path = match self.serial {
            Some(serial) => format!("pipewire-serial-{}", serial),
            None => format!("pipewire-{}", id),
        };
        Some(CameraDevice {
            name,
            path,
            metadata_path: Some(id),
            location: None,
        })
    }
}

/// Parse `pw-cli ls Node` output into video source devices
pub fn parse_node_list(stdout: &str) -> Vec<CameraDevice> {
    let mut cameras = Vec::new();
    let mut current = NodeEntry::default();

    for line in stdout.lines() {
        let trimmed = line.trim();

        // "id 76, type PipeWire:Interface:Node/3"
        if trimmed.starts_with("id ") && trimmed.contains("type PipeWire:Interface:Node") {
            cameras.extend(std::mem::take(&mut current).into_camera());
            current.id = trimmed
                .strip_prefix("id ")
                .and_then(|rest| rest.split(',').next())
                .map(|id| id.trim().to_string());
            continue;
        }

        if trimmed.contains("media.class") && trimmed.contains("\"Video/Source\"") {
            current.is_video_source = true;
        } else if trimmed.contains("object.serial") {
            current.serial = extract_quoted_value(trimmed);
        } else if trimmed.contains("node.description") {
            current.name = extract_quoted_value(trimmed);
        }
    }
    cameras.extend(current.into_camera());

    cameras
}

/// Extract quoted value from a property line (e.g., 'property = "value"' -> "value")
fn extract_quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let end = line[start + 1..].find('"')?;
    Some(line[start + 1..start + 1 + end].to_string())
}

/// Query the mounting location of a node
///
/// `pw-cli ls Node` does not include libcamera properties, so this asks
/// `pw-cli info` for `api.libcamera.location`.
fn query_node_location(node_id: &str) -> Option<CameraLocation> {
    let stdout = run_pw_cli(&["info", node_id])?;
    parse_location(&stdout)
}

/// Find `api.libcamera.location` in `pw-cli info` output
pub fn parse_location(stdout: &str) -> Option<CameraLocation> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.contains("api.libcamera.location"))
        .find_map(|line| extract_quoted_value(line).and_then(|v| CameraLocation::from_property(&v)))
}

/// Get supported formats for a PipeWire camera
///
/// `metadata_path` holds the node id. Without it, or when the query fails,
/// a set of common formats is returned.
pub fn get_pipewire_formats(device_path: &str, metadata_path: Option<&str>) -> Vec<CameraFormat> {
    debug!(device_path, metadata_path = ?metadata_path, "Getting PipeWire formats");

    if let Some(node_id) = metadata_path {
        let parsed = run_pw_cli(&["enum-params", node_id, "EnumFormat"])
            .map(|stdout| parse_enum_formats(&stdout))
            .unwrap_or_default();
        if !parsed.is_empty() {
            info!(count = parsed.len(), node_id = %node_id, "Enumerated formats via pw-cli");
            return parsed;
        }
        warn!(node_id = %node_id, "Failed to enumerate formats from node, using fallback");
    } else {
        warn!(
            device_path,
            "No node ID provided for format enumeration, using fallback"
        );
    }

    get_fallback_formats()
}

/// Fallback formats when PipeWire enumeration fails
fn get_fallback_formats() -> Vec<CameraFormat> {
    let resolutions = [(1920, 1080), (1280, 720), (640, 480)];

    resolutions
        .iter()
        .flat_map(|&(width, height)| {
            formats::COMMON_FRAMERATES
                .iter()
                .map(move |&fps| CameraFormat {
                    width,
                    height,
                    framerate: Some(Framerate::from_int(fps)),
                    pixel_format: "MJPG".to_string(),
                })
        })
        .collect()
}

/// One `Object:` block of `pw-cli enum-params` output
#[derive(Default)]
struct FormatGroup {
    width: Option<u32>,
    height: Option<u32>,
    framerates: Vec<Framerate>,
    subtype: Option<String>,
    video_format: Option<String>,
}

impl FormatGroup {
    fn flush_into(&mut self, out: &mut Vec<CameraFormat>) {
        let group = std::mem::take(self);
        let (Some(width), Some(height), Some(subtype)) = (group.width, group.height, group.subtype)
        else {
            return;
        };

        // Raw formats are named by VideoFormat, compressed ones by subtype
        let pixel_format = if subtype == "raw" {
            group.video_format.unwrap_or_else(|| "YUY2".to_string())
        } else {
            subtype.to_uppercase()
        };

        // libcamera nodes list no framerates; let it negotiate
        if group.framerates.is_empty() {
            out.push(CameraFormat {
                width,
                height,
                framerate: None,
                pixel_format,
            });
            return;
        }

        for fps in group.framerates {
            out.push(CameraFormat {
                width,
                height,
                framerate: Some(fps),
                pixel_format: pixel_format.clone(),
            });
        }
    }
}

/// Parse `pw-cli enum-params <id> EnumFormat` output
pub fn parse_enum_formats(stdout: &str) -> Vec<CameraFormat> {
    let mut formats = Vec::new();
    let mut group = FormatGroup::default();

    for line in stdout.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("Object:") {
            group.flush_into(&mut formats);
            continue;
        }

        // "Id 131074   (Spa:Enum:MediaSubtype:mjpg)"
        if trimmed.contains("Spa:Enum:MediaSubtype:")
            && let Some(start) = trimmed.rfind(':')
        {
            group.subtype = Some(trimmed[start + 1..].trim_end_matches(')').to_lowercase());
        }

        // "Id 4   (Spa:Enum:VideoFormat:YUY2)"
        if trimmed.contains("Spa:Enum:VideoFormat:")
            && let Some(start) = trimmed.rfind(':')
        {
            group.video_format = Some(trimmed[start + 1..].trim_end_matches(')').to_uppercase());
        }

        if let Some(res) = trimmed.strip_prefix("Rectangle ")
            && let Some((w, h)) = res.split_once('x')
        {
            group.width = w.trim().parse().ok();
            group.height = h.trim().parse().ok();
        }

        if let Some(frac) = trimmed.strip_prefix("Fraction ")
            && let Some((num, denom)) = frac.split_once('/')
            && let (Ok(num), Ok(denom)) = (num.trim().parse::<u32>(), denom.trim().parse::<u32>())
            && denom > 0
        {
            let fps = Framerate::new(num, denom);
            // 60000/1001 and 60/1 count as the same rate
            if !group.framerates.iter().any(|f| f.as_int() == fps.as_int()) {
                group.framerates.push(fps);
            }
        }
    }
    group.flush_into(&mut formats);

    formats
}

/// Test if PipeWire is available and working
pub fn is_pipewire_available() -> bool {
    if gstreamer::init().is_err() {
        return false;
    }

    gstreamer::ElementFactory::find("pipewiresrc").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE_LIST: &str = r#"
	id 31, type PipeWire:Interface:Node/3
 		object.serial = "31"
 		node.description = "Dummy-Driver"
 		media.class = "Audio/Sink"
	id 76, type PipeWire:Interface:Node/3
 		object.serial = "2146"
 		node.description = "Integrated Camera (V4L2)"
 		media.class = "Video/Source"
	id 80, type PipeWire:Interface:Node/3
 		node.description = "imx258"
 		media.class = "Video/Source"
"#;

    #[test]
    fn test_parse_node_list_keeps_video_sources() {
        let cameras = parse_node_list(NODE_LIST);
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].name, "Integrated Camera (V4L2)");
        assert_eq!(cameras[0].path, "pipewire-serial-2146");
        assert_eq!(cameras[0].metadata_path.as_deref(), Some("76"));
        // No serial falls back to the node id
        assert_eq!(cameras[1].path, "pipewire-80");
    }

    #[test]
    fn test_parse_location() {
        let info = "  * \t\tapi.libcamera.location = \"front\"\n  * \t\tapi.libcamera.rotation = \"270\"";
        assert_eq!(parse_location(info), Some(CameraLocation::Front));
        assert_eq!(parse_location("node.name = \"x\""), None);
    }

    #[test]
    fn test_parse_enum_formats() {
        let output = r#"
  Object: size 128, type Spa:Pod:Object:Param:Format (262147), id Spa:Enum:ParamId:EnumFormat (3)
    Prop: key Spa:Pod:Object:Param:Format:mediaSubtype (2), flags 00000000
      Id 131074   (Spa:Enum:MediaSubtype:mjpg)
    Prop: key Spa:Pod:Object:Param:Format:Video:size (131075), flags 00000000
      Rectangle 1280x720
    Prop: key Spa:Pod:Object:Param:Format:Video:framerate (131076), flags 00000000
      Enum Fraction {
        Fraction 30/1
        Fraction 30/1
        Fraction 15/1
      }
  Object: size 128, type Spa:Pod:Object:Param:Format (262147), id Spa:Enum:ParamId:EnumFormat (3)
      Id 1   (Spa:Enum:MediaSubtype:raw)
      Id 4   (Spa:Enum:VideoFormat:YUY2)
      Rectangle 640x480
"#;
        let formats = parse_enum_formats(output);
        assert_eq!(formats.len(), 3);
        assert_eq!(formats[0].pixel_format, "MJPG");
        assert_eq!(formats[0].framerate, Some(Framerate::from_int(30)));
        assert_eq!(formats[1].framerate, Some(Framerate::from_int(15)));
        assert_eq!(formats[2].pixel_format, "YUY2");
        assert_eq!(formats[2].framerate, None);
    }

    #[test]
    fn test_fallback_formats_are_mjpeg() {
        let fallback = get_fallback_formats();
        assert!(!fallback.is_empty());
        assert!(fallback.iter().all(|f| f.is_mjpeg()));
    }
}
