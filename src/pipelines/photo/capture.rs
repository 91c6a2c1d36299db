// SPDX-License-Identifier: MPL-2.0

//! Photo capture request
//!
//! Names the output file and hands the request to the capture use-case.

use crate::constants::capture;
use crate::session::{CaptureExecutor, ImageCapture, OnImageSavedCallback, OutputFileOptions};
use crate::sound::ShutterSound;
use chrono::{DateTime, Local};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::info;

static LAST_CAPTURE_MILLIS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current local time, nudged forward so successive calls never share a millisecond
pub fn next_capture_time() -> DateTime<Local> {
    let now = Local::now();
    let now_ms = now.timestamp_millis();
    let mut last = LAST_CAPTURE_MILLIS.load(Ordering::Acquire);

    loop {
        let candidate = if now_ms > last { now_ms } else { last + 1 };
        match LAST_CAPTURE_MILLIS.compare_exchange_weak(
            last,
            candidate,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) if candidate == now_ms => return now,
            Ok(_) => {
                return DateTime::from_timestamp_millis(candidate)
                    .map(|utc| utc.with_timezone(&Local))
                    .unwrap_or(now);
            }
            Err(actual) => last = actual,
        }
    }
}

/// `<yyyy-MM-dd-HH-mm-ss-SSS>.jpg`
pub fn photo_filename(time: &DateTime<Local>) -> String {
    format!("{}.{}", time.format(capture::FILENAME_FORMAT), capture::EXTENSION)
}

/// Take a photo into `output_dir`
///
/// Plays the shutter sound first, when given. The result arrives through
/// `callback` on the executor's worker thread.
pub fn take_photo(
    image_capture: &ImageCapture,
    output_dir: &Path,
    executor: &CaptureExecutor,
    shutter: Option<&ShutterSound>,
    callback: Box<dyn OnImageSavedCallback>,
) {
    if let Some(shutter) = shutter {
        shutter.play();
    }

    let path = output_dir.join(photo_filename(&next_capture_time()));
    info!(path = %path.display(), "Capture requested");
    image_capture.take_picture(OutputFileOptions::new(path), executor, callback);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filename_pattern() {
        let time = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .unwrap();
        assert_eq!(photo_filename(&time), "2024-03-09-07-05-01-000.jpg");
    }

    #[test]
    fn test_capture_times_strictly_increase() {
        let mut previous = next_capture_time();
        for _ in 0..50 {
            let next = next_capture_time();
            assert!(next.timestamp_millis() > previous.timestamp_millis());
            assert_ne!(photo_filename(&next), photo_filename(&previous));
            previous = next;
        }
    }
}
