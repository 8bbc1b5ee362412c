//! Pure payload shaping for snapshot publishing
//!
//! Everything here is deterministic: given the same image, location, and
//! instant, `encode_snapshot` produces a byte-identical envelope. Network
//! concerns live in the session module.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::NaiveDateTime;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JPEG quality used for the wire photo. Lossy and one-way.
pub const JPEG_QUALITY: u8 = 70;

/// Timestamp layout for the `date` field: local time, no UTC offset.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A latitude/longitude pair, serialized as decimal numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// The JSON envelope published on the wire.
///
/// Built fresh per publish, never reused across sessions. `photo` holds the
/// base64 of the JPEG-compressed image; the original pixel buffer is not
/// recoverable from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub topic: String,
    pub photo: String,
    pub location: GeoPoint,
    pub date: String,
}

/// Encoding failures - always local, never network-related.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("snapshot topic cannot be empty")]
    EmptyTopic,
    #[error("frame has no pixels ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("JPEG compression failed")]
    Compression(#[source] image::ImageError),
    #[error("payload serialization failed")]
    Serialization(#[source] serde_json::Error),
}

/// Build the wire envelope from a frame, a fix, and an explicit instant.
///
/// The instant is a parameter rather than a clock read so the function stays
/// pure; callers stamp `chrono::Local::now().naive_local()` at encode time.
pub fn encode_snapshot(
    topic: &str,
    image: &RgbImage,
    location: GeoPoint,
    at: NaiveDateTime,
) -> Result<SnapshotPayload, EncodeError> {
    if topic.is_empty() {
        return Err(EncodeError::EmptyTopic);
    }

    Ok(SnapshotPayload {
        topic: topic.to_string(),
        photo: encode_photo(image)?,
        location,
        date: at.format(DATE_FORMAT).to_string(),
    })
}

/// Compress a frame to JPEG at the fixed quality and base64 the result.
pub fn encode_photo(image: &RgbImage) -> Result<String, EncodeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EncodeError::EmptyFrame {
            width: image.width(),
            height: image.height(),
        });
    }

    let mut jpeg = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut jpeg);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(EncodeError::Compression)?;

    Ok(BASE64.encode(&jpeg))
}

/// Join the configured prefix and the caller topic.
///
/// Pass-through on purpose: slashes in the caller topic are preserved and
/// nothing is escaped, so `wire_topic("animal/photos", "a/b")` publishes
/// under `animal/photos/a/b`.
pub fn wire_topic(prefix: &str, topic: &str) -> String {
    format!("{prefix}/{topic}")
}
