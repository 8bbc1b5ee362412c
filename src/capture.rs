//! Frame acquisition capability
//!
//! The publish core only ever sees a decoded pixel buffer; where it comes
//! from is behind [`FrameSource`]. A source resolves once per capture with
//! either the frame or a typed error, with no callback or UI-thread model
//! attached.

use async_trait::async_trait;
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Capture failures.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no frame available from {source_name}")]
    NoFrame { source_name: String },
    #[error("failed to read frame from {path}")]
    Read {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
    #[error("failed to decode frame from {path}")]
    Decode {
        path: PathBuf,
        #[source]
        cause: image::ImageError,
    },
}

/// Single-shot supplier of one decoded frame.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<RgbImage, CaptureError>;
}

/// Frame source backed by an image file on disk.
///
/// Decoding runs on the blocking pool; any format the `image` crate knows is
/// accepted, and the frame is normalized to RGB8.
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    async fn capture(&self) -> Result<RgbImage, CaptureError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = std::fs::read(&path).map_err(|cause| CaptureError::Read {
                path: path.clone(),
                cause,
            })?;
            let decoded = image::load_from_memory(&bytes)
                .map_err(|cause| CaptureError::Decode { path, cause })?;
            Ok(decoded.to_rgb8())
        })
        .await
        .unwrap_or_else(|_| {
            Err(CaptureError::NoFrame {
                source_name: "file".to_string(),
            })
        })
    }
}
