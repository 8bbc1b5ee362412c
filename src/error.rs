//! Error taxonomy for snapshot publishing
//!
//! Every failure surfaces to the immediate caller typed by the phase that
//! produced it. The only exception is disconnect failure, which is
//! best-effort cleanup noise: logged by the session, never the primary
//! result.

use crate::payload::EncodeError;
use crate::session::LinkError;
use thiserror::Error;

/// Failure of a single publish call, identifying the phase that failed.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Image compression or payload serialization failed. Always local;
    /// no connection was attempted.
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] EncodeError),

    /// The broker session could not be established. Publish was skipped.
    #[error("broker connection failed: {0}")]
    Connect(#[source] LinkError),

    /// The broker rejected or never acknowledged the message after a
    /// successful connect. With QoS 1 this means "delivery unknown", not
    /// "delivery failed".
    #[error("snapshot publish failed: {0}")]
    Publish(#[source] LinkError),
}

impl PublishError {
    /// Name of the failed phase, for logs and operator-facing output.
    pub fn phase(&self) -> &'static str {
        match self {
            PublishError::Encode(_) => "encode",
            PublishError::Connect(_) => "connect",
            PublishError::Publish(_) => "publish",
        }
    }
}

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;
