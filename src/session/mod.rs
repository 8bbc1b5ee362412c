//! Publish session lifecycle: connect, publish, tear down
//!
//! A session owns exactly one broker connection and lives for exactly one
//! publish call. The [`BrokerLink`] trait is the seam between the session
//! logic and the real MQTT transport, so tests can substitute a recording
//! fake without touching process-wide state.

use crate::config::ConnectionPolicy;
use crate::error::PublishError;
use crate::payload::{encode_snapshot, wire_topic, GeoPoint};
use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info, warn};

mod link;

pub use link::MqttLink;

/// Transport-level failures reported by a broker link.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Connection failed")]
    ConnectionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("No connection acknowledgment within {0:?}")]
    ConnectTimeout(std::time::Duration),
    #[error("Publishing failed")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Publish not acknowledged within {0:?}")]
    AckTimeout(std::time::Duration),
    #[error("Disconnect failed")]
    DisconnectFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Capability interface over one broker connection.
///
/// Implementations publish with QoS 1 (at-least-once): `publish` must only
/// return `Ok` once the broker has acknowledged the message.
#[async_trait::async_trait]
pub trait BrokerLink: Send {
    /// Open the connection using the given policy.
    async fn connect(&mut self, policy: &ConnectionPolicy) -> Result<(), LinkError>;

    /// Publish `payload` on `topic` at QoS 1 and wait for the acknowledgment.
    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> Result<(), LinkError>;

    /// Close the connection.
    async fn disconnect(&mut self) -> Result<(), LinkError>;

    /// Whether a connection is currently open.
    fn is_connected(&self) -> bool;
}

/// One-shot publish session: created, used, destroyed.
///
/// `publish` consumes the session, so a link can never be reused across
/// calls and no connection survives past the end of the call.
pub struct PublishSession<L> {
    link: L,
    topic_prefix: String,
    retain: bool,
    policy: ConnectionPolicy,
}

impl<L: BrokerLink> PublishSession<L> {
    pub fn new(link: L, topic_prefix: impl Into<String>, retain: bool, policy: ConnectionPolicy) -> Self {
        Self {
            link,
            topic_prefix: topic_prefix.into(),
            retain,
            policy,
        }
    }

    /// Encode and deliver one snapshot, then tear the connection down.
    ///
    /// Exactly one connection is opened and closed per call, and the
    /// teardown runs on every exit path where a connection was opened. No
    /// retry happens here: one attempt per call, retry policy belongs to the
    /// caller.
    pub async fn publish(
        mut self,
        topic: &str,
        image: &RgbImage,
        location: GeoPoint,
    ) -> Result<(), PublishError> {
        // Encoding failures abort before any connection attempt.
        let stamped_at = chrono::Local::now().naive_local();
        let payload = encode_snapshot(topic, image, location, stamped_at)?;
        let bytes = serde_json::to_vec(&payload)
            .map_err(crate::payload::EncodeError::Serialization)?;
        let full_topic = wire_topic(&self.topic_prefix, topic);

        let connected = if self.link.is_connected() {
            Ok(())
        } else {
            self.link.connect(&self.policy).await
        };

        let outcome = match connected {
            Err(e) => {
                // Publish is skipped entirely when the connection never opened.
                Err(PublishError::Connect(e))
            }
            Ok(()) => {
                debug!(topic = %full_topic, bytes = bytes.len(), "connection open, publishing snapshot");
                self.link
                    .publish(&full_topic, bytes, self.retain)
                    .await
                    .map_err(PublishError::Publish)
            }
        };

        // Teardown is unconditional once a connection is open; a disconnect
        // failure never overrides the publish outcome.
        if self.link.is_connected() {
            if let Err(e) = self.link.disconnect().await {
                warn!(error = %e, "broker disconnect failed after publish");
            }
        }

        if outcome.is_ok() {
            info!(topic = %full_topic, "snapshot published");
        }
        outcome
    }
}
