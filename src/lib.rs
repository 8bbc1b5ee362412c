//! fieldcam - wildlife snapshot publisher
//!
//! Turns a captured camera frame, a GPS fix, and a species topic into one
//! JSON message and delivers it to an MQTT broker with an at-least-once
//! guarantee. The broker session is strictly scoped to a single publish
//! call: connect, publish, disconnect, in that order, with the teardown
//! guaranteed on every outcome.
//!
//! # Quick start
//!
//! ```no_run
//! use fieldcam::config::PublisherConfig;
//! use fieldcam::payload::GeoPoint;
//! use fieldcam::session::{MqttLink, PublishSession};
//!
//! # async fn publish_one(frame: image::RgbImage) -> Result<(), fieldcam::error::PublishError> {
//! let config = PublisherConfig::default();
//! let session = PublishSession::new(
//!     MqttLink::new(&config.mqtt.broker_url),
//!     &config.mqtt.topic_prefix,
//!     config.mqtt.retain,
//!     config.mqtt.policy(),
//! );
//!
//! let fix = GeoPoint { latitude: -22.772663, longitude: -43.6857564 };
//! session.publish("cachorro", &frame, fix).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The wire payload is `{ topic, photo, location, date }` where `photo` is a
//! base64 JPEG and `date` a local `YYYY-MM-DDThh:mm:ss` stamp; the wire topic
//! is always `<topic_prefix>/<topic>`.

pub mod capture;
pub mod config;
pub mod error;
pub mod location;
pub mod observability;
pub mod payload;
pub mod session;
pub mod testing;

pub use config::{ConnectionPolicy, PublisherConfig};
pub use error::{PublishError, PublishResult};
pub use location::{LocationFix, LocationSource, FALLBACK_POSITION};
pub use payload::{GeoPoint, SnapshotPayload};
pub use session::{BrokerLink, MqttLink, PublishSession};
