//! Mock implementations for testing
//!
//! Provides a recording [`BrokerLink`] so session behavior can be verified
//! without a broker: which calls happened, in what counts, and with what
//! wire topics and payloads.

use crate::config::ConnectionPolicy;
use crate::session::{BrokerLink, LinkError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// (wire topic, payload bytes, retain flag)
pub type RecordedPublish = (String, Vec<u8>, bool);

#[derive(Debug, Default)]
struct LinkRecords {
    connect_calls: u32,
    disconnect_calls: u32,
    published: Vec<RecordedPublish>,
    connected: bool,
}

/// Shared view into a [`MockLink`]'s call history.
///
/// The session consumes the link, so tests grab a recorder first and inspect
/// it after the call.
#[derive(Debug, Clone)]
pub struct LinkRecorder {
    records: Arc<Mutex<LinkRecords>>,
}

impl LinkRecorder {
    pub async fn connect_calls(&self) -> u32 {
        self.records.lock().await.connect_calls
    }

    pub async fn disconnect_calls(&self) -> u32 {
        self.records.lock().await.disconnect_calls
    }

    pub async fn published(&self) -> Vec<RecordedPublish> {
        self.records.lock().await.published.clone()
    }

    pub async fn still_connected(&self) -> bool {
        self.records.lock().await.connected
    }
}

/// In-memory broker link with injectable failures.
#[derive(Debug, Default)]
pub struct MockLink {
    records: Arc<Mutex<LinkRecords>>,
    fail_connect: bool,
    fail_publish: bool,
    fail_disconnect: bool,
    connected: bool,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_failure() -> Self {
        Self {
            fail_connect: true,
            ..Default::default()
        }
    }

    pub fn with_publish_failure() -> Self {
        Self {
            fail_publish: true,
            ..Default::default()
        }
    }

    pub fn with_disconnect_failure() -> Self {
        Self {
            fail_disconnect: true,
            ..Default::default()
        }
    }

    pub fn recorder(&self) -> LinkRecorder {
        LinkRecorder {
            records: self.records.clone(),
        }
    }
}

#[async_trait]
impl BrokerLink for MockLink {
    async fn connect(&mut self, _policy: &ConnectionPolicy) -> Result<(), LinkError> {
        let mut records = self.records.lock().await;
        records.connect_calls += 1;
        if self.fail_connect {
            return Err(LinkError::ConnectTimeout(std::time::Duration::from_secs(
                10,
            )));
        }
        self.connected = true;
        records.connected = true;
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> Result<(), LinkError> {
        if self.fail_publish {
            return Err(LinkError::PublishFailed("mock publish failure".into()));
        }
        let mut records = self.records.lock().await;
        records.published.push((topic.to_string(), payload, retain));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        let mut records = self.records.lock().await;
        records.disconnect_calls += 1;
        self.connected = false;
        records.connected = false;
        if self.fail_disconnect {
            return Err(LinkError::DisconnectFailed("mock disconnect failure".into()));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
