//! Real MQTT broker link over rumqttc
//!
//! Speaks MQTT 3.1.1. The link drives the rumqttc event loop inline rather
//! than in a background task: connect blocks until the broker's ConnAck,
//! publish blocks until the QoS 1 PubAck, so the session's at-least-once
//! contract holds without any task left running after the call returns.

use super::{BrokerLink, LinkError};
use crate::config::ConnectionPolicy;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Cap on the teardown drain; disconnect is best-effort.
const DISCONNECT_DRAIN: Duration = Duration::from_secs(3);

struct ActiveLink {
    client: AsyncClient,
    event_loop: EventLoop,
}

/// A single-use connection to one MQTT broker.
pub struct MqttLink {
    broker_url: String,
    client_id: String,
    ack_timeout: Duration,
    active: Option<ActiveLink>,
}

impl MqttLink {
    /// Create a closed link for the given broker with a fresh client id.
    pub fn new(broker_url: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            client_id: generate_client_id(),
            ack_timeout: Duration::from_secs(10),
            active: None,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn options(&self, policy: &ConnectionPolicy) -> Result<MqttOptions, LinkError> {
        let (host, port, tls) = broker_endpoint(&self.broker_url)?;
        let mut options = MqttOptions::new(&self.client_id, host, port);
        options.set_clean_session(policy.clean_session);
        options.set_keep_alive(policy.keep_alive);
        if tls {
            options.set_transport(rumqttc::Transport::tls_with_default_config());
        }
        Ok(options)
    }
}

#[async_trait::async_trait]
impl BrokerLink for MqttLink {
    async fn connect(&mut self, policy: &ConnectionPolicy) -> Result<(), LinkError> {
        let options = self.options(policy)?;
        let (client, mut event_loop) = AsyncClient::new(options, 10);

        // Success means the broker's ConnAck, not just a live socket.
        let handshake = tokio::time::timeout(policy.connect_timeout, async {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        if ack.code == ConnectReturnCode::Success {
                            return Ok(());
                        }
                        return Err(LinkError::ConnectionFailed(
                            format!("broker refused connection: {:?}", ack.code).into(),
                        ));
                    }
                    Ok(_) => continue,
                    Err(e) => return Err(LinkError::ConnectionFailed(Box::new(e))),
                }
            }
        })
        .await;

        match handshake {
            Ok(Ok(())) => {
                self.ack_timeout = policy.connect_timeout;
                self.active = Some(ActiveLink { client, event_loop });
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(LinkError::ConnectTimeout(policy.connect_timeout)),
        }
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> Result<(), LinkError> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| LinkError::PublishFailed("link is not connected".into()))?;

        active
            .client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(|e| LinkError::PublishFailed(Box::new(e)))?;

        // QoS 1: the publish only counts once the broker acknowledges it.
        let acked = tokio::time::timeout(self.ack_timeout, async {
            loop {
                match active.event_loop.poll().await {
                    Ok(Event::Incoming(Packet::PubAck(_))) => return Ok(()),
                    Ok(_) => continue,
                    Err(e) => return Err(LinkError::PublishFailed(Box::new(e))),
                }
            }
        })
        .await;

        match acked {
            Ok(result) => result,
            Err(_) => Err(LinkError::AckTimeout(self.ack_timeout)),
        }
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };

        active
            .client
            .disconnect()
            .await
            .map_err(|e| LinkError::DisconnectFailed(Box::new(e)))?;

        // Drain until the outgoing DISCONNECT leaves or the socket closes;
        // whatever happens after that point is no longer our problem.
        let _ = tokio::time::timeout(DISCONNECT_DRAIN, async {
            loop {
                match active.event_loop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => continue,
                }
            }
        })
        .await;

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.active.is_some()
    }
}

/// Auto-generated client identifier, unique per link.
fn generate_client_id() -> String {
    format!("fieldcam-{}", Uuid::new_v4().simple())
}

/// Resolve a broker URL to host, port, and TLS flag.
fn broker_endpoint(broker_url: &str) -> Result<(String, u16, bool), LinkError> {
    let url = Url::parse(broker_url)
        .map_err(|_| LinkError::InvalidBrokerUrl(broker_url.to_string()))?;

    let tls = matches!(url.scheme(), "mqtts" | "ssl");
    if !tls && !matches!(url.scheme(), "tcp" | "mqtt") {
        return Err(LinkError::InvalidBrokerUrl(broker_url.to_string()));
    }

    let host = url
        .host_str()
        .ok_or_else(|| LinkError::InvalidBrokerUrl(broker_url.to_string()))?
        .to_string();
    let port = url.port().unwrap_or(if tls { 8883 } else { 1883 });

    Ok((host, port, tls))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_endpoint_tcp_default_port() {
        let (host, port, tls) = broker_endpoint("tcp://broker.hivemq.com:1883").unwrap();
        assert_eq!(host, "broker.hivemq.com");
        assert_eq!(port, 1883);
        assert!(!tls);

        let (_, port, _) = broker_endpoint("mqtt://localhost").unwrap();
        assert_eq!(port, 1883);
    }

    #[test]
    fn test_broker_endpoint_tls_schemes() {
        let (_, port, tls) = broker_endpoint("mqtts://broker.example.com").unwrap();
        assert_eq!(port, 8883);
        assert!(tls);

        let (_, port, tls) = broker_endpoint("ssl://broker.example.com:9993").unwrap();
        assert_eq!(port, 9993);
        assert!(tls);
    }

    #[test]
    fn test_broker_endpoint_rejects_garbage() {
        assert!(matches!(
            broker_endpoint("not a url"),
            Err(LinkError::InvalidBrokerUrl(_))
        ));
        assert!(matches!(
            broker_endpoint("http://broker.example.com"),
            Err(LinkError::InvalidBrokerUrl(_))
        ));
    }

    #[test]
    fn test_client_ids_are_unique() {
        let a = MqttLink::new("tcp://localhost:1883");
        let b = MqttLink::new("tcp://localhost:1883");
        assert_ne!(a.client_id(), b.client_id());
        assert!(a.client_id().starts_with("fieldcam-"));
    }

    #[test]
    fn test_new_link_is_not_connected() {
        let link = MqttLink::new("tcp://localhost:1883");
        assert!(!link.is_connected());
    }

    #[test]
    fn test_options_honor_policy() {
        let link = MqttLink::new("tcp://localhost:1883");
        let policy = ConnectionPolicy {
            clean_session: true,
            connect_timeout: Duration::from_secs(10),
            keep_alive: Duration::from_secs(20),
        };
        let options = link.options(&policy).unwrap();
        assert_eq!(options.keep_alive(), Duration::from_secs(20));
        assert!(options.clean_session());
    }

    #[test]
    fn test_options_invalid_url() {
        let link = MqttLink::new("::::");
        assert!(link.options(&ConnectionPolicy::default()).is_err());
    }
}
