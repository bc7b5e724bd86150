//! MQTT adapter (Adafruit-IO style broker).
//!
//! Implements [`PubSubPort`]. Connection maintenance is non-blocking: one
//! `ensure_connected` call per loop iteration makes at most one reconnect
//! attempt, paced by [`ReconnectBackoff`], so detection keeps running while
//! the broker is away.
//!
//! ## Backoff policy
//!
//! The first attempt after a loss fires immediately. Subsequent attempts
//! wait 5 s; after 5 consecutive failures the interval stretches to 30 s
//! until an attempt succeeds.
//!
//! ## cfg gating
//!
//! - **`espidf`**: `EspMqttClient` with an event callback (runs on the
//!   client's internal task); connectivity state flows back through a
//!   shared atomic.
//! - **all other targets**: an in-memory stub for host-side tests.

use log::{info, warn};

use crate::app::ports::PubSubPort;
use crate::config::NodeConfig;
use crate::error::CommsError;

const RETRY_INTERVAL_MS: u64 = 5_000;
const COOLDOWN_INTERVAL_MS: u64 = 30_000;
const COOLDOWN_AFTER_FAILURES: u32 = 5;

// ───────────────────────────────────────────────────────────────
// Backoff
// ───────────────────────────────────────────────────────────────

/// Paces reconnect attempts. Pure state machine, no clock of its own.
#[derive(Debug, Default)]
pub struct ReconnectBackoff {
    consecutive_failures: u32,
    last_attempt_ms: Option<u64>,
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay before the next attempt, given the failure history.
    fn current_delay_ms(&self) -> u64 {
        match self.consecutive_failures {
            0 => 0,
            n if n < COOLDOWN_AFTER_FAILURES => RETRY_INTERVAL_MS,
            _ => COOLDOWN_INTERVAL_MS,
        }
    }

    /// Whether an attempt may fire at `now_ms`.
    pub fn attempt_due(&self, now_ms: u64) -> bool {
        match self.last_attempt_ms {
            None => true,
            Some(at) => now_ms.saturating_sub(at) >= self.current_delay_ms(),
        }
    }

    /// Record an attempt that has not (yet) produced a live session.
    pub fn record_attempt(&mut self, now_ms: u64) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_attempt_ms = Some(now_ms);
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.last_attempt_ms = None;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    broker_url: String,
    client_id: String,
    username: String,
    password: String,
    backoff: ReconnectBackoff,
    #[cfg(feature = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    #[cfg(feature = "espidf")]
    link_up: std::sync::Arc<core::sync::atomic::AtomicBool>,
    #[cfg(not(feature = "espidf"))]
    sim_connected: bool,
}

impl MqttAdapter {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            broker_url: format!("mqtt://{}:{}", config.mqtt_host, config.mqtt_port),
            client_id: make_client_id(),
            username: config.mqtt_user.to_string(),
            password: config.mqtt_key.to_string(),
            backoff: ReconnectBackoff::new(),
            #[cfg(feature = "espidf")]
            client: None,
            #[cfg(feature = "espidf")]
            link_up: std::sync::Arc::new(core::sync::atomic::AtomicBool::new(false)),
            #[cfg(not(feature = "espidf"))]
            sim_connected: false,
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(feature = "espidf")]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        use core::sync::atomic::Ordering;
        use esp_idf_svc::mqtt::client::{
            EspMqttClient, EspMqttEvent, EventPayload, MqttClientConfiguration,
        };

        let conf = MqttClientConfiguration {
            client_id: Some(&self.client_id),
            username: Some(&self.username),
            password: Some(&self.password),
            ..Default::default()
        };
        let link_up = self.link_up.clone();
        let client = EspMqttClient::new_cb(&self.broker_url, &conf, move |event: EspMqttEvent| {
            match event.payload() {
                EventPayload::Connected(_) => link_up.store(true, Ordering::Relaxed),
                EventPayload::Disconnected => link_up.store(false, Ordering::Relaxed),
                _ => {}
            }
        })
        .map_err(|_| CommsError::BrokerConnectFailed)?;
        self.client = Some(client);
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn platform_is_connected(&self) -> bool {
        use core::sync::atomic::Ordering;
        self.client.is_some() && self.link_up.load(Ordering::Relaxed)
    }

    #[cfg(feature = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        use esp_idf_svc::mqtt::client::QoS;
        let client = self.client.as_mut().ok_or(CommsError::PublishFailed)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| CommsError::PublishFailed)
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        self.sim_connected = true;
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_connected
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_publish(&mut self, _topic: &str, _payload: &[u8]) -> Result<(), CommsError> {
        if !self.sim_connected {
            return Err(CommsError::PublishFailed);
        }
        Ok(())
    }
}

/// Client id with a random suffix so two nodes never collide at the broker.
fn make_client_id() -> String {
    #[cfg(feature = "espidf")]
    let nonce: u32 = unsafe { esp_idf_sys::esp_random() };
    #[cfg(not(feature = "espidf"))]
    let nonce: u32 = 0x6F4B_2A11;
    format!("ESP32-Client-{nonce:08x}")
}

impl PubSubPort for MqttAdapter {
    fn ensure_connected(&mut self, now_ms: u64) -> bool {
        if self.platform_is_connected() {
            self.backoff.record_success();
            return true;
        }
        if !self.backoff.attempt_due(now_ms) {
            return false;
        }
        info!(
            "MQTT: connecting to {} as {} (failures {})",
            self.broker_url,
            self.client_id,
            self.backoff.consecutive_failures()
        );
        match self.platform_connect() {
            Ok(()) => {
                // The CONNACK may still be in flight; the event callback
                // flips the flag once the session is up.
                self.backoff.record_attempt(now_ms);
                self.platform_is_connected()
            }
            Err(e) => {
                warn!("MQTT: connect failed: {e}");
                self.backoff.record_attempt(now_ms);
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.platform_is_connected() {
            return Err(CommsError::PublishFailed);
        }
        self.platform_publish(topic, payload)
    }
}
