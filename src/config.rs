//! Node configuration.
//!
//! All tunable parameters for a doorlink node. Both nodes share the struct;
//! the per-node constructors bake in the role differences (dwell duration,
//! topics, which intervals matter). Defaults are compiled in; a stored
//! override blob in the key-value store takes precedence when present, so
//! thresholds and credentials can be changed without reflashing.

use serde::{Deserialize, Serialize};

/// Fixed-capacity credential/topic string.
pub type CfgString = heapless::String<96>;

fn cfg(s: &str) -> CfgString {
    // Compiled-in defaults are all well under capacity.
    CfgString::try_from(s).unwrap_or_default()
}

/// Core node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Detection ---
    /// Distance below which a sample counts as "in range" (cm).
    pub distance_threshold_cm: f32,
    /// Continuous in-range time required before presence is confirmed (ms).
    pub dwell_ms: u32,

    // --- Actuation ---
    /// LED toggle interval while the alarm condition holds (door node, ms).
    pub blink_interval_ms: u32,

    // --- Remote flag sync ---
    /// Minimum interval between unchanged-value pushes to the remote
    /// document (AC node, ms). A value *change* always publishes immediately.
    pub flag_min_publish_ms: u32,

    // --- Telemetry ---
    /// Environment sample cadence (door node, ms).
    pub env_telemetry_ms: u32,

    // --- WiFi ---
    pub wifi_ssid: CfgString,
    pub wifi_password: CfgString,

    // --- MQTT (Adafruit IO style broker) ---
    pub mqtt_host: CfgString,
    pub mqtt_port: u16,
    pub mqtt_user: CfgString,
    pub mqtt_key: CfgString,
    /// Topic for the `"1"`/`"0"` presence edge payloads.
    pub presence_topic: CfgString,
    /// Topic for the temperature/humidity JSON (door node).
    pub env_topic: CfgString,

    // --- Remote status document (GitHub contents API) ---
    pub repo_owner: CfgString,
    pub repo_name: CfgString,
    pub file_path: CfgString,
    pub github_token: CfgString,

    // --- Notification sink (callmebot-style templated GET) ---
    pub notify_phone: CfgString,
    pub notify_apikey: CfgString,
    /// Message sent once per alarm activation.
    pub notify_message: CfgString,
}

impl NodeConfig {
    /// AC node: short 1 s dwell, LED driven directly, flag publisher.
    pub fn ac_node() -> Self {
        Self {
            distance_threshold_cm: 10.0,
            dwell_ms: 1_000,
            blink_interval_ms: 1_000,
            flag_min_publish_ms: 5_000,
            env_telemetry_ms: 30_000,
            wifi_ssid: cfg("NPITI-IoT"),
            wifi_password: cfg("NPITI-IoT"),
            mqtt_host: cfg("io.adafruit.com"),
            mqtt_port: 1883,
            mqtt_user: cfg("Pedrin"),
            mqtt_key: cfg(""),
            presence_topic: cfg("Pedrin/feeds/condicionador"),
            env_topic: cfg("Pedrin/feeds/ambiente"),
            repo_owner: cfg("RayssaBeatriz"),
            repo_name: cfg("AIOUT"),
            file_path: cfg("STATUS-SENSOR.JSON"),
            github_token: cfg(""),
            notify_phone: cfg(""),
            notify_apikey: cfg(""),
            notify_message: cfg(""),
        }
    }

    /// Door node: long 6 s dwell, remote-flag gated blink/buzz + notify.
    pub fn door_node() -> Self {
        Self {
            dwell_ms: 6_000,
            presence_topic: cfg("Pedrin/feeds/ultrassom_status"),
            notify_message: cfg(
                "A porta esta aberta enquanto o ar-condicionado esta ligado. Por favor, feche-a.",
            ),
            ..Self::ac_node()
        }
    }

    /// GitHub contents API URL for the shared status document.
    pub fn document_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/contents/{}",
            self.repo_owner, self.repo_name, self.file_path
        )
    }
}

/// Range-check a configuration before it is persisted or applied.
///
/// Rejects invalid values rather than silently clamping them, so a corrupt
/// override blob cannot disable the dwell debounce or flood the remote store.
pub fn validate_config(cfg: &NodeConfig) -> crate::error::Result<()> {
    use crate::error::Error;

    if !(1.0..=400.0).contains(&cfg.distance_threshold_cm) {
        return Err(Error::Config("distance_threshold_cm must be 1.0–400.0"));
    }
    if !(100..=60_000).contains(&cfg.dwell_ms) {
        return Err(Error::Config("dwell_ms must be 100–60000"));
    }
    if !(100..=10_000).contains(&cfg.blink_interval_ms) {
        return Err(Error::Config("blink_interval_ms must be 100–10000"));
    }
    if !(1_000..=600_000).contains(&cfg.flag_min_publish_ms) {
        return Err(Error::Config("flag_min_publish_ms must be 1000–600000"));
    }
    if !(5_000..=3_600_000).contains(&cfg.env_telemetry_ms) {
        return Err(Error::Config("env_telemetry_ms must be 5000–3600000"));
    }
    Ok(())
}
