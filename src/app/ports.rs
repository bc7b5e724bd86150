//! Port traits — the hexagonal boundary between domain logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ node service (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, network clients, storage) implement
//! these traits. The node services consume them via generics, so the domain
//! core never touches hardware directly.
//!
//! Ranging and HTTP implementations are **synchronous**: a call blocks the
//! whole device until the echo times out or the response arrives. That is
//! the system's concurrency contract — the single cooperative loop relies on
//! the underlying primitives' own timeouts to bound the stall. An async
//! variant can be substituted behind the same traits without touching the
//! state machine.

use crate::config::NodeConfig;
use crate::error::{CommsError, StorageError};

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapters: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Ultrasonic ranging. One call triggers one ranging cycle.
pub trait RangingPort {
    /// Measure distance in centimetres. Returns `0.0` (or a degenerate
    /// value `<= 0`) when no echo arrived within the timeout — callers must
    /// treat that as "no detection", never as "very close". No retries, no
    /// smoothing; a miss is reported immediately.
    fn distance_cm(&mut self) -> f32;
}

/// DHT22-style environment sensor. `NaN` means the read failed this cycle;
/// the caller logs and skips, no same-cycle retry.
pub trait EnvSensorPort {
    fn read_temperature_c(&mut self) -> f32;
    fn read_humidity_pct(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: LED and buzzer levels.
pub trait ActuatorPort {
    /// Drive the indicator LED.
    fn set_led(&mut self, on: bool);

    /// Drive the buzzer (wired alongside the LED on the door node).
    fn set_buzzer(&mut self, on: bool);

    /// Last commanded LED level.
    fn led_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, test
/// recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage ports (driven adapter: domain ↔ SPIFFS)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage backed by the SPIFFS partition.
///
/// Reads and writes are whole-value; the store holds single-digit state
/// blobs and the config override, nothing bulk. Implementations must not
/// block indefinitely when the filesystem is unavailable — startup falls
/// back to defaults instead.
pub trait StoragePort {
    /// Read a value. `Err(StorageError::NotFound)` when the key is absent.
    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a value, replacing any previous contents.
    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;
}

/// Loads and persists node configuration.
pub trait ConfigPort {
    /// Load configuration from storage. Returns the node's compiled-in
    /// defaults if no override blob exists.
    fn load(&self, defaults: NodeConfig) -> NodeConfig;

    /// Validate and persist a configuration override.
    fn save(&mut self, config: &NodeConfig) -> crate::error::Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Network ports
// ───────────────────────────────────────────────────────────────

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Any 2xx status counts as success; the core treats everything else
    /// (including transport-level failures) as a skipped iteration.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP client used for the status document and notifications.
pub trait HttpPort {
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, CommsError>;

    fn put(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<HttpResponse, CommsError>;
}

/// Fire-and-forget pub/sub publishing, plus the connectivity maintenance
/// the loop runs once per iteration.
pub trait PubSubPort {
    /// Reconnect if disconnected, honouring the capped backoff policy.
    /// Returns whether the client is connected afterwards.
    fn ensure_connected(&mut self, now_ms: u64) -> bool;

    fn is_connected(&self) -> bool;

    /// Publish `payload` to `topic`. No acknowledgment handling beyond the
    /// connectivity check.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;
}

/// Transport (WiFi station) connectivity.
pub trait ConnectivityPort {
    fn connect(&mut self) -> Result<(), CommsError>;
    fn is_connected(&self) -> bool;
    /// Called once per loop iteration before anything network-bound.
    fn ensure_connected(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Notification port
// ───────────────────────────────────────────────────────────────

/// Outbound chat notification, sent on the alarm activation edge.
pub trait NotifyPort {
    /// Send `text`. Success is any 2xx from the sink; failure is logged by
    /// the implementation and never retried within the same activation.
    fn send_message(&mut self, text: &str) -> Result<(), CommsError>;
}
