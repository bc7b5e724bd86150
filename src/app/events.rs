//! Outbound application events.
//!
//! The node services emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — log to serial, record in a test, etc. The
//! pub/sub feed publishes are *not* routed through here; they are part of
//! the services' edge side effects and go straight to the `PubSubPort`.

use crate::fsm::StateId;
use serde::Serialize;

/// Structured events emitted by the node services.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service has started (carries the detector's initial state).
    Started(StateId),

    /// The local debounced presence signal changed.
    PresenceChanged { active: bool },

    /// The door node's combined `active ∧ remoteFlag` condition changed.
    AlarmChanged { active: bool },

    /// The AC node pushed a new flag value into the shared document.
    FlagPushed(bool),

    /// A periodic environment sample was taken (door node).
    EnvSample(EnvReading),
}

/// One temperature/humidity sample, serialised onto the environment feed.
///
/// Field names are the feed's wire format; consumers key on
/// `temperature`/`humidity` exactly.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EnvReading {
    pub temperature: f32,
    pub humidity: f32,
}
