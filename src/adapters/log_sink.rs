//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to the
//! ESP-IDF logger (UART / USB-CDC in production). A future MQTT telemetry
//! sink would implement the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::PresenceChanged { active } => {
                info!("PRESENCE | active={}", active);
            }
            AppEvent::AlarmChanged { active } => {
                info!("ALARM | active={}", active);
            }
            AppEvent::FlagPushed(value) => {
                info!("FLAG | sensor2={}", value);
            }
            AppEvent::EnvSample(r) => {
                info!(
                    "ENV | T={:.1}\u{00b0}C RH={:.1}%",
                    r.temperature, r.humidity
                );
            }
        }
    }
}
