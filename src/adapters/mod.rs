//! Driven adapters — concrete implementations of the port traits in
//! [`crate::app::ports`].
//!
//! Everything that touches ESP-IDF lives here or in `drivers`/`sensors`;
//! the domain core only ever sees the traits.

pub mod hardware;
pub mod http;
pub mod log_sink;
pub mod mqtt;
pub mod notify;
pub mod spiffs;
pub mod time;
pub mod wifi;
