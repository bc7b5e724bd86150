//! Doorlink firmware library.
//!
//! Two cooperating ESP32 nodes share one codebase: the **AC node** debounces
//! an ultrasonic presence signal and pushes it into a remote status document;
//! the **door node** debounces its own sensor and only actuates when both its
//! local detection and the remote flag agree.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(feature = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod fsm;
pub mod remote;

pub mod error;
pub mod pins;

// Adapters carry their simulation backends for host builds; the actual
// device implementations are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
