//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for both nodes: presence
//! detection, edge-triggered actuation, remote-flag gating and the
//! publish/persist policy. All interaction with hardware and the network
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
