//! Sensor drivers.
//!
//! Each sensor follows the same dual-target shape: real GPIO/protocol code
//! behind the `espidf` feature, a static atomic injection point on the host
//! so tests can script readings without hardware.

pub mod dht;
pub mod ultrasonic;

pub use dht::DhtSensor;
pub use ultrasonic::UltrasonicSensor;
