//! GPIO pin assignments for both node boards.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers. Both boards use the same wiring, so one set of
//! constants serves the AC node and the door node alike.

// ---------------------------------------------------------------------------
// HC-SR04 ultrasonic ranging
// ---------------------------------------------------------------------------

/// Digital output: 10 µs trigger pulse starts a ranging cycle.
pub const TRIG_GPIO: i32 = 19;
/// Digital input: echo pulse width encodes the round-trip time.
pub const ECHO_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Indicator LED (active HIGH).
pub const LED_GPIO: i32 = 4;
/// Piezo buzzer, driven together with the LED on the door node.
pub const BUZZER_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// DHT22 temperature/humidity (door node only; unpopulated on the AC board)
// ---------------------------------------------------------------------------

/// Single-wire data line for the DHT22.
pub const DHT_GPIO: i32 = 15;
