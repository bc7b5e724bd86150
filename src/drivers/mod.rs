//! Output drivers: LED, buzzer, and the blink engine that paces them.

pub mod blink;
pub mod buzzer;
pub mod led;
