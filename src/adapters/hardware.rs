//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the sensors and actuator drivers, exposing them through
//! [`RangingPort`], [`EnvSensorPort`] and [`ActuatorPort`]. This is the only
//! module the node services see hardware through; on non-espidf targets the
//! underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{ActuatorPort, EnvSensorPort, RangingPort};
use crate::drivers::buzzer::Buzzer;
use crate::drivers::led::Led;
use crate::error::Result;
use crate::pins;
use crate::sensors::{DhtSensor, UltrasonicSensor};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    ultrasonic: UltrasonicSensor,
    dht: DhtSensor,
    /// One DHT frame carries both values; the sensor cannot be framed twice
    /// back to back, so the humidity read drains what the temperature read
    /// fetched.
    pending_humidity: Option<f32>,
    led: Led,
    buzzer: Buzzer,
}

impl HardwareAdapter {
    /// Claim the standard pin assignment from `pins.rs`.
    pub fn new() -> Result<Self> {
        Ok(Self {
            ultrasonic: UltrasonicSensor::new(pins::TRIG_GPIO, pins::ECHO_GPIO)?,
            dht: DhtSensor::new(pins::DHT_GPIO)?,
            pending_humidity: None,
            led: Led::new(pins::LED_GPIO)?,
            buzzer: Buzzer::new(pins::BUZZER_GPIO)?,
        })
    }
}

// ── RangingPort ───────────────────────────────────────────────

impl RangingPort for HardwareAdapter {
    fn distance_cm(&mut self) -> f32 {
        self.ultrasonic.measure_cm()
    }
}

// ── EnvSensorPort ─────────────────────────────────────────────

impl EnvSensorPort for HardwareAdapter {
    fn read_temperature_c(&mut self) -> f32 {
        match self.dht.read() {
            Ok((t, h)) => {
                self.pending_humidity = Some(h);
                t
            }
            Err(_) => {
                self.pending_humidity = None;
                f32::NAN
            }
        }
    }

    fn read_humidity_pct(&mut self) -> f32 {
        match self.pending_humidity.take() {
            Some(h) => h,
            None => match self.dht.read() {
                Ok((_, h)) => h,
                Err(_) => f32::NAN,
            },
        }
    }
}

// ── ActuatorPort ──────────────────────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_led(&mut self, on: bool) {
        self.led.set(on);
    }

    fn set_buzzer(&mut self, on: bool) {
        self.buzzer.set(on);
    }

    fn led_on(&self) -> bool {
        self.led.is_on()
    }
}
