//! HC-SR04 ultrasonic ranging.
//!
//! A 10 µs high pulse on the trigger pin starts a measurement; the sensor
//! answers with a high pulse on the echo pin whose width is the round-trip
//! time of flight. Distance in cm is `(round_trip_us / 2) * 0.0343`
//! (speed of sound, ~343 m/s).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the trigger and busy-waits on the echo edge with a
//! microsecond timeout. On host/test: reads a static `AtomicU32` holding the
//! round-trip time in µs, settable via [`sim_set_round_trip_us`].

#[cfg(not(feature = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Error, Result};

/// Speed-of-sound scale factor, cm per µs of one-way travel.
const CM_PER_US: f32 = 0.0343;

/// Echo pulses longer than this are treated as "no echo" (out of range).
/// 30 ms of round trip is roughly 5 m, well past the sensor's rated range.
const ECHO_TIMEOUT_US: u64 = 30_000;

#[cfg(not(feature = "espidf"))]
static SIM_ROUND_TRIP_US: AtomicU32 = AtomicU32::new(0);

/// Inject the next round-trip time, in µs. `0` simulates a missed echo.
#[cfg(not(feature = "espidf"))]
pub fn sim_set_round_trip_us(us: u32) {
    SIM_ROUND_TRIP_US.store(us, Ordering::Relaxed);
}

/// Convert a round-trip echo time to a one-way distance in cm.
///
/// `0` (no echo) maps to `0.0`, which the detector reads as out of range.
pub fn round_trip_to_cm(round_trip_us: u32) -> f32 {
    (round_trip_us as f32 / 2.0) * CM_PER_US
}

pub struct UltrasonicSensor {
    #[cfg(feature = "espidf")]
    trig: esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
    #[cfg(feature = "espidf")]
    echo: esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyInputPin, esp_idf_hal::gpio::Input>,
    #[cfg(not(feature = "espidf"))]
    _pins: (i32, i32),
}

impl UltrasonicSensor {
    #[cfg(feature = "espidf")]
    pub fn new(trig_gpio: i32, echo_gpio: i32) -> Result<Self> {
        use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, PinDriver};
        let trig_pin = unsafe { AnyOutputPin::new(trig_gpio) };
        let echo_pin = unsafe { AnyInputPin::new(echo_gpio) };
        let trig = PinDriver::output(trig_pin).map_err(|_| Error::Init("ultrasonic trig"))?;
        let echo = PinDriver::input(echo_pin).map_err(|_| Error::Init("ultrasonic echo"))?;
        Ok(Self { trig, echo })
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new(trig_gpio: i32, echo_gpio: i32) -> Result<Self> {
        Ok(Self {
            _pins: (trig_gpio, echo_gpio),
        })
    }

    /// Fire one measurement and return the distance in cm.
    ///
    /// Returns `0.0` for a missed or timed-out echo, never an error: a
    /// transient miss is an out-of-range sample, not a fault.
    pub fn measure_cm(&mut self) -> f32 {
        round_trip_to_cm(self.round_trip_us())
    }

    #[cfg(feature = "espidf")]
    fn round_trip_us(&mut self) -> u32 {
        use esp_idf_hal::delay::Ets;

        // Settle low, then the 10 µs trigger pulse.
        let _ = self.trig.set_low();
        Ets::delay_us(2);
        let _ = self.trig.set_high();
        Ets::delay_us(10);
        let _ = self.trig.set_low();

        let start_wait = now_us();
        while self.echo.is_low() {
            if now_us().saturating_sub(start_wait) > ECHO_TIMEOUT_US {
                return 0;
            }
        }
        let rise = now_us();
        while self.echo.is_high() {
            if now_us().saturating_sub(rise) > ECHO_TIMEOUT_US {
                return 0;
            }
        }
        (now_us().saturating_sub(rise)) as u32
    }

    #[cfg(not(feature = "espidf"))]
    fn round_trip_us(&mut self) -> u32 {
        SIM_ROUND_TRIP_US.load(Ordering::Relaxed)
    }
}

#[cfg(feature = "espidf")]
fn now_us() -> u64 {
    unsafe { esp_idf_sys::esp_timer_get_time() as u64 }
}
