//! DHT22 (AM2302) temperature/humidity sensor.
//!
//! Single-wire protocol: the host pulls the line low for ~2 ms, releases it,
//! then the sensor answers with a presence pulse followed by 40 data bits
//! encoded in high-pulse width (~27 µs = 0, ~70 µs = 1). The 5 bytes are
//! humidity hi/lo, temperature hi/lo, checksum.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs an open-drain GPIO with interrupts masked for the
//! duration of one frame (~5 ms). On host/test: reads a pair of static
//! atomics holding the scaled readings, settable via [`sim_set_env`].

#[cfg(not(feature = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::SensorError;

/// Scaled sim values: `f32::to_bits`. Defaults decode to 25.0 C / 50.0 %.
#[cfg(not(feature = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0x41C8_0000);
#[cfg(not(feature = "espidf"))]
static SIM_HUM_BITS: AtomicU32 = AtomicU32::new(0x4248_0000);
/// Non-zero forces the next host read to fail.
#[cfg(not(feature = "espidf"))]
static SIM_FAIL: AtomicU32 = AtomicU32::new(0);

/// Inject the next host reading. `None` simulates a failed frame.
#[cfg(not(feature = "espidf"))]
pub fn sim_set_env(reading: Option<(f32, f32)>) {
    match reading {
        Some((temp_c, hum_pct)) => {
            SIM_TEMP_BITS.store(temp_c.to_bits(), Ordering::Relaxed);
            SIM_HUM_BITS.store(hum_pct.to_bits(), Ordering::Relaxed);
            SIM_FAIL.store(0, Ordering::Relaxed);
        }
        None => SIM_FAIL.store(1, Ordering::Relaxed),
    }
}

pub struct DhtSensor {
    #[cfg(feature = "espidf")]
    pin: esp_idf_hal::gpio::PinDriver<
        'static,
        esp_idf_hal::gpio::AnyIOPin,
        esp_idf_hal::gpio::InputOutput,
    >,
    #[cfg(not(feature = "espidf"))]
    _gpio: i32,
}

impl DhtSensor {
    #[cfg(feature = "espidf")]
    pub fn new(gpio: i32) -> crate::error::Result<Self> {
        use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
        let pin = unsafe { AnyIOPin::new(gpio) };
        let pin = PinDriver::input_output_od(pin)
            .map_err(|_| crate::error::Error::Init("dht pin"))?;
        Ok(Self { pin })
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new(gpio: i32) -> crate::error::Result<Self> {
        Ok(Self { _gpio: gpio })
    }

    /// Read one `(temperature_c, humidity_pct)` frame.
    ///
    /// The sensor needs >= 2 s between frames; callers sample far slower
    /// than that, so no pacing is enforced here.
    pub fn read(&mut self) -> Result<(f32, f32), SensorError> {
        #[cfg(feature = "espidf")]
        {
            self.read_frame()
        }
        #[cfg(not(feature = "espidf"))]
        {
            if SIM_FAIL.load(Ordering::Relaxed) != 0 {
                return Err(SensorError::EnvReadFailed);
            }
            Ok((
                f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed)),
                f32::from_bits(SIM_HUM_BITS.load(Ordering::Relaxed)),
            ))
        }
    }

    #[cfg(feature = "espidf")]
    fn read_frame(&mut self) -> Result<(f32, f32), SensorError> {
        use esp_idf_hal::delay::Ets;
        use esp_idf_hal::gpio::Level;

        // Start signal: >= 1 ms low, then release and hand over to the sensor.
        self.pin
            .set_level(Level::Low)
            .map_err(|_| SensorError::GpioFailed)?;
        Ets::delay_us(2_000);
        self.pin
            .set_level(Level::High)
            .map_err(|_| SensorError::GpioFailed)?;
        Ets::delay_us(30);

        // Presence pulse: ~80 µs low then ~80 µs high.
        self.wait_level(false, 100)?;
        self.wait_level(true, 100)?;
        self.wait_level(false, 100)?;

        let mut data = [0u8; 5];
        for bit in 0..40 {
            self.wait_level(true, 80)?;
            let width = self.pulse_width(true, 100)?;
            if width > 40 {
                data[bit / 8] |= 1 << (7 - bit % 8);
            }
        }

        let sum = data[0]
            .wrapping_add(data[1])
            .wrapping_add(data[2])
            .wrapping_add(data[3]);
        if sum != data[4] {
            return Err(SensorError::EnvReadFailed);
        }

        let humidity = u16::from_be_bytes([data[0], data[1]]) as f32 / 10.0;
        let raw_temp = u16::from_be_bytes([data[2], data[3]]);
        // Sign bit lives in the top bit of the temperature word.
        let temperature = if raw_temp & 0x8000 != 0 {
            -((raw_temp & 0x7FFF) as f32 / 10.0)
        } else {
            raw_temp as f32 / 10.0
        };
        Ok((temperature, humidity))
    }

    /// Busy-wait until the line reaches `level`, bounded by `timeout_us`.
    #[cfg(feature = "espidf")]
    fn wait_level(&self, level: bool, timeout_us: u32) -> Result<(), SensorError> {
        for _ in 0..timeout_us {
            if self.pin.is_high() == level {
                return Ok(());
            }
            esp_idf_hal::delay::Ets::delay_us(1);
        }
        Err(SensorError::EnvReadFailed)
    }

    /// Measure how long the line stays at `level`, in µs.
    #[cfg(feature = "espidf")]
    fn pulse_width(&self, level: bool, timeout_us: u32) -> Result<u32, SensorError> {
        for elapsed in 0..timeout_us {
            if self.pin.is_high() != level {
                return Ok(elapsed);
            }
            esp_idf_hal::delay::Ets::delay_us(1);
        }
        Err(SensorError::EnvReadFailed)
    }
}
