//! Indicator LED driver.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives a push-pull GPIO output.
//! On host/test: tracks the commanded level in memory only.

pub struct Led {
    #[cfg(feature = "espidf")]
    pin: esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
    level: bool,
}

impl Led {
    #[cfg(feature = "espidf")]
    pub fn new(gpio: i32) -> crate::error::Result<Self> {
        use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
        // SAFETY: the pin number comes from `pins.rs` and is claimed once.
        let pin = unsafe { AnyOutputPin::new(gpio) };
        let pin = PinDriver::output(pin).map_err(|_| crate::error::Error::Init("LED GPIO"))?;
        Ok(Self { pin, level: false })
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new(_gpio: i32) -> crate::error::Result<Self> {
        Ok(Self { level: false })
    }

    pub fn set(&mut self, on: bool) {
        #[cfg(feature = "espidf")]
        {
            let res = if on { self.pin.set_high() } else { self.pin.set_low() };
            if let Err(e) = res {
                log::warn!("LED: GPIO write failed: {e}");
            }
        }
        self.level = on;
    }

    pub fn is_on(&self) -> bool {
        self.level
    }
}
