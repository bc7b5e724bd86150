//! Piezo buzzer driver.
//!
//! Level-driven alongside the LED on the door node — no tone generation,
//! just on/off at the blink cadence. Same dual-target shape as the LED.

pub struct Buzzer {
    #[cfg(feature = "espidf")]
    pin: esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
    sounding: bool,
}

impl Buzzer {
    #[cfg(feature = "espidf")]
    pub fn new(gpio: i32) -> crate::error::Result<Self> {
        use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
        // SAFETY: the pin number comes from `pins.rs` and is claimed once.
        let pin = unsafe { AnyOutputPin::new(gpio) };
        let pin =
            PinDriver::output(pin).map_err(|_| crate::error::Error::Init("buzzer GPIO"))?;
        Ok(Self { pin, sounding: false })
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new(_gpio: i32) -> crate::error::Result<Self> {
        Ok(Self { sounding: false })
    }

    pub fn set(&mut self, on: bool) {
        #[cfg(feature = "espidf")]
        {
            let res = if on { self.pin.set_high() } else { self.pin.set_low() };
            if let Err(e) = res {
                log::warn!("buzzer: GPIO write failed: {e}");
            }
        }
        self.sounding = on;
    }

    pub fn is_sounding(&self) -> bool {
        self.sounding
    }
}
