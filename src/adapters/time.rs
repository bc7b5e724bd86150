//! Monotonic time adapter.
//!
//! The whole loop is driven by a single millisecond timebase:
//!
//! - **`espidf`** — wraps `esp_timer_get_time()` (microsecond precision,
//!   monotonic since boot).
//! - **host** — uses `std::time::Instant` for tests and simulation.

pub struct MonotonicClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(feature = "espidf")]
    pub fn now_ms(&self) -> u64 {
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since start (monotonic).
    #[cfg(not(feature = "espidf"))]
    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_runs_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
