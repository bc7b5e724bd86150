//! Blink engine for the door node's alarm indication.
//!
//! Toggles at a fixed interval while engaged, tracked against its **own**
//! last-toggle timestamp so the cadence is independent of however fast or
//! slow the main detection poll happens to run. Disengaging forces the level
//! off immediately — the LED must never be left lit after the alarm clears.

/// Level toggler with its own timebase.
#[derive(Debug)]
pub struct BlinkEngine {
    interval_ms: u64,
    last_toggle_ms: u64,
    engaged: bool,
    level: bool,
}

impl BlinkEngine {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms),
            last_toggle_ms: 0,
            engaged: false,
            level: false,
        }
    }

    /// Start blinking: level goes high immediately and the toggle timer
    /// starts from `now_ms`.
    pub fn engage(&mut self, now_ms: u64) {
        self.engaged = true;
        self.level = true;
        self.last_toggle_ms = now_ms;
    }

    /// Stop blinking and force the level off.
    pub fn disengage(&mut self) {
        self.engaged = false;
        self.level = false;
    }

    /// Advance the engine. Returns `Some(level)` when the level changed this
    /// call (caller applies it to the hardware), `None` otherwise.
    pub fn tick(&mut self, now_ms: u64) -> Option<bool> {
        if !self.engaged {
            return None;
        }
        if now_ms.saturating_sub(self.last_toggle_ms) >= self.interval_ms {
            self.level = !self.level;
            self.last_toggle_ms = now_ms;
            return Some(self.level);
        }
        None
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn level(&self) -> bool {
        self.level
    }
}
