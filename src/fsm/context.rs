//! Shared mutable context threaded through every FSM handler.
//!
//! `DetectorContext` is the single struct that state handlers read from and
//! write to, instead of module-level timer and flag globals. It carries the latest distance sample,
//! the caller-supplied monotonic timestamp, and the node configuration.

use crate::config::NodeConfig;

/// The shared context passed to every state handler function.
pub struct DetectorContext {
    // -- Timing --
    /// Monotonic milliseconds since boot, supplied by the caller each poll.
    pub now_ms: u64,
    /// Milliseconds since the current state was entered. Maintained by the
    /// engine; while in `Qualifying` this is the elapsed dwell time.
    pub ms_in_state: u64,

    // -- Sensor data --
    /// Latest distance sample (cm). `<= 0` means no echo, never "very close".
    pub distance_cm: f32,

    // -- Configuration --
    /// Node configuration (threshold, dwell and the rest).
    pub config: NodeConfig,
}

impl DetectorContext {
    /// Create a new context with the given configuration.
    pub fn new(config: NodeConfig) -> Self {
        Self {
            now_ms: 0,
            ms_in_state: 0,
            distance_cm: 0.0,
            config,
        }
    }

    /// Classify the current sample: strictly between zero and the threshold.
    /// A zero/degenerate reading (no echo) is out of range by definition.
    pub fn in_range(&self) -> bool {
        self.distance_cm > 0.0 && self.distance_cm < self.config.distance_threshold_cm
    }

    /// Whether the dwell duration has elapsed in the current state.
    pub fn dwell_elapsed(&self) -> bool {
        self.ms_in_state >= u64::from(self.config.dwell_ms)
    }
}
