//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern expressed in safe Rust:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  StateTable                                            │
//! │  ┌────────────┬───────────┬────────────────────────┐   │
//! │  │ StateId    │ on_enter  │ on_update              │   │
//! │  ├────────────┼───────────┼────────────────────────┤   │
//! │  │ Inactive   │ fn(ctx)   │ fn(ctx) -> Option<>    │   │
//! │  │ Qualifying │ fn(ctx)   │ fn(ctx) -> Option<>    │   │
//! │  │ Active     │ fn(ctx)   │ fn(ctx) -> Option<>    │   │
//! │  └────────────┴───────────┴────────────────────────┘   │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Each poll the engine calls `on_update` for the **current** state. If it
//! returns `Some(next_id)`, the engine runs `on_exit` for the current state,
//! then `on_enter` for the next, and updates the current pointer.
//!
//! There is no fixed tick: the main loop polls as fast as its body runs, so
//! all dwell timing is done against the caller-supplied monotonic timestamp
//! in [`DetectorContext::now_ms`] rather than a tick counter.

pub mod context;
pub mod states;

use context::DetectorContext;
use log::debug;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of the detector states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// No in-range sample seen; the externally visible output is off.
    Inactive = 0,
    /// In-range samples accumulating towards the dwell duration.
    Qualifying = 1,
    /// Presence confirmed; the externally visible output is on.
    Active = 2,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 3;

    /// Convert a `u8` index back to `StateId`. Panics on out-of-range in
    /// debug builds; returns `Inactive` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Inactive,
            1 => Self::Qualifying,
            2 => Self::Active,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Inactive
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut DetectorContext);

/// Signature for the per-poll update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut DetectorContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The presence detector engine.
///
/// Owns the state table and the millisecond timestamp at which the current
/// state was entered, which doubles as the qualify start time while in
/// [`StateId::Qualifying`].
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// `now_ms` at which the current state was entered.
    state_entered_ms: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            state_entered_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `poll()`.
    pub fn start(&mut self, ctx: &mut DetectorContext) {
        debug!("detector starting in state: {}", self.table[self.current].name);
        self.state_entered_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the detector by one poll.
    ///
    /// 1. Refresh `ctx.ms_in_state` from the caller-supplied `ctx.now_ms`.
    /// 2. Call `on_update` for the current state.
    /// 3. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn poll(&mut self, ctx: &mut DetectorContext) {
        ctx.ms_in_state = ctx.now_ms.saturating_sub(self.state_entered_ms);

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// Milliseconds the detector has been in the current state.
    pub fn ms_in_current_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.state_entered_ms)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut DetectorContext) {
        let next_idx = next_id as usize;

        debug!(
            "detector transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entered_ms = ctx.now_ms;
        ctx.ms_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
