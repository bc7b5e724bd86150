//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  INACTIVE ──[in range]──▶ QUALIFYING ──[dwell elapsed]──▶ ACTIVE
//!      ▲                        │                              │
//!      └───[out of range]───────┴──────[out of range]──────────┘
//! ```
//!
//! A single out-of-range sample resets from either `Qualifying` or `Active`
//! straight back to `Inactive` — there is no hysteresis band. Side effects
//! (LED, telemetry, persistence, remote flag) are *not* performed here; the
//! services key them off the Active edge so each fires exactly once.

use super::context::DetectorContext;
use super::{StateDescriptor, StateId};
use log::info;

/// Build the static state table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Inactive
        StateDescriptor {
            id: StateId::Inactive,
            name: "Inactive",
            on_enter: None,
            on_exit: None,
            on_update: inactive_update,
        },
        // Index 1 — Qualifying
        StateDescriptor {
            id: StateId::Qualifying,
            name: "Qualifying",
            on_enter: Some(qualifying_enter),
            on_exit: None,
            on_update: qualifying_update,
        },
        // Index 2 — Active
        StateDescriptor {
            id: StateId::Active,
            name: "Active",
            on_enter: Some(active_enter),
            on_exit: Some(active_exit),
            on_update: active_update,
        },
    ]
}

// ---------------------------------------------------------------------------
// INACTIVE
// ---------------------------------------------------------------------------

fn inactive_update(ctx: &mut DetectorContext) -> Option<StateId> {
    if ctx.in_range() {
        return Some(StateId::Qualifying);
    }
    None
}

// ---------------------------------------------------------------------------
// QUALIFYING — accumulating continuous in-range time towards the dwell
// ---------------------------------------------------------------------------

fn qualifying_enter(ctx: &mut DetectorContext) {
    info!(
        "detector: object at {:.1} cm, qualifying for {} ms",
        ctx.distance_cm, ctx.config.dwell_ms
    );
}

fn qualifying_update(ctx: &mut DetectorContext) -> Option<StateId> {
    // One miss clears the timer.
    if !ctx.in_range() {
        return Some(StateId::Inactive);
    }
    if ctx.dwell_elapsed() {
        return Some(StateId::Active);
    }
    None
}

// ---------------------------------------------------------------------------
// ACTIVE — presence confirmed
// ---------------------------------------------------------------------------

fn active_enter(ctx: &mut DetectorContext) {
    // ms_in_state is already reset for the new state here; the qualify time
    // that got us in is the configured dwell.
    info!(
        "detector: presence confirmed after {} ms dwell at {:.1} cm",
        ctx.config.dwell_ms, ctx.distance_cm
    );
}

fn active_exit(ctx: &mut DetectorContext) {
    info!("detector: presence cleared ({:.1} cm)", ctx.distance_cm);
}

fn active_update(ctx: &mut DetectorContext) -> Option<StateId> {
    if !ctx.in_range() {
        return Some(StateId::Inactive);
    }
    None
}
