//! Property tests for the pure policy pieces: reconnect backoff, publish
//! guard, blink timing.
//!
//! Runs on host only — proptest is not available for ESP32 targets.

#![cfg(not(target_os = "espidf"))]

use doorlink::adapters::mqtt::ReconnectBackoff;
use doorlink::drivers::blink::BlinkEngine;
use doorlink::remote::publisher::PublishGuard;
use proptest::prelude::*;

// ── Reconnect backoff ─────────────────────────────────────────

/// Delay the policy must impose after `failures` consecutive failed
/// attempts: none, then 5 s, then 30 s from the fifth failure on.
fn expected_delay_ms(failures: u32) -> u64 {
    match failures {
        0 => 0,
        1..=4 => 5_000,
        _ => 30_000,
    }
}

proptest! {
    /// After any failure history, the attempt gate opens exactly at the
    /// policy delay boundary, never before.
    #[test]
    fn backoff_opens_exactly_at_the_boundary(
        failures in 0u32..20,
        start in 0u64..1_000_000,
    ) {
        let mut b = ReconnectBackoff::new();
        let mut now = start;
        for _ in 0..failures {
            b.record_attempt(now);
            now += 1;
        }
        let last = now - u64::from(failures.min(1));
        let delay = expected_delay_ms(failures);

        if failures == 0 {
            prop_assert!(b.attempt_due(now));
        } else {
            if delay > 0 {
                prop_assert!(!b.attempt_due(last + delay - 1));
            }
            prop_assert!(b.attempt_due(last + delay));
        }
    }

    /// A success always resets the policy to "attempt immediately".
    #[test]
    fn backoff_success_always_resets(
        failures in 1u32..50,
        now in 0u64..1_000_000,
    ) {
        let mut b = ReconnectBackoff::new();
        for i in 0..u64::from(failures) {
            b.record_attempt(now + i);
        }
        b.record_success();
        prop_assert_eq!(b.consecutive_failures(), 0);
        prop_assert!(b.attempt_due(now));
    }
}

// ── Publish guard ─────────────────────────────────────────────

proptest! {
    /// A value change is never suppressed, no matter the timing.
    #[test]
    fn guard_never_suppresses_a_change(
        prev in any::<bool>(),
        recorded_at in 0u64..1_000_000,
        elapsed in 0u64..10_000,
        interval in 1_000u64..600_000,
    ) {
        let mut g = PublishGuard::new();
        g.record(prev, recorded_at);
        prop_assert!(g.should_push(!prev, recorded_at + elapsed, interval));
    }

    /// An unchanged value is pushed iff the interval has elapsed.
    #[test]
    fn guard_unchanged_value_respects_the_interval(
        value in any::<bool>(),
        recorded_at in 0u64..1_000_000,
        elapsed in 0u64..1_000_000,
        interval in 1_000u64..600_000,
    ) {
        let mut g = PublishGuard::new();
        g.record(value, recorded_at);
        let due = g.should_push(value, recorded_at + elapsed, interval);
        prop_assert_eq!(due, elapsed >= interval);
    }
}

// ── Blink engine ──────────────────────────────────────────────

proptest! {
    /// Under any irregular polling cadence, emitted levels strictly
    /// alternate (first toggle goes low, engage set the level high) and no
    /// toggle fires before a full interval since the previous one.
    #[test]
    fn blink_toggles_alternate_and_respect_the_interval(
        interval in 100u32..10_000,
        engaged_at in 0u64..100_000,
        steps in proptest::collection::vec(1u64..3_000, 1..40),
    ) {
        let mut engine = BlinkEngine::new(interval);
        engine.engage(engaged_at);

        let mut now = engaged_at;
        let mut last_toggle = engaged_at;
        let mut expected = false;
        for step in steps {
            now += step;
            if let Some(observed) = engine.tick(now) {
                prop_assert_eq!(observed, expected);
                prop_assert!(now - last_toggle >= u64::from(interval));
                last_toggle = now;
                expected = !expected;
            }
        }
    }

    /// Disengage always forces the output low and stops further toggles.
    #[test]
    fn blink_disengage_is_final(
        interval in 100u32..10_000,
        polls in 1u64..100,
    ) {
        let mut engine = BlinkEngine::new(interval);
        engine.engage(0);
        for i in 1..=polls {
            let _ = engine.tick(i * u64::from(interval));
        }
        engine.disengage();
        for i in polls..polls + 10 {
            prop_assert_eq!(engine.tick(i * u64::from(interval)), None);
        }
    }
}
