//! Node services — the hexagonal core.
//!
//! One service per node role, both wrapping the same detector FSM and
//! exposing a single `poll(now_ms, …)` that the cooperative loop calls once
//! per iteration:
//!
//! ```text
//!  RangingPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                  │  AcNode / DoorNode svc   │ ──▶ PubSubPort
//!  ActuatorPort ◀──│  FSM · guard · blink     │ ──▶ HttpPort (flag sync)
//!                  └──────────────────────────┘ ──▶ StoragePort / NotifyPort
//! ```
//!
//! Every side effect hangs off a state *edge* — no edge, no effect — so
//! polling is idempotent no matter how fast the loop spins. All calls are
//! synchronous; a slow ranging echo or HTTP exchange stalls the rest of the
//! iteration by design (single-threaded cooperative model).

use log::{info, warn};

use crate::fsm::context::DetectorContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::config::NodeConfig;
use crate::drivers::blink::BlinkEngine;
use crate::remote::oracle::FlagOracle;
use crate::remote::publisher::{FlagPublisher, SyncOutcome};

use super::events::{AppEvent, EnvReading};
use super::ports::{
    ActuatorPort, EnvSensorPort, EventSink, HttpPort, NotifyPort, PubSubPort, RangingPort,
    StoragePort,
};

/// Key under which the door node persists its last commanded LED state.
pub const LED_STATE_KEY: &str = "led_state";

// ───────────────────────────────────────────────────────────────
// AC node (flag producer)
// ───────────────────────────────────────────────────────────────

/// The AC node debounces its sensor with a short dwell, drives the LED
/// directly from the local `Active` signal, and pushes that signal into the
/// shared status document for the door node to consume.
pub struct AcNodeService {
    fsm: Fsm,
    ctx: DetectorContext,
    publisher: FlagPublisher,
}

impl AcNodeService {
    pub fn new(config: NodeConfig) -> Self {
        let publisher = FlagPublisher::new(&config);
        let ctx = DetectorContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Inactive);
        Self { fsm, ctx, publisher }
    }

    /// Run the initial state entry. Call once before the first `poll`.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AC node started in {:?}", self.fsm.current_state());
    }

    /// One full cycle: connectivity → sample → FSM → edge side effects →
    /// flag sync.
    pub fn poll(
        &mut self,
        now_ms: u64,
        hw: &mut (impl RangingPort + ActuatorPort),
        pubsub: &mut impl PubSubPort,
        http: &mut impl HttpPort,
        sink: &mut impl EventSink,
    ) {
        let _ = pubsub.ensure_connected(now_ms);

        // Sample and advance the detector.
        let prev = self.fsm.current_state();
        self.ctx.now_ms = now_ms;
        self.ctx.distance_cm = hw.distance_cm();
        self.fsm.poll(&mut self.ctx);
        let state = self.fsm.current_state();

        let active = state == StateId::Active;

        // Edge side effects: LED + presence feed, exactly once per edge.
        if active != (prev == StateId::Active) {
            hw.set_led(active);
            let payload: &[u8] = if active { b"1" } else { b"0" };
            if let Err(e) = pubsub.publish(&self.ctx.config.presence_topic, payload) {
                warn!("AC node: presence publish failed: {e}");
            }
            sink.emit(&AppEvent::PresenceChanged { active });
        }

        // Flag sync runs every poll; the guard suppresses redundant writes
        // and a failed exchange stays due for the next iteration.
        match self.publisher.sync(http, active, now_ms) {
            Ok(SyncOutcome::Pushed) => sink.emit(&AppEvent::FlagPushed(active)),
            Ok(SyncOutcome::Skipped) => {}
            Err(e) => warn!("AC node: flag sync failed: {e}"),
        }
    }

    /// Current detector state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }
}

// ───────────────────────────────────────────────────────────────
// Door node (flag consumer)
// ───────────────────────────────────────────────────────────────

/// The door node requires both its own debounced detection **and** the
/// remote flag before actuating: `alarm = active ∧ remoteFlag`. While the
/// alarm holds, the LED/buzzer blink on their own timebase; on the rising
/// edge it notifies exactly once and persists the state write-through.
pub struct DoorNodeService {
    fsm: Fsm,
    ctx: DetectorContext,
    oracle: FlagOracle,
    blink: BlinkEngine,
    /// The combined condition as last applied to the outputs.
    alarm: bool,
    last_env_ms: Option<u64>,
}

impl DoorNodeService {
    pub fn new(config: NodeConfig) -> Self {
        let oracle = FlagOracle::new(&config);
        let blink = BlinkEngine::new(config.blink_interval_ms);
        let ctx = DetectorContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Inactive);
        Self {
            fsm,
            ctx,
            oracle,
            blink,
            alarm: false,
            last_env_ms: None,
        }
    }

    /// Restore persisted actuator state and prime the remote flag, then run
    /// the initial state entry. Storage being empty or unavailable restores
    /// "off"; neither path blocks startup.
    pub fn start(
        &mut self,
        storage: &impl StoragePort,
        hw: &mut impl ActuatorPort,
        http: &mut impl HttpPort,
        sink: &mut impl EventSink,
    ) {
        let restored = match storage.read(LED_STATE_KEY) {
            Ok(bytes) => bytes.as_slice() == b"1",
            Err(e) => {
                info!("door node: no persisted LED state ({e}), defaulting off");
                false
            }
        };
        hw.set_led(restored);
        self.alarm = restored;
        info!("door node: LED restored {}", if restored { "ON" } else { "OFF" });

        // One eager fetch so the gate has a real value before the loop.
        let flag = self.oracle.refresh(http);
        info!("door node: startup remote flag sensor2={flag}");

        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
    }

    /// One full cycle: connectivity → remote flag → sample → FSM → combined
    /// edge side effects → blink → periodic environment telemetry.
    #[allow(clippy::too_many_arguments)]
    pub fn poll(
        &mut self,
        now_ms: u64,
        hw: &mut (impl RangingPort + EnvSensorPort + ActuatorPort),
        pubsub: &mut impl PubSubPort,
        http: &mut impl HttpPort,
        storage: &mut impl StoragePort,
        notify: &mut impl NotifyPort,
        sink: &mut impl EventSink,
    ) {
        let _ = pubsub.ensure_connected(now_ms);

        // The flag is fetched every iteration — no caching beyond the
        // oracle's fail-open last-known value.
        let remote_flag = self.oracle.refresh(http);

        let prev = self.fsm.current_state();
        self.ctx.now_ms = now_ms;
        self.ctx.distance_cm = hw.distance_cm();
        self.fsm.poll(&mut self.ctx);
        let state = self.fsm.current_state();

        let local_active = state == StateId::Active;
        if local_active != (prev == StateId::Active) {
            sink.emit(&AppEvent::PresenceChanged { active: local_active });
        }

        // Reaching Active locally is necessary but not sufficient.
        let alarm = local_active && remote_flag;
        if alarm != self.alarm {
            self.alarm = alarm;
            self.apply_alarm_edge(alarm, now_ms, hw, pubsub, storage, notify);
            sink.emit(&AppEvent::AlarmChanged { active: alarm });
        }

        // Blink on its own timebase while the alarm holds.
        if let Some(level) = self.blink.tick(now_ms) {
            hw.set_led(level);
            hw.set_buzzer(level);
        }

        self.env_telemetry(now_ms, hw, pubsub, sink);
    }

    /// Current detector state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// The combined condition as currently applied.
    pub fn alarm_active(&self) -> bool {
        self.alarm
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_alarm_edge(
        &mut self,
        alarm: bool,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        pubsub: &mut impl PubSubPort,
        storage: &mut impl StoragePort,
        notify: &mut impl NotifyPort,
    ) {
        if alarm {
            hw.set_led(true);
            hw.set_buzzer(true);
            self.blink.engage(now_ms);
        } else {
            // Forced off the instant the condition clears.
            self.blink.disengage();
            hw.set_led(false);
            hw.set_buzzer(false);
        }

        let payload: &[u8] = if alarm { b"1" } else { b"0" };
        if let Err(e) = pubsub.publish(&self.ctx.config.presence_topic, payload) {
            warn!("door node: presence publish failed: {e}");
        }

        // Write-through persistence on every transition.
        if let Err(e) = storage.write(LED_STATE_KEY, payload) {
            warn!("door node: persist failed: {e}");
        }

        // Notification fires on the rising edge only, exactly once.
        if alarm {
            let msg = self.ctx.config.notify_message.clone();
            if let Err(e) = notify.send_message(&msg) {
                warn!("door node: notification failed: {e}");
            }
        }
    }

    fn env_telemetry(
        &mut self,
        now_ms: u64,
        hw: &mut impl EnvSensorPort,
        pubsub: &mut impl PubSubPort,
        sink: &mut impl EventSink,
    ) {
        let interval = u64::from(self.ctx.config.env_telemetry_ms);
        let due = match self.last_env_ms {
            Some(at) => now_ms.saturating_sub(at) >= interval,
            None => now_ms >= interval,
        };
        if !due {
            return;
        }
        self.last_env_ms = Some(now_ms);

        let temperature_c = hw.read_temperature_c();
        let humidity_pct = hw.read_humidity_pct();
        if temperature_c.is_nan() || humidity_pct.is_nan() {
            // No data this cycle; next sample in one interval, no retry now.
            warn!("door node: DHT read failed, skipping sample");
            return;
        }

        let reading = EnvReading {
            temperature: temperature_c,
            humidity: humidity_pct,
        };
        match serde_json::to_string(&reading) {
            Ok(json) => {
                if let Err(e) = pubsub.publish(&self.ctx.config.env_topic, json.as_bytes()) {
                    warn!("door node: env publish failed: {e}");
                }
                sink.emit(&AppEvent::EnvSample(reading));
            }
            Err(e) => warn!("door node: env serialise failed: {e}"),
        }
    }
}
