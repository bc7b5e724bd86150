//! Integration tests: node services → FSM → actuators and remote effects.

use std::collections::HashMap;

use doorlink::app::events::AppEvent;
use doorlink::app::ports::{
    ActuatorPort, EnvSensorPort, EventSink, HttpPort, HttpResponse, NotifyPort, PubSubPort,
    RangingPort, StoragePort,
};
use doorlink::app::service::{AcNodeService, DoorNodeService, LED_STATE_KEY};
use doorlink::config::NodeConfig;
use doorlink::error::{CommsError, StorageError};
use doorlink::remote::b64;

// ── Mock implementations ──────────────────────────────────────

struct MockHw {
    distance_cm: f32,
    temperature_c: f32,
    humidity_pct: f32,
    led: bool,
    buzzer: bool,
    led_history: Vec<bool>,
}

impl MockHw {
    fn new() -> Self {
        Self {
            distance_cm: 200.0,
            temperature_c: 24.0,
            humidity_pct: 55.0,
            led: false,
            buzzer: false,
            led_history: Vec::new(),
        }
    }
}

impl RangingPort for MockHw {
    fn distance_cm(&mut self) -> f32 {
        self.distance_cm
    }
}

impl EnvSensorPort for MockHw {
    fn read_temperature_c(&mut self) -> f32 {
        self.temperature_c
    }
    fn read_humidity_pct(&mut self) -> f32 {
        self.humidity_pct
    }
}

impl ActuatorPort for MockHw {
    fn set_led(&mut self, on: bool) {
        self.led = on;
        self.led_history.push(on);
    }
    fn set_buzzer(&mut self, on: bool) {
        self.buzzer = on;
    }
    fn led_on(&self) -> bool {
        self.led
    }
}

struct MockPubSub {
    connected: bool,
    published: Vec<(String, Vec<u8>)>,
}

impl MockPubSub {
    fn new() -> Self {
        Self {
            connected: true,
            published: Vec::new(),
        }
    }

    fn on_topic(&self, topic: &str) -> Vec<&[u8]> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_slice())
            .collect()
    }
}

impl PubSubPort for MockPubSub {
    fn ensure_connected(&mut self, _now_ms: u64) -> bool {
        self.connected
    }
    fn is_connected(&self) -> bool {
        self.connected
    }
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::PublishFailed);
        }
        self.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }
}

/// Simulates the remote contents endpoint: holds the current flag and a
/// revision counter, decodes every PUT back into a boolean.
struct GithubHttp {
    flag: bool,
    revision: u32,
    puts: Vec<bool>,
    gets: u32,
    fail_gets: u32,
    fail_puts: u32,
}

impl GithubHttp {
    fn new(flag: bool) -> Self {
        Self {
            flag,
            revision: 1,
            puts: Vec::new(),
            gets: 0,
            fail_gets: 0,
            fail_puts: 0,
        }
    }
}

impl HttpPort for GithubHttp {
    fn get(&mut self, _url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse, CommsError> {
        self.gets += 1;
        if self.fail_gets > 0 {
            self.fail_gets -= 1;
            return Err(CommsError::HttpTransport);
        }
        let content = b64::encode(format!("{{\"sensor2\": {}}}", self.flag).as_bytes());
        Ok(HttpResponse {
            status: 200,
            body: format!(
                r#"{{"content": "{content}", "sha": "rev-{}"}}"#,
                self.revision
            ),
        })
    }

    fn put(
        &mut self,
        _url: &str,
        _headers: &[(&str, &str)],
        body: &str,
    ) -> Result<HttpResponse, CommsError> {
        if self.fail_puts > 0 {
            self.fail_puts -= 1;
            return Ok(HttpResponse {
                status: 500,
                body: String::new(),
            });
        }
        let v: serde_json::Value = serde_json::from_str(body).expect("PUT body is JSON");
        let decoded = b64::decode(v["content"].as_str().unwrap()).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        self.flag = doc["sensor2"].as_bool().unwrap();
        self.puts.push(self.flag);
        self.revision += 1;
        Ok(HttpResponse {
            status: 200,
            body: String::new(),
        })
    }
}

struct MockStorage {
    store: HashMap<String, Vec<u8>>,
    read_fails: bool,
}

impl MockStorage {
    fn new() -> Self {
        Self {
            store: HashMap::new(),
            read_fails: false,
        }
    }

    fn with(key: &str, value: &[u8]) -> Self {
        let mut s = Self::new();
        s.store.insert(key.to_owned(), value.to_vec());
        s
    }
}

impl StoragePort for MockStorage {
    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        if self.read_fails {
            return Err(StorageError::IoError);
        }
        self.store.get(key).cloned().ok_or(StorageError::NotFound)
    }
    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

struct MockNotify {
    messages: Vec<String>,
}

impl MockNotify {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }
}

impl NotifyPort for MockNotify {
    fn send_message(&mut self, text: &str) -> Result<(), CommsError> {
        self.messages.push(text.to_owned());
        Ok(())
    }
}

struct RecSink {
    events: Vec<AppEvent>,
}

impl RecSink {
    fn new() -> Self {
        Self { events: Vec::new() }
    }

    fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── AC node ───────────────────────────────────────────────────

struct AcRig {
    service: AcNodeService,
    hw: MockHw,
    pubsub: MockPubSub,
    http: GithubHttp,
    sink: RecSink,
}

impl AcRig {
    fn new() -> Self {
        let mut sink = RecSink::new();
        let mut service = AcNodeService::new(NodeConfig::ac_node());
        service.start(&mut sink);
        Self {
            service,
            hw: MockHw::new(),
            pubsub: MockPubSub::new(),
            http: GithubHttp::new(false),
            sink,
        }
    }

    fn poll(&mut self, now_ms: u64) {
        self.service.poll(
            now_ms,
            &mut self.hw,
            &mut self.pubsub,
            &mut self.http,
            &mut self.sink,
        );
    }
}

const AC_TOPIC: &str = "Pedrin/feeds/condicionador";

#[test]
fn ac_dwell_activation_drives_led_and_feed() {
    let mut rig = AcRig::new();
    rig.hw.distance_cm = 5.0;

    // In range for the full dwell second, 100 ms cadence.
    for t in (0..1000).step_by(100) {
        rig.poll(t);
        assert!(!rig.hw.led, "LED must stay off during the qualify window");
    }
    rig.poll(1000);

    assert!(rig.hw.led);
    // The LED is written exactly once per edge, not once per poll.
    assert_eq!(rig.hw.led_history, vec![true]);
    assert_eq!(rig.pubsub.on_topic(AC_TOPIC), vec![b"1" as &[u8]]);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::PresenceChanged { active: true })),
        1
    );
}

#[test]
fn ac_momentary_blip_does_not_activate() {
    let mut rig = AcRig::new();
    rig.hw.distance_cm = 5.0;
    for t in (0..600).step_by(100) {
        rig.poll(t);
    }
    // One out-of-range sample resets the qualify window.
    rig.hw.distance_cm = 150.0;
    rig.poll(600);
    rig.hw.distance_cm = 5.0;
    for t in (700..1700).step_by(100) {
        rig.poll(t);
        assert!(!rig.hw.led);
    }
    // Full dwell from the reset point (qualifying restarted at 700 ms).
    rig.poll(1700);
    assert!(rig.hw.led);
}

#[test]
fn ac_flag_sync_pushes_on_change_and_interval() {
    let mut rig = AcRig::new();

    // First poll pushes the boot value unconditionally.
    rig.poll(0);
    assert_eq!(rig.http.puts, vec![false]);

    // Unchanged value within the guard window: no further writes.
    for t in (100..5000).step_by(100) {
        rig.poll(t);
    }
    assert_eq!(rig.http.puts.len(), 1);

    // Interval elapsed: one refresh write of the same value.
    rig.poll(5_000);
    assert_eq!(rig.http.puts, vec![false, false]);

    // A value change publishes immediately, mid-interval.
    rig.hw.distance_cm = 5.0;
    for t in (5_100..6_200).step_by(100) {
        rig.poll(t);
    }
    assert_eq!(*rig.http.puts.last().unwrap(), true);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::FlagPushed(true))),
        1
    );
}

#[test]
fn ac_failed_push_retries_next_poll() {
    let mut rig = AcRig::new();
    rig.http.fail_puts = 2;

    rig.poll(0);
    rig.poll(100);
    assert!(rig.http.puts.is_empty(), "both attempts failed at the store");

    // Third poll succeeds; the guard then arms normally.
    rig.poll(200);
    assert_eq!(rig.http.puts, vec![false]);
    rig.poll(300);
    assert_eq!(rig.http.puts.len(), 1);
}

#[test]
fn ac_deactivation_publishes_zero() {
    let mut rig = AcRig::new();
    rig.hw.distance_cm = 5.0;
    for t in (0..=1000).step_by(100) {
        rig.poll(t);
    }
    assert!(rig.hw.led);

    rig.hw.distance_cm = 0.0; // missed echo counts as out of range
    rig.poll(1100);
    assert!(!rig.hw.led);
    assert_eq!(
        rig.pubsub.on_topic(AC_TOPIC),
        vec![b"1" as &[u8], b"0" as &[u8]]
    );
    assert_eq!(*rig.http.puts.last().unwrap(), false);
}

// ── Door node ─────────────────────────────────────────────────

struct DoorRig {
    service: DoorNodeService,
    hw: MockHw,
    pubsub: MockPubSub,
    http: GithubHttp,
    storage: MockStorage,
    notify: MockNotify,
    sink: RecSink,
}

impl DoorRig {
    fn with_storage(remote_flag: bool, storage: MockStorage) -> Self {
        let mut rig = Self {
            service: DoorNodeService::new(NodeConfig::door_node()),
            hw: MockHw::new(),
            pubsub: MockPubSub::new(),
            http: GithubHttp::new(remote_flag),
            storage,
            notify: MockNotify::new(),
            sink: RecSink::new(),
        };
        rig.service
            .start(&rig.storage, &mut rig.hw, &mut rig.http, &mut rig.sink);
        rig
    }

    fn new(remote_flag: bool) -> Self {
        Self::with_storage(remote_flag, MockStorage::new())
    }

    fn poll(&mut self, now_ms: u64) {
        self.service.poll(
            now_ms,
            &mut self.hw,
            &mut self.pubsub,
            &mut self.http,
            &mut self.storage,
            &mut self.notify,
            &mut self.sink,
        );
    }

    /// Poll through the 6 s dwell with the sensor in range.
    fn run_dwell(&mut self, from_ms: u64) -> u64 {
        self.hw.distance_cm = 5.0;
        let mut t = from_ms;
        while t <= from_ms + 6_000 {
            self.poll(t);
            t += 500;
        }
        t
    }
}

const DOOR_TOPIC: &str = "Pedrin/feeds/ultrassom_status";
const ENV_TOPIC: &str = "Pedrin/feeds/ambiente";

#[test]
fn door_local_detection_alone_does_not_alarm() {
    let mut rig = DoorRig::new(false);
    rig.run_dwell(0);

    assert!(!rig.hw.led);
    assert!(!rig.hw.buzzer);
    assert!(rig.notify.messages.is_empty());
    assert!(rig.pubsub.on_topic(DOOR_TOPIC).is_empty());
    // The local edge is still observable.
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::PresenceChanged { active: true })),
        1
    );
}

#[test]
fn door_alarm_needs_presence_and_remote_flag() {
    let mut rig = DoorRig::new(false);
    let t = rig.run_dwell(0);

    // Flag flips remotely; the very next poll raises the alarm.
    rig.http.flag = true;
    rig.poll(t);

    assert!(rig.hw.led);
    assert!(rig.hw.buzzer);
    assert_eq!(rig.pubsub.on_topic(DOOR_TOPIC), vec![b"1" as &[u8]]);
    assert_eq!(rig.storage.read(LED_STATE_KEY).unwrap(), b"1");
    assert_eq!(rig.notify.messages.len(), 1);
    assert!(rig.notify.messages[0].contains("porta"));
}

#[test]
fn door_notifies_once_per_activation() {
    let mut rig = DoorRig::new(true);
    let mut t = rig.run_dwell(0);
    assert_eq!(rig.notify.messages.len(), 1);

    // Holding the condition never re-notifies.
    for _ in 0..20 {
        rig.poll(t);
        t += 500;
    }
    assert_eq!(rig.notify.messages.len(), 1);

    // Clear, then re-activate: exactly one more message.
    rig.hw.distance_cm = 200.0;
    rig.poll(t);
    assert_eq!(rig.notify.messages.len(), 1);
    rig.run_dwell(t + 500);
    assert_eq!(rig.notify.messages.len(), 2);
}

#[test]
fn door_clearing_turns_everything_off_and_persists() {
    let mut rig = DoorRig::new(true);
    let t = rig.run_dwell(0);
    assert!(rig.hw.led);

    rig.hw.distance_cm = 200.0;
    rig.poll(t);

    assert!(!rig.hw.led);
    assert!(!rig.hw.buzzer);
    assert_eq!(rig.storage.read(LED_STATE_KEY).unwrap(), b"0");
    assert_eq!(
        rig.pubsub.on_topic(DOOR_TOPIC),
        vec![b"1" as &[u8], b"0" as &[u8]]
    );
}

#[test]
fn door_blinks_on_its_own_timebase() {
    let mut rig = DoorRig::new(true);
    let t = rig.run_dwell(0);
    assert!(rig.hw.led, "rising edge drives the LED high immediately");

    // One second later the level toggles low, another second high again,
    // regardless of the polling cadence in between.
    rig.poll(t + 250);
    assert!(rig.hw.led);
    rig.poll(t + 1_000);
    assert!(!rig.hw.led);
    assert!(!rig.hw.buzzer);
    rig.poll(t + 2_000);
    assert!(rig.hw.led);
    assert!(rig.hw.buzzer);
}

#[test]
fn door_restores_persisted_led_state_at_boot() {
    let rig = DoorRig::with_storage(false, MockStorage::with(LED_STATE_KEY, b"1"));
    assert!(rig.hw.led, "stored \"1\" restores the LED before the loop");

    let rig = DoorRig::with_storage(false, MockStorage::with(LED_STATE_KEY, b"0"));
    assert!(!rig.hw.led);
}

#[test]
fn door_restored_alarm_clears_cleanly_when_condition_is_gone() {
    let mut rig = DoorRig::with_storage(false, MockStorage::with(LED_STATE_KEY, b"1"));
    assert!(rig.hw.led);

    // Nothing in range, flag false: the first poll produces a clean falling
    // edge instead of a stuck LED.
    rig.poll(0);
    assert!(!rig.hw.led);
    assert_eq!(rig.storage.read(LED_STATE_KEY).unwrap(), b"0");
    assert!(rig.notify.messages.is_empty());
}

#[test]
fn door_unreadable_storage_defaults_to_off() {
    let mut storage = MockStorage::new();
    storage.read_fails = true;
    let rig = DoorRig::with_storage(false, storage);
    assert!(!rig.hw.led);
}

#[test]
fn door_failed_flag_fetch_keeps_last_known_value() {
    let mut rig = DoorRig::new(true);
    let t = rig.run_dwell(0);
    assert!(rig.hw.led);

    // The store goes away; the alarm holds on the last decoded value.
    rig.http.fail_gets = u32::MAX;
    rig.poll(t);
    rig.poll(t + 500);
    assert!(rig.service.alarm_active());
}

#[test]
fn door_env_telemetry_every_thirty_seconds() {
    let mut rig = DoorRig::new(false);
    for t in (0..30_000).step_by(5_000) {
        rig.poll(t);
    }
    assert!(rig.pubsub.on_topic(ENV_TOPIC).is_empty());

    rig.poll(30_000);
    let samples = rig.pubsub.on_topic(ENV_TOPIC);
    assert_eq!(samples.len(), 1);
    let v: serde_json::Value = serde_json::from_slice(samples[0]).unwrap();
    assert_eq!(v["temperature"], 24.0);
    assert_eq!(v["humidity"], 55.0);
    assert!(v.get("temperature_c").is_none(), "feed keys carry no unit suffix");

    // Nothing more until the next interval boundary.
    rig.poll(45_000);
    assert_eq!(rig.pubsub.on_topic(ENV_TOPIC).len(), 1);
    rig.poll(60_000);
    assert_eq!(rig.pubsub.on_topic(ENV_TOPIC).len(), 2);
}

#[test]
fn door_env_read_failure_skips_the_sample() {
    let mut rig = DoorRig::new(false);
    rig.hw.temperature_c = f32::NAN;
    rig.poll(30_000);
    assert!(rig.pubsub.on_topic(ENV_TOPIC).is_empty());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::EnvSample(_))), 0);

    // The sensor recovers; the next interval publishes normally.
    rig.hw.temperature_c = 22.0;
    rig.poll(60_000);
    assert_eq!(rig.pubsub.on_topic(ENV_TOPIC).len(), 1);
}
