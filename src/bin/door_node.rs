//! Door node firmware entry point.
//!
//! Same bootstrap shape as the AC node, plus the restore path: before the
//! first loop iteration the persisted LED state comes back from SPIFFS and
//! the remote flag is fetched once, so the outputs are correct immediately
//! after a power cycle.

use anyhow::Result;
use log::info;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use doorlink::adapters::hardware::HardwareAdapter;
use doorlink::adapters::http::HttpAdapter;
use doorlink::adapters::log_sink::LogEventSink;
use doorlink::adapters::mqtt::MqttAdapter;
use doorlink::adapters::notify::CallmebotNotifier;
use doorlink::adapters::spiffs::SpiffsAdapter;
use doorlink::adapters::time::MonotonicClock;
use doorlink::adapters::wifi::WifiAdapter;
use doorlink::app::ports::{ConfigPort, ConnectivityPort};
use doorlink::app::service::DoorNodeService;
use doorlink::config::NodeConfig;

const LOOP_PERIOD_MS: u64 = 100;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("doorlink door node v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut storage = SpiffsAdapter::new();
    let config = storage.load(NodeConfig::door_node());

    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs))?,
        sys_loop,
    )?;
    let mut wifi = WifiAdapter::new(wifi, &config)?;
    wifi.connect()?;

    let mut hw = HardwareAdapter::new()?;
    let mut mqtt = MqttAdapter::new(&config);
    let mut http = HttpAdapter::new()?;
    let mut notify = CallmebotNotifier::new(HttpAdapter::new()?, &config);
    let mut sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    let mut service = DoorNodeService::new(config);
    service.start(&storage, &mut hw, &mut http, &mut sink);

    loop {
        wifi.ensure_connected();
        service.poll(
            clock.now_ms(),
            &mut hw,
            &mut mqtt,
            &mut http,
            &mut storage,
            &mut notify,
            &mut sink,
        );
        esp_idf_hal::delay::FreeRtos::delay_ms(LOOP_PERIOD_MS as u32);
    }
}
