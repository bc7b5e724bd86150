//! AC node firmware entry point.
//!
//! Boot order: ESP-IDF bootstrap → WiFi station → adapters → service, then
//! the single cooperative loop. Each iteration samples the sensor, advances
//! the detector, and syncs the remote flag; nothing here runs on another
//! thread or interrupt.

use anyhow::Result;
use log::info;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use doorlink::adapters::hardware::HardwareAdapter;
use doorlink::adapters::http::HttpAdapter;
use doorlink::adapters::log_sink::LogEventSink;
use doorlink::adapters::mqtt::MqttAdapter;
use doorlink::adapters::spiffs::SpiffsAdapter;
use doorlink::adapters::time::MonotonicClock;
use doorlink::adapters::wifi::WifiAdapter;
use doorlink::app::ports::{ConfigPort, ConnectivityPort};
use doorlink::app::service::AcNodeService;
use doorlink::config::NodeConfig;

const LOOP_PERIOD_MS: u64 = 100;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("doorlink AC node v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let storage = SpiffsAdapter::new();
    let config = storage.load(NodeConfig::ac_node());

    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs))?,
        sys_loop,
    )?;
    let mut wifi = WifiAdapter::new(wifi, &config)?;
    wifi.connect()?;

    let mut hw = HardwareAdapter::new()?;
    let mut mqtt = MqttAdapter::new(&config);
    let mut http = HttpAdapter::new()?;
    let mut sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    let mut service = AcNodeService::new(config);
    service.start(&mut sink);

    loop {
        wifi.ensure_connected();
        service.poll(clock.now_ms(), &mut hw, &mut mqtt, &mut http, &mut sink);
        esp_idf_hal::delay::FreeRtos::delay_ms(LOOP_PERIOD_MS as u32);
    }
}
