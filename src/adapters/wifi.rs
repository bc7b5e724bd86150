//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`] over the blocking ESP-IDF WiFi driver.
//! Connection loss is handled inline: `ensure_connected` runs once per loop
//! iteration and blocks until the station is back up, matching the
//! single-threaded model where nothing useful can happen offline anyway.
//!
//! ## cfg gating
//!
//! - **`espidf`**: real `esp_idf_svc::wifi::BlockingWifi` calls.
//! - **all other targets**: an in-memory stub for host-side tests.

use log::{info, warn};

use crate::app::ports::ConnectivityPort;
use crate::config::NodeConfig;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Credential validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// SSID must be 1-32 printable ASCII bytes; password empty (open network)
/// or 8-64 bytes (WPA2).
pub fn validate_credentials(ssid: &str, password: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CommsError::WifiConnectFailed);
    }
    if !password.is_empty() && (password.len() < 8 || password.len() > 64) {
        return Err(CommsError::WifiConnectFailed);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(feature = "espidf")]
    wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    #[cfg(not(feature = "espidf"))]
    sim_connected: bool,
}

impl WifiAdapter {
    #[cfg(feature = "espidf")]
    pub fn new(
        wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
        config: &NodeConfig,
    ) -> Result<Self, CommsError> {
        let (ssid, password) = copy_credentials(config)?;
        Ok(Self { ssid, password, wifi })
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new(config: &NodeConfig) -> Result<Self, CommsError> {
        let (ssid, password) = copy_credentials(config)?;
        Ok(Self {
            ssid,
            password,
            sim_connected: false,
        })
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(feature = "espidf")]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: self.ssid.clone(),
            password: self.password.clone(),
            auth_method,
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|_| CommsError::WifiConnectFailed)?;
        self.wifi.start().map_err(|_| CommsError::WifiConnectFailed)?;
        self.wifi
            .connect()
            .map_err(|_| CommsError::WifiConnectFailed)?;
        self.wifi
            .wait_netif_up()
            .map_err(|_| CommsError::WifiConnectFailed)?;
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        self.sim_connected = true;
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_connected
    }
}

fn copy_credentials(
    config: &NodeConfig,
) -> Result<(heapless::String<32>, heapless::String<64>), CommsError> {
    validate_credentials(&config.wifi_ssid, &config.wifi_password)?;
    let ssid = heapless::String::try_from(config.wifi_ssid.as_str())
        .map_err(|()| CommsError::WifiConnectFailed)?;
    let password = heapless::String::try_from(config.wifi_password.as_str())
        .map_err(|()| CommsError::WifiConnectFailed)?;
    Ok((ssid, password))
}

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), CommsError> {
        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed: {e}");
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn ensure_connected(&mut self) {
        if self.platform_is_connected() {
            return;
        }
        warn!("WiFi: link down, reconnecting");
        // Blocking retry: the loop has nothing to do without the network.
        while self.platform_connect().is_err() {
            warn!("WiFi: reconnect failed, retrying");
            #[cfg(feature = "espidf")]
            std::thread::sleep(std::time::Duration::from_secs(2));
        }
        info!("WiFi: reconnected");
    }
}
