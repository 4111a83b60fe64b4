use anyhow::Result;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    wifi::{
        ClientConfiguration, Configuration, EspWifi,
        AuthMethod, BlockingWifi,
    },
    nvs::EspDefaultNvsPartition,
};

use elpris_core::NetworkLink;

/// WiFi station. Association is started here and polled by the controller.
pub struct WifiManager {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl WifiManager {
    pub fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self> {
        log::info!("Initializing WiFi station");
        let esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs))?;
        let wifi = BlockingWifi::wrap(esp_wifi, sys_loop)?;
        Ok(Self { wifi })
    }
}

impl NetworkLink for WifiManager {
    fn start_association(&mut self, ssid: &str, password: &str) -> Result<()> {
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into()
                .map_err(|e| {
                    log::error!("Failed to convert SSID '{}': {:?}", ssid, e);
                    anyhow::anyhow!("Invalid SSID format: {}", ssid)
                })?,
            password: password.try_into()
                .map_err(|e| {
                    log::error!("Failed to convert password: {:?}", e);
                    anyhow::anyhow!("Invalid password format")
                })?,
            auth_method: if password.is_empty() {
                log::warn!("WiFi password is empty, using open network");
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });

        self.wifi.set_configuration(&cfg)?;
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }

        // Non-blocking: the inner driver only kicks off the join
        self.wifi.wifi_mut().connect()?;
        Ok(())
    }

    /// Joined and the interface has an address
    fn is_associated(&self) -> bool {
        match (self.wifi.is_connected(), self.wifi.is_up()) {
            (Ok(connected), Ok(up)) => connected && up,
            (Err(e), _) | (_, Err(e)) => {
                log::debug!("WiFi status query failed: {:?}", e);
                false
            }
        }
    }

    fn local_address(&self) -> Option<String> {
        self.wifi.wifi().sta_netif().get_ip_info().ok()
            .map(|ip_info| format!("{}", ip_info.ip))
    }
}
