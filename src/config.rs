use anyhow::Result;
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

use elpris_core::config::AppConfig;

const CONFIG_NAMESPACE: &str = "elpris";
const CONFIG_KEY: &str = "config";
const MAX_CONFIG_BYTES: usize = 2048;

/// Defaults with the secrets compiled in by build.rs
fn compiled_defaults() -> AppConfig {
    // These come from wifi_config.h which should NOT be committed to git
    let mut config = AppConfig::default();
    config.network.wifi_ssid = env!("WIFI_SSID").to_string();
    config.network.wifi_password = env!("WIFI_PASSWORD").to_string();
    config.price_api.token = env!("TIBBER_TOKEN").to_string();
    config
}

/// Load the stored configuration, falling back to compiled defaults.
/// Empty stored secrets are filled from the compiled ones and written back.
pub fn load_or_default(partition: EspDefaultNvsPartition) -> Result<AppConfig> {
    let mut nvs = EspNvs::new(partition, CONFIG_NAMESPACE, true)?;
    let defaults = compiled_defaults();

    match load_from_nvs(&nvs) {
        Ok(mut config) => {
            log::info!("Loaded configuration from NVS");

            let mut patched = false;
            if config.network.wifi_ssid.is_empty() {
                config.network.wifi_ssid = defaults.network.wifi_ssid;
                config.network.wifi_password = defaults.network.wifi_password;
                patched = true;
            }
            if config.price_api.token.is_empty() {
                config.price_api.token = defaults.price_api.token;
                patched = true;
            }

            if patched {
                log::warn!("NVS secrets empty, using compiled defaults: SSID='{}'", config.network.wifi_ssid);
                if let Err(e) = save_to_nvs(&mut nvs, &config) {
                    log::warn!("Failed to save patched config: {:?}", e);
                }
            }
            Ok(config)
        }
        Err(e) => {
            log::warn!("Failed to load config from NVS: {:?}, using defaults", e);

            // Try to save default config to NVS for next time
            if let Err(save_err) = save_to_nvs(&mut nvs, &defaults) {
                log::warn!("Failed to save default config to NVS: {:?}", save_err);
            }
            Ok(defaults)
        }
    }
}

fn load_from_nvs(nvs: &EspNvs<NvsDefault>) -> Result<AppConfig> {
    let mut buf = vec![0u8; MAX_CONFIG_BYTES];
    let data = nvs.get_blob(CONFIG_KEY, &mut buf)?
        .ok_or_else(|| anyhow::anyhow!("Config not found in NVS"))?;

    let config: AppConfig = serde_json::from_slice(data)?;
    Ok(config)
}

fn save_to_nvs(nvs: &mut EspNvs<NvsDefault>, config: &AppConfig) -> Result<()> {
    let json = serde_json::to_vec(config)?;
    nvs.set_blob(CONFIG_KEY, &json)?;
    log::info!("Configuration saved to NVS");
    Ok(())
}

/// Secrets are never logged in full
pub fn log_summary(config: &AppConfig) {
    log::info!(
        "WiFi: SSID='{}', Password={}",
        config.network.wifi_ssid,
        if config.network.wifi_password.is_empty() { "<empty>" } else { "<set>" }
    );
    log::info!(
        "Price API: {} (token {})",
        config.price_api.url,
        if config.price_api.token.is_empty() { "<empty>" } else { "<set>" }
    );
    log::info!(
        "Intervals: update {}s, poll {}s, association timeout {}s",
        config.poll.update_interval_secs,
        config.poll.poll_interval_secs,
        config.poll.association_timeout_secs
    );
}
