/// Configuration structures loaded once at startup and validated before use
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::render::PriceScale;

pub const DEFAULT_API_URL: &str = "https://api.tibber.com/v1-beta/gql";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("WiFi SSID is empty")]
    MissingSsid,
    #[error("API token is empty")]
    MissingToken,
    #[error("API URL must use https: {0}")]
    InsecureUrl(String),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("poll interval ({poll}s) must be shorter than update interval ({update}s)")]
    PollNotShorter { poll: u32, update: u32 },
    #[error("panel dimensions must be non-zero")]
    EmptyPanel,
    #[error("rotation {0} out of range 0..=3")]
    BadRotation(u8),
    #[error("pin {0} assigned twice")]
    DuplicatePin(i32),
    #[error("price thresholds out of order")]
    BadThresholds,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceApiConfig {
    pub url: String,
    pub token: String,
}

impl Default for PriceApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            token: String::new(),
        }
    }
}

/// Panel wiring and geometry for the GC9A01
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayConfig {
    /// SPI peripheral (2 or 3 on the ESP32-S3)
    pub spi_host: u8,
    pub baudrate_hz: u32,
    pub pin_sck: i32,
    pub pin_mosi: i32,
    pub pin_dc: i32,
    pub pin_cs: i32,
    pub pin_rst: i32,
    pub pin_backlight: i32,
    pub width: u16,
    pub height: u16,
    /// Quarter turns clockwise
    pub rotation: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            spi_host: 2,
            baudrate_hz: 20_000_000,
            pin_sck: 10,
            pin_mosi: 11,
            pin_dc: 8,
            pin_cs: 9,
            pin_rst: 12,
            pin_backlight: 40,
            width: 240,
            height: 240,
            rotation: 0,
        }
    }
}

impl DisplayConfig {
    /// Checks only what the panel driver needs, so a bad network or API
    /// section can still be reported on screen
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyPanel);
        }
        if self.rotation > 3 {
            return Err(ConfigError::BadRotation(self.rotation));
        }
        let pins = self.pins();
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(ConfigError::DuplicatePin(*pin));
            }
        }
        Ok(())
    }

    fn pins(&self) -> [i32; 6] {
        [
            self.pin_sck,
            self.pin_mosi,
            self.pin_dc,
            self.pin_cs,
            self.pin_rst,
            self.pin_backlight,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollConfig {
    pub update_interval_secs: u32,
    pub poll_interval_secs: u32,
    pub association_timeout_secs: u32,
    /// Delay before touching any hardware after reset
    pub boot_settle_ms: u32,
    pub cheap_below: u32,
    pub expensive_from: u32,
    pub bar_max: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        let scale = PriceScale::default();
        Self {
            update_interval_secs: 300,
            poll_interval_secs: 10,
            association_timeout_secs: 15,
            boot_settle_ms: 2000,
            cheap_below: scale.cheap_below,
            expensive_from: scale.expensive_from,
            bar_max: scale.bar_max,
        }
    }
}

impl PollConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs as u64)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs as u64)
    }

    pub fn price_scale(&self) -> PriceScale {
        PriceScale {
            cheap_below: self.cheap_below,
            expensive_from: self.expensive_from,
            bar_max: self.bar_max,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub price_api: PriceApiConfig,
    pub display: DisplayConfig,
    pub poll: PollConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.wifi_ssid.is_empty() {
            return Err(ConfigError::MissingSsid);
        }
        if self.price_api.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if !self.price_api.url.starts_with("https://") {
            return Err(ConfigError::InsecureUrl(self.price_api.url.clone()));
        }

        let poll = &self.poll;
        if poll.update_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("update interval"));
        }
        if poll.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("poll interval"));
        }
        if poll.association_timeout_secs == 0 {
            return Err(ConfigError::ZeroInterval("association timeout"));
        }
        if poll.poll_interval_secs >= poll.update_interval_secs {
            return Err(ConfigError::PollNotShorter {
                poll: poll.poll_interval_secs,
                update: poll.update_interval_secs,
            });
        }
        if poll.bar_max == 0 || poll.cheap_below > poll.expensive_from {
            return Err(ConfigError::BadThresholds);
        }

        self.display.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.network.wifi_ssid = "home".to_string();
        config.network.wifi_password = "secret".to_string();
        config.price_api.token = "token".to_string();
        config
    }

    #[test]
    fn test_defaults_match_board() {
        let config = AppConfig::default();
        assert_eq!(config.display.width, 240);
        assert_eq!(config.display.pin_backlight, 40);
        assert_eq!(config.poll.update_interval(), Duration::from_secs(300));
        assert_eq!(config.poll.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.poll.price_scale(), PriceScale::default());
        assert_eq!(config.price_api.url, DEFAULT_API_URL);
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn test_credentials_required() {
        assert_eq!(AppConfig::default().validate(), Err(ConfigError::MissingSsid));

        let mut config = valid();
        config.price_api.token.clear();
        assert_eq!(config.validate(), Err(ConfigError::MissingToken));
    }

    #[test]
    fn test_poll_must_be_shorter_than_update() {
        let mut config = valid();
        config.poll.poll_interval_secs = 300;
        assert_eq!(
            config.validate(),
            Err(ConfigError::PollNotShorter { poll: 300, update: 300 })
        );
    }

    #[test]
    fn test_duplicate_pin_rejected() {
        let mut config = valid();
        config.display.pin_cs = config.display.pin_dc;
        assert_eq!(config.validate(), Err(ConfigError::DuplicatePin(8)));
    }

    #[test]
    fn test_display_section_checked_alone() {
        // Missing credentials do not stop the panel from coming up
        assert_eq!(AppConfig::default().display.validate(), Ok(()));

        let mut config = valid();
        config.display.rotation = 4;
        assert_eq!(config.display.validate(), Err(ConfigError::BadRotation(4)));
        assert_eq!(config.validate(), Err(ConfigError::BadRotation(4)));
    }

    #[test]
    fn test_plain_http_rejected() {
        let mut config = valid();
        config.price_api.url = "http://api.tibber.com/v1-beta/gql".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InsecureUrl(_))));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"network":{"wifi_ssid":"home","wifi_password":""}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.network.wifi_ssid, "home");
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = valid();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
