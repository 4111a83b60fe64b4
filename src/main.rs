use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::prelude::*;
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use esp_idf_sys as _; // Binstart

use log::info;

use elpris_core::render::{Layout, Renderer};
use elpris_core::{Controller, ControllerError};

// Generate ESP-IDF app descriptor
#[allow(unexpected_cfgs)]
mod app_desc {
    esp_idf_sys::esp_app_desc!();
}

mod clock;
mod config;
mod display_mipidsi;
mod logging;
mod network;
mod version;

use crate::clock::SystemClock;
use crate::display_mipidsi::{DisplayManager, GLYPH_HEIGHT, GLYPH_WIDTH, VALUE_GLYPH_HEIGHT, VALUE_GLYPH_WIDTH};
use crate::network::{TibberClient, WifiManager};

fn main() -> Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();

    logging::init_logger().map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;
    info!("=== Starting Tibber Display {} ===", version::full_version());

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let config = config::load_or_default(nvs.clone())?;
    config::log_summary(&config);
    // The rest of the config is checked at boot, where it can be shown on screen
    if let Err(e) = config.display.validate() {
        log::error!("FATAL: display configuration unusable: {}", e);
        return Err(e.into());
    }

    // Let supply rails settle before touching the panel
    FreeRtos::delay_ms(config.poll.boot_settle_ms);

    let display = match DisplayManager::new(peripherals.spi2, peripherals.spi3, &config.display) {
        Ok(display) => display,
        Err(e) => {
            log::error!("FATAL: display hardware init failed: {:#}", e);
            return Err(e);
        }
    };

    let wifi = WifiManager::new(peripherals.modem, sys_loop, nvs)?;
    let client = TibberClient::new(&config.price_api);
    let renderer = Renderer::new(
        Layout::new(config.display.width, config.display.height, GLYPH_WIDTH, GLYPH_HEIGHT)
            .with_value_glyph(VALUE_GLYPH_WIDTH, VALUE_GLYPH_HEIGHT),
        config.poll.price_scale(),
    );

    let mut controller = Controller::new(display, wifi, client, SystemClock::new(), renderer, &config);
    match controller.boot() {
        Ok(()) => controller.run(),
        Err(e @ (ControllerError::InvalidConfig(_) | ControllerError::AssociationTimeout(_))) => {
            // Keeps the backlight pin and panel owned so the error stays visible
            log::error!("Cannot start price loop: {}", e);
            controller.idle()
        }
        Err(e) => {
            log::error!("FATAL: {}", e);
            Err(e.into())
        }
    }
}
