use anyhow::{anyhow, bail, Result};
use embedded_graphics::mono_font::{ascii::FONT_10X20, MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::config::{Config as SpiConfig, DriverConfig};
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SPI2, SPI3};
use mipidsi::{Builder, ColorInversion, Orientation};
use display_interface_spi::SPIInterface;
use profont::PROFONT_24_POINT;

use elpris_core::config::DisplayConfig;
use elpris_core::render::TextSize;
use elpris_core::DisplaySurface;

const REGULAR_FONT: &MonoFont<'static> = &FONT_10X20;
const VALUE_FONT: &MonoFont<'static> = &PROFONT_24_POINT;

pub const GLYPH_WIDTH: u16 = REGULAR_FONT.character_size.width as u16;
pub const GLYPH_HEIGHT: u16 = REGULAR_FONT.character_size.height as u16;
pub const VALUE_GLYPH_WIDTH: u16 = VALUE_FONT.character_size.width as u16;
pub const VALUE_GLYPH_HEIGHT: u16 = VALUE_FONT.character_size.height as u16;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;
type Spi = SpiDeviceDriver<'static, SpiDriver<'static>>;
type Panel = mipidsi::Display<SPIInterface<Spi, OutPin, OutPin>, mipidsi::models::GC9A01, OutPin>;

// Convert our u16 colors to Rgb565
fn u16_to_rgb565(color: u16) -> Rgb565 {
    let (r, g, b) = elpris_core::color::rgb565_channels(color);
    Rgb565::new(r, g, b)
}

fn orientation(rotation: u8) -> Orientation {
    match rotation {
        1 => Orientation::Landscape(false),
        2 => Orientation::PortraitInverted(false),
        3 => Orientation::LandscapeInverted(false),
        _ => Orientation::Portrait(false),
    }
}

/// Pin numbers come from configuration, so the typed pins are built here
fn output_pin(pin: i32) -> AnyOutputPin {
    // SAFETY: config validation guarantees each pin is claimed once
    unsafe { AnyOutputPin::new(pin) }
}

/// GC9A01 round panel on SPI
pub struct DisplayManager {
    display: Panel,
    _backlight_pin: OutPin,
}

impl DisplayManager {
    pub fn new(spi2: SPI2, spi3: SPI3, config: &DisplayConfig) -> Result<Self> {
        log::info!(
            "Initializing GC9A01 {}x{} on SPI{} (SCK {}, MOSI {}, DC {}, CS {}, RST {})",
            config.width, config.height, config.spi_host,
            config.pin_sck, config.pin_mosi, config.pin_dc, config.pin_cs, config.pin_rst
        );

        // Backlight first, kept on for the lifetime of the display
        let mut backlight_pin = PinDriver::output(output_pin(config.pin_backlight))?;
        backlight_pin.set_high()?;

        let sclk = output_pin(config.pin_sck);
        let sdo = output_pin(config.pin_mosi);
        let bus_config = DriverConfig::new();
        let driver = match config.spi_host {
            2 => SpiDriver::new(spi2, sclk, sdo, None::<AnyIOPin>, &bus_config)?,
            3 => SpiDriver::new(spi3, sclk, sdo, None::<AnyIOPin>, &bus_config)?,
            other => bail!("SPI{} is not available for the display", other),
        };
        let spi = SpiDeviceDriver::new(
            driver,
            None::<AnyOutputPin>,
            &SpiConfig::new().baudrate(config.baudrate_hz.Hz()),
        )?;

        let dc_pin = PinDriver::output(output_pin(config.pin_dc))?;
        let cs_pin = PinDriver::output(output_pin(config.pin_cs))?;
        let rst_pin = PinDriver::output(output_pin(config.pin_rst))?;
        let spi_interface = SPIInterface::new(spi, dc_pin, cs_pin);

        let mut delay = FreeRtos;
        let mut display = Builder::gc9a01(spi_interface)
            .with_display_size(config.width, config.height)
            .with_orientation(orientation(config.rotation))
            .with_invert_colors(ColorInversion::Inverted)
            .init(&mut delay, Some(rst_pin))
            .map_err(|e| anyhow!("GC9A01 init failed: {:?}", e))?;

        display
            .clear(Rgb565::BLACK)
            .map_err(|e| anyhow!("GC9A01 first clear failed: {:?}", e))?;

        log::info!("Display OK");
        Ok(Self {
            display,
            _backlight_pin: backlight_pin,
        })
    }
}

impl DisplaySurface for DisplayManager {
    fn clear(&mut self, color: u16) -> Result<()> {
        self.display
            .clear(u16_to_rgb565(color))
            .map_err(|e| anyhow!("clear failed: {:?}", e))
    }

    fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) -> Result<()> {
        Rectangle::new(Point::new(x as i32, y as i32), Size::new(width as u32, height as u32))
            .into_styled(PrimitiveStyle::with_fill(u16_to_rgb565(color)))
            .draw(&mut self.display)
            .map_err(|e| anyhow!("fill_rect failed: {:?}", e))
    }

    fn draw_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) -> Result<()> {
        Rectangle::new(Point::new(x as i32, y as i32), Size::new(width as u32, height as u32))
            .into_styled(PrimitiveStyle::with_stroke(u16_to_rgb565(color), 1))
            .draw(&mut self.display)
            .map_err(|e| anyhow!("draw_rect failed: {:?}", e))
    }

    fn draw_text(&mut self, x: u16, y: u16, text: &str, size: TextSize, color: u16) -> Result<()> {
        let font = match size {
            TextSize::Regular => REGULAR_FONT,
            TextSize::Large => VALUE_FONT,
        };
        let style = MonoTextStyle::new(font, u16_to_rgb565(color));
        Text::with_baseline(text, Point::new(x as i32, y as i32), style, Baseline::Top)
            .draw(&mut self.display)
            .map_err(|e| anyhow!("draw_text failed: {:?}", e))?;
        Ok(())
    }
}
