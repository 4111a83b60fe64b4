/// Narrow capability traits for the hardware the controller drives.
/// Firmware implements them over ESP-IDF; tests implement them in memory.
use anyhow::Result;
use std::time::Duration;

use crate::price::FetchOutcome;
use crate::render::TextSize;

/// Drawing primitives of the LCD. Colors are RGB565.
pub trait DisplaySurface {
    fn clear(&mut self, color: u16) -> Result<()>;
    fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) -> Result<()>;
    fn draw_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) -> Result<()>;
    /// `x`/`y` is the top-left corner of the first glyph
    fn draw_text(&mut self, x: u16, y: u16, text: &str, size: TextSize, color: u16) -> Result<()>;
}

/// WiFi station link
pub trait NetworkLink {
    /// Begin joining the network; returns without waiting for the result
    fn start_association(&mut self, ssid: &str, password: &str) -> Result<()>;
    fn is_associated(&self) -> bool;
    fn local_address(&self) -> Option<String>;
}

/// One round trip to the price API, no retries
pub trait PriceClient {
    fn fetch_current_price(&mut self) -> FetchOutcome;
}

/// Monotonic time source and the single place the loop blocks
pub trait Clock {
    /// Time since boot
    fn now(&self) -> Duration;
    fn sleep(&mut self, duration: Duration);
}
