//! In-memory stand-ins for the display, WiFi, price API and clock.

use anyhow::{bail, Result};
use chrono::DateTime;
use std::cell::Cell;
use std::collections::VecDeque;
use std::time::Duration;

use crate::config::AppConfig;
use crate::display_math::Rect;
use crate::price::{FetchError, FetchOutcome, Price};
use crate::render::{DrawCommand, TextSize};
use crate::surface::{Clock, DisplaySurface, NetworkLink, PriceClient};

/// A price valid from 14:00 CET
pub fn price(total: f64) -> Price {
    let at = DateTime::parse_from_rfc3339("2024-01-15T14:00:00+01:00").expect("valid timestamp");
    Price::new(total, at).expect("non-negative price")
}

/// Defaults plus credentials, so it validates
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.network.wifi_ssid = "test-ssid".to_string();
    config.network.wifi_password = "test-password".to_string();
    config.price_api.token = "test-token".to_string();
    config
}

/// Records every draw call
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
    /// Every call fails
    pub fail: bool,
    /// Drawing exactly this text fails
    pub reject_text: Option<String>,
}

impl RecordingSurface {
    fn record(&mut self, command: DrawCommand) -> Result<()> {
        if self.fail {
            bail!("SPI write failed");
        }
        if let (DrawCommand::Text { text, .. }, Some(rejected)) = (&command, &self.reject_text) {
            if text == rejected {
                bail!("glyph upload failed");
            }
        }
        self.commands.push(command);
        Ok(())
    }

    /// Text drawn since the most recent clear
    pub fn last_texts(&self) -> Vec<&str> {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Clear { .. }))
            .unwrap_or(0);
        self.commands[start..]
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear { .. }))
            .count()
    }
}

impl DisplaySurface for RecordingSurface {
    fn clear(&mut self, color: u16) -> Result<()> {
        self.record(DrawCommand::Clear { color })
    }

    fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) -> Result<()> {
        self.record(DrawCommand::FillRect { rect: Rect::new(x, y, width, height), color })
    }

    fn draw_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) -> Result<()> {
        self.record(DrawCommand::DrawRect { rect: Rect::new(x, y, width, height), color })
    }

    fn draw_text(&mut self, x: u16, y: u16, text: &str, size: TextSize, color: u16) -> Result<()> {
        self.record(DrawCommand::Text { x, y, text: text.to_string(), size, color })
    }
}

/// WiFi link that joins after a fixed number of status checks
#[derive(Debug, Default)]
pub struct FakeLink {
    /// Status checks that report "not yet" before joining; `None` never joins
    pub joins_after: Option<u32>,
    pub address: Option<String>,
    pub fail_start: bool,
    /// Link lost after joining
    pub dropped: bool,
    pub start_calls: u32,
    checks: Cell<u32>,
    checks_at_start: u32,
}

impl FakeLink {
    pub fn joining_after(checks: u32) -> Self {
        Self {
            joins_after: Some(checks),
            address: Some("192.168.1.50".to_string()),
            ..Default::default()
        }
    }

    pub fn never_joining() -> Self {
        Self::default()
    }

    pub fn checks(&self) -> u32 {
        self.checks.get()
    }

    /// Status checks made since the last `start_association`
    pub fn checks_after_start(&self) -> u32 {
        self.checks.get() - self.checks_at_start
    }
}

impl NetworkLink for FakeLink {
    fn start_association(&mut self, _ssid: &str, _password: &str) -> Result<()> {
        self.start_calls += 1;
        self.checks_at_start = self.checks.get();
        if self.fail_start {
            bail!("wifi driver busy");
        }
        Ok(())
    }

    fn is_associated(&self) -> bool {
        let previous = self.checks.get();
        self.checks.set(previous + 1);
        if self.dropped {
            return false;
        }
        matches!(self.joins_after, Some(after) if previous >= after)
    }

    fn local_address(&self) -> Option<String> {
        self.address.clone()
    }
}

/// Replays queued outcomes, then reports API errors
#[derive(Debug, Default)]
pub struct ScriptedClient {
    outcomes: VecDeque<FetchOutcome>,
    pub calls: u32,
}

impl ScriptedClient {
    pub fn new(outcomes: Vec<FetchOutcome>) -> Self {
        Self {
            outcomes: outcomes.into(),
            calls: 0,
        }
    }
}

impl PriceClient for ScriptedClient {
    fn fetch_current_price(&mut self) -> FetchOutcome {
        self.calls += 1;
        self.outcomes
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::ApiError("no scripted response".to_string())))
    }
}

/// Clock that only moves when slept on
#[derive(Debug, Default)]
pub struct ManualClock {
    pub now: Duration,
    pub sleeps: Vec<Duration>,
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.now += duration;
    }
}
