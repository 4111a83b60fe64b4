//! Screen layouts as pure data.
//!
//! Rendering produces a [`Frame`], an ordered list of draw calls that always
//! starts with a full clear. Painting replays it on a [`DisplaySurface`].

use anyhow::Result;

use crate::color::{self, BACKGROUND};
use crate::display_math::{centered_x, Rect};
use crate::price::{FetchOutcome, Price};
use crate::surface::DisplaySurface;

pub const TITLE: &str = "ELPRIS";
pub const UNIT_LABEL: &str = "ore/kWh";
pub const ERROR_LABEL: &str = "API Error";
pub const FAULT_LABEL: &str = "ERROR";
pub const CONNECTING_LABEL: &str = "WiFi...";
pub const CONNECTED_LABEL: &str = "Connected";
pub const ASSOCIATION_FAILED_LABEL: &str = "WiFi Fail";
pub const CONFIG_ERROR_LABEL: &str = "Config Error";

/// Layouts are designed for a 240px square panel and scaled vertically
const REFERENCE_HEIGHT: u32 = 240;
const HEADER_HEIGHT: u16 = 40;
const MESSAGE_Y: u16 = 100;
const DETAIL_Y: u16 = 130;
const VALUE_Y: u16 = 80;
const UNIT_Y: u16 = 120;
const BAR_Y: u16 = 170;
const BAR_WIDTH: u16 = 180;
const BAR_HEIGHT: u16 = 30;
const BAR_BORDER: u16 = 2;
const VALID_FROM_Y: u16 = 206;

/// Price bands and bar scale, all in minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceScale {
    /// Prices below this are cheap
    pub cheap_below: u32,
    /// Prices at or above this are expensive
    pub expensive_from: u32,
    /// Price that fills the bar completely
    pub bar_max: u32,
}

impl Default for PriceScale {
    fn default() -> Self {
        Self {
            cheap_below: 50,
            expensive_from: 100,
            bar_max: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Cheap,
    Moderate,
    Expensive,
}

impl Severity {
    /// Half-open bands: a price on a threshold belongs to the higher band
    pub fn classify(minor: u32, scale: &PriceScale) -> Self {
        if minor < scale.cheap_below {
            Severity::Cheap
        } else if minor < scale.expensive_from {
            Severity::Moderate
        } else {
            Severity::Expensive
        }
    }

    pub fn color(self) -> u16 {
        match self {
            Severity::Cheap => color::GREEN,
            Severity::Moderate => color::YELLOW,
            Severity::Expensive => color::RED,
        }
    }
}

/// Width of the filled part of a bar with `fillable` pixels, clamped to `fillable`
pub fn bar_fill_width(minor: u32, scale: &PriceScale, fillable: u16) -> u16 {
    let max = scale.bar_max.max(1) as u64;
    let filled = minor as u64 * fillable as u64 / max;
    filled.min(fillable as u64) as u16
}

/// Font a text command is drawn with; `Large` is used for the price value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Regular,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    Clear { color: u16 },
    FillRect { rect: Rect, color: u16 },
    DrawRect { rect: Rect, color: u16 },
    Text { x: u16, y: u16, text: String, size: TextSize, color: u16 },
}

/// A full repaint of the screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    commands: Vec<DrawCommand>,
}

impl Frame {
    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// All text drawn by this frame, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn paint<S: DisplaySurface + ?Sized>(&self, surface: &mut S) -> Result<()> {
        for command in &self.commands {
            match command {
                DrawCommand::Clear { color } => surface.clear(*color)?,
                DrawCommand::FillRect { rect, color } => {
                    surface.fill_rect(rect.x, rect.y, rect.width, rect.height, *color)?
                }
                DrawCommand::DrawRect { rect, color } => {
                    surface.draw_rect(rect.x, rect.y, rect.width, rect.height, *color)?
                }
                DrawCommand::Text { x, y, text, size, color } => {
                    surface.draw_text(*x, *y, text, *size, *color)?
                }
            }
        }
        Ok(())
    }
}

/// What the screen should show
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Connecting,
    Connected { address: Option<String> },
    AssociationFailed,
    ConfigError,
    Price(Price),
    FetchFailed,
    Fault,
}

impl Screen {
    pub fn from_outcome(outcome: &FetchOutcome) -> Self {
        match outcome {
            Ok(price) => Screen::Price(price.clone()),
            Err(_) => Screen::FetchFailed,
        }
    }
}

/// Panel geometry and font metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: u16,
    pub height: u16,
    pub glyph_width: u16,
    pub glyph_height: u16,
    pub value_glyph_width: u16,
    pub value_glyph_height: u16,
}

impl Layout {
    /// Until [`with_value_glyph`](Self::with_value_glyph) is called the value
    /// uses the regular font
    pub fn new(width: u16, height: u16, glyph_width: u16, glyph_height: u16) -> Self {
        Self {
            width,
            height,
            glyph_width,
            glyph_height,
            value_glyph_width: glyph_width,
            value_glyph_height: glyph_height,
        }
    }

    pub fn with_value_glyph(mut self, width: u16, height: u16) -> Self {
        self.value_glyph_width = width;
        self.value_glyph_height = height;
        self
    }

    fn y(&self, reference: u16) -> u16 {
        (reference as u32 * self.height as u32 / REFERENCE_HEIGHT) as u16
    }

    fn centered(&self, text: &str, size: TextSize) -> u16 {
        let glyph_width = match size {
            TextSize::Regular => self.glyph_width,
            TextSize::Large => self.value_glyph_width,
        };
        centered_x(self.width, text.chars().count(), glyph_width)
    }

    pub fn header(&self) -> Rect {
        Rect::new(0, 0, self.width, self.y(HEADER_HEIGHT))
    }

    /// Outline of the price bar
    pub fn bar(&self) -> Rect {
        let width = BAR_WIDTH.min(self.width);
        Rect::new((self.width - width) / 2, self.y(BAR_Y), width, BAR_HEIGHT)
    }

    /// Area inside the bar outline available for the fill
    pub fn bar_fill_area(&self) -> Rect {
        self.bar().inset(BAR_BORDER)
    }
}

/// Maps screens to frames; holds no state between calls
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    layout: Layout,
    scale: PriceScale,
}

impl Renderer {
    pub fn new(layout: Layout, scale: PriceScale) -> Self {
        Self { layout, scale }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn scale(&self) -> &PriceScale {
        &self.scale
    }

    pub fn render_outcome(&self, outcome: &FetchOutcome) -> Frame {
        self.render(&Screen::from_outcome(outcome))
    }

    pub fn render(&self, screen: &Screen) -> Frame {
        match screen {
            Screen::Connecting => self.message(CONNECTING_LABEL, color::BLUE, None),
            Screen::Connected { address } => {
                self.message(CONNECTED_LABEL, color::GREEN, address.as_deref())
            }
            Screen::AssociationFailed => self.message(ASSOCIATION_FAILED_LABEL, color::RED, None),
            Screen::ConfigError => self.message(CONFIG_ERROR_LABEL, color::RED, None),
            Screen::Price(price) => self.price(price),
            Screen::FetchFailed => self.message(ERROR_LABEL, color::RED, None),
            Screen::Fault => self.message(FAULT_LABEL, color::RED, None),
        }
    }

    fn text(&self, frame: &mut Frame, y: u16, text: &str, size: TextSize, color: u16) {
        frame.push(DrawCommand::Text {
            x: self.layout.centered(text, size),
            y: self.layout.y(y),
            text: text.to_string(),
            size,
            color,
        });
    }

    fn message(&self, label: &str, color: u16, detail: Option<&str>) -> Frame {
        let mut frame = Frame::default();
        frame.push(DrawCommand::Clear { color: BACKGROUND });
        self.text(&mut frame, MESSAGE_Y, label, TextSize::Regular, color);
        if let Some(detail) = detail {
            self.text(&mut frame, DETAIL_Y, detail, TextSize::Regular, color::WHITE);
        }
        frame
    }

    fn price(&self, price: &Price) -> Frame {
        let minor = price.minor_units();
        let severity = Severity::classify(minor, &self.scale);
        let color = severity.color();
        let mut frame = Frame::default();

        frame.push(DrawCommand::Clear { color: BACKGROUND });

        let header = self.layout.header();
        frame.push(DrawCommand::FillRect { rect: header, color: color::BLUE });
        frame.push(DrawCommand::Text {
            x: self.layout.centered(TITLE, TextSize::Regular),
            y: header.y + header.height.saturating_sub(self.layout.glyph_height) / 2,
            text: TITLE.to_string(),
            size: TextSize::Regular,
            color: color::WHITE,
        });

        self.text(&mut frame, VALUE_Y, &minor.to_string(), TextSize::Large, color);
        self.text(&mut frame, UNIT_Y, UNIT_LABEL, TextSize::Regular, color::WHITE);

        let bar = self.layout.bar();
        let area = self.layout.bar_fill_area();
        frame.push(DrawCommand::DrawRect { rect: bar, color: color::GRAY });
        let fill = bar_fill_width(minor, &self.scale, area.width);
        if fill > 0 {
            frame.push(DrawCommand::FillRect {
                rect: Rect::new(area.x, area.y, fill, area.height),
                color,
            });
        }

        let valid_from = price.starts_at().format("%H:%M").to_string();
        self.text(&mut frame, VALID_FROM_Y, &valid_from, TextSize::Regular, color::GRAY);

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::FetchError;
    use chrono::DateTime;
    use proptest::prelude::*;

    fn renderer() -> Renderer {
        Renderer::new(Layout::new(240, 240, 10, 20).with_value_glyph(16, 29), PriceScale::default())
    }

    fn price(total: f64) -> Price {
        let at = DateTime::parse_from_rfc3339("2024-01-15T14:00:00+01:00").unwrap();
        Price::new(total, at).unwrap()
    }

    fn fill_rects(frame: &Frame) -> Vec<(Rect, u16)> {
        frame
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { rect, color } => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_boundaries_go_to_higher_band() {
        let scale = PriceScale::default();
        assert_eq!(Severity::classify(49, &scale), Severity::Cheap);
        assert_eq!(Severity::classify(50, &scale), Severity::Moderate);
        assert_eq!(Severity::classify(99, &scale), Severity::Moderate);
        assert_eq!(Severity::classify(100, &scale), Severity::Expensive);
    }

    #[test]
    fn test_bar_fill_clamps() {
        let scale = PriceScale::default();
        assert_eq!(bar_fill_width(0, &scale, 176), 0);
        assert_eq!(bar_fill_width(100, &scale, 176), 88);
        assert_eq!(bar_fill_width(200, &scale, 176), 176);
        assert_eq!(bar_fill_width(5_000, &scale, 176), 176);
    }

    #[test]
    fn test_price_layout() {
        let frame = renderer().render_outcome(&Ok(price(1.23)));

        assert_eq!(frame.commands()[0], DrawCommand::Clear { color: color::BLACK });
        assert_eq!(frame.texts(), vec![TITLE, "123", UNIT_LABEL, "14:00"]);

        let fills = fill_rects(&frame);
        assert_eq!(fills[0], (Rect::new(0, 0, 240, 40), color::BLUE));
        // 123 / 200 of the 176px inner width
        assert_eq!(fills[1], (Rect::new(32, 172, 108, 26), color::RED));

        // Three 16px value glyphs centered on 240px
        assert!(frame.commands().contains(&DrawCommand::Text {
            x: 96,
            y: 80,
            text: "123".to_string(),
            size: TextSize::Large,
            color: color::RED,
        }));
        assert!(frame.commands().contains(&DrawCommand::Text {
            x: 85,
            y: 120,
            text: UNIT_LABEL.to_string(),
            size: TextSize::Regular,
            color: color::WHITE,
        }));
        assert!(frame.commands().contains(&DrawCommand::DrawRect {
            rect: Rect::new(30, 170, 180, 30),
            color: color::GRAY,
        }));
    }

    #[test]
    fn test_free_power_draws_empty_bar() {
        let frame = renderer().render_outcome(&Ok(price(0.0)));
        // Header only, no bar fill
        assert_eq!(fill_rects(&frame).len(), 1);
        assert!(frame.texts().contains(&"0"));
    }

    #[test]
    fn test_failures_share_one_screen() {
        let r = renderer();
        let network = r.render_outcome(&Err(FetchError::NetworkUnavailable));
        let api = r.render_outcome(&Err(FetchError::ApiError("HTTP 500".into())));
        let malformed = r.render_outcome(&Err(FetchError::MalformedResponse));

        assert_eq!(network, api);
        assert_eq!(api, malformed);
        assert_eq!(network.commands()[0], DrawCommand::Clear { color: color::BLACK });
        assert_eq!(network.texts(), vec![ERROR_LABEL]);
    }

    #[test]
    fn test_only_value_uses_large_font() {
        let frame = renderer().render_outcome(&Ok(price(0.07)));
        let large: Vec<_> = frame
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, size: TextSize::Large, x, .. } => Some((text.as_str(), *x)),
                _ => None,
            })
            .collect();
        assert_eq!(large, vec![("7", 112)]);

        // Value glyph defaults to the regular one
        let plain = Renderer::new(Layout::new(240, 240, 10, 20), PriceScale::default());
        let frame = plain.render_outcome(&Ok(price(1.23)));
        assert!(frame.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Text { x: 105, size: TextSize::Large, .. }
        )));
    }

    #[test]
    fn test_config_error_screen() {
        let frame = renderer().render(&Screen::ConfigError);
        assert_eq!(frame.commands()[0], DrawCommand::Clear { color: color::BLACK });
        assert_eq!(frame.texts(), vec![CONFIG_ERROR_LABEL]);
    }

    #[test]
    fn test_connected_shows_address() {
        let frame = renderer().render(&Screen::Connected { address: Some("192.168.1.42".into()) });
        assert_eq!(frame.texts(), vec![CONNECTED_LABEL, "192.168.1.42"]);

        let frame = renderer().render(&Screen::Connected { address: None });
        assert_eq!(frame.texts(), vec![CONNECTED_LABEL]);
    }

    #[test]
    fn test_layout_scales_with_panel_height() {
        let small = Layout::new(240, 120, 10, 20);
        assert_eq!(small.header(), Rect::new(0, 0, 240, 20));
        assert_eq!(small.bar().y, 85);
    }

    proptest! {
        #[test]
        fn prop_band_matches_thresholds(minor in 0u32..10_000) {
            let scale = PriceScale::default();
            let expected = if minor < 50 {
                Severity::Cheap
            } else if minor < 100 {
                Severity::Moderate
            } else {
                Severity::Expensive
            };
            prop_assert_eq!(Severity::classify(minor, &scale), expected);
        }

        #[test]
        fn prop_bar_fill_monotonic_and_bounded(a in 0u32..1_000, b in 0u32..1_000) {
            let r = renderer();
            let fillable = r.layout().bar_fill_area().width;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo_fill = bar_fill_width(lo, r.scale(), fillable);
            let hi_fill = bar_fill_width(hi, r.scale(), fillable);

            prop_assert!(lo_fill <= hi_fill);
            prop_assert!(hi_fill <= fillable);
            if hi >= r.scale().bar_max {
                prop_assert_eq!(hi_fill, fillable);
            }
        }

        #[test]
        fn prop_price_frame_stays_inside_bar(total in 0.0f64..50.0) {
            let r = renderer();
            let frame = r.render_outcome(&Ok(price(total)));
            let bar = r.layout().bar();
            for (rect, _) in fill_rects(&frame).into_iter().skip(1) {
                prop_assert!(bar.contains(&rect));
            }
        }
    }
}
