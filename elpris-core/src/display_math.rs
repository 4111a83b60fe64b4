/// Screen geometry helpers
/// Pure functions that can be tested without hardware

/// Rectangle structure for display operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x as u32 + self.width as u32
    }

    pub fn bottom(&self) -> u32 {
        self.y as u32 + self.height as u32
    }

    /// True when `other` lies entirely inside `self`
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Shrink by `margin` on every side, saturating at an empty rect
    pub fn inset(&self, margin: u16) -> Rect {
        Rect::new(
            self.x.saturating_add(margin),
            self.y.saturating_add(margin),
            self.width.saturating_sub(margin.saturating_mul(2)),
            self.height.saturating_sub(margin.saturating_mul(2)),
        )
    }
}

/// Left edge that horizontally centers `chars` glyphs of `glyph_width` in `span`.
/// Text wider than the span starts at 0.
pub fn centered_x(span: u16, chars: usize, glyph_width: u16) -> u16 {
    let text_width = (chars as u32).saturating_mul(glyph_width as u32);
    (span as u32).saturating_sub(text_width) as u16 / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let outer = Rect::new(30, 170, 180, 30);

        assert!(outer.contains(&outer));
        assert!(outer.contains(&outer.inset(2)));
        // Right edge 210 is the last column still inside
        assert!(outer.contains(&Rect::new(32, 172, 178, 26)));
        assert!(!outer.contains(&Rect::new(32, 172, 179, 26)));
        assert!(!outer.contains(&Rect::new(32, 172, 10, 29)));
        assert!(!outer.contains(&Rect::new(29, 172, 10, 10)));
    }

    #[test]
    fn test_inset() {
        assert_eq!(Rect::new(30, 170, 180, 30).inset(2), Rect::new(32, 172, 176, 26));
        assert_eq!(Rect::new(0, 0, 3, 3).inset(2), Rect::new(2, 2, 0, 0));
    }

    #[test]
    fn test_centering() {
        // "123" in a 10px font on a 240px panel
        assert_eq!(centered_x(240, 3, 10), 105);
        assert_eq!(centered_x(240, 0, 10), 120);
        // Too wide to fit
        assert_eq!(centered_x(240, 30, 10), 0);
    }
}
