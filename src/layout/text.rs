use super::cursor::{LayoutError, PageManager};
use super::fonts::FontSet;
use super::page::{Color, DrawOp, FontStyle};

/// Line height as a multiple of font size
pub const LINE_SPACING: f32 = 1.4;

/// Text styling for a run of lines
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub font: FontStyle,
    pub size: f32,
    pub color: Color,
}

impl TextStyle {
    pub const fn new(font: FontStyle, size: f32, color: Color) -> Self {
        Self { font, size, color }
    }

    pub fn line_height(&self) -> f32 {
        self.size * LINE_SPACING
    }

    /// Baseline offset from the top of a line box
    pub fn baseline(&self) -> f32 {
        self.size * 0.8 + (self.line_height() - self.size) / 2.0
    }
}

/// Single line of text in a line box whose top is at `top`
pub fn text_at(x: f32, top: f32, text: &str, style: TextStyle) -> DrawOp {
    DrawOp::Text {
        x,
        y: top + style.baseline(),
        text: text.to_string(),
        font: style.font,
        size: style.size,
        color: style.color,
    }
}

/// Draw word-wrapped text at the cursor, one line box per wrapped line.
///
/// Each line is checked against the bottom margin on its own, so a page
/// break lands exactly before the first line that would not fit. Returns
/// the number of lines drawn; the cursor advances by lines × line height.
pub fn paragraph(
    pm: &mut PageManager,
    fonts: &FontSet,
    x: f32,
    width: f32,
    text: &str,
    style: TextStyle,
) -> Result<usize, LayoutError> {
    let lines = fonts.wrap(style.font, style.size, text, width);
    let line_height = style.line_height();
    for line in &lines {
        let top = pm.ensure_space(line_height)?;
        pm.draw(text_at(x, top, line, style))?;
        pm.advance(line_height)?;
    }
    Ok(lines.len())
}

/// Height `paragraph` would consume for `text`
pub fn paragraph_height(fonts: &FontSet, width: f32, text: &str, style: TextStyle) -> f32 {
    fonts.wrap(style.font, style.size, text, width).len() as f32 * style.line_height()
}

/// Draw `text` horizontally centred on the page
pub fn centered(
    pm: &mut PageManager,
    fonts: &FontSet,
    text: &str,
    style: TextStyle,
) -> Result<(), LayoutError> {
    let geometry = *pm.geometry();
    let width = fonts.text_width(style.font, style.size, text);
    let x = ((geometry.width - width) / 2.0).max(geometry.margin_left);
    let top = pm.ensure_space(style.line_height())?;
    pm.draw(text_at(x, top, text, style))?;
    pm.advance(style.line_height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::page::Geometry;

    const BODY: TextStyle = TextStyle::new(FontStyle::Regular, 10.0, Color::BLACK);

    #[test]
    fn test_paragraph_height_matches_lines() {
        let fonts = FontSet::default();
        let mut pm = PageManager::new(Geometry::default());
        let text = "lorem ipsum dolor sit amet ".repeat(20);
        let start = pm.y();
        let lines = paragraph(&mut pm, &fonts, 45.0, 200.0, &text, BODY).unwrap();
        assert!(lines > 1);
        let consumed = pm.y() - start;
        assert!((consumed - lines as f32 * BODY.line_height()).abs() < 0.01);
        assert!((paragraph_height(&fonts, 200.0, &text, BODY) - consumed).abs() < 0.01);
    }

    #[test]
    fn test_paragraph_breaks_before_first_overflowing_line() {
        let fonts = FontSet::default();
        let geometry = Geometry::default();
        let mut pm = PageManager::new(geometry);
        // Leave room for exactly two lines
        let room = 2.0 * BODY.line_height();
        pm.advance(pm.remaining() - room).unwrap();

        let text = "word ".repeat(200);
        let lines = paragraph(&mut pm, &fonts, 45.0, 100.0, &text, BODY).unwrap();
        assert!(lines > 3);

        let pages = pm.pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].texts().count(), 2);
        assert_eq!(pages[1].texts().count(), lines - 2);
    }
}
