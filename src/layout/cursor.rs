use thiserror::Error;
use tracing::trace;

use super::page::{DrawOp, Geometry, Page, PageKind, Section};

// Tolerance for float accumulation in cursor arithmetic.
const EPSILON: f32 = 0.01;

#[derive(Error, Debug, PartialEq)]
pub enum LayoutError {
    #[error("invalid cursor advance: {0}")]
    InvalidAdvance(f32),

    #[error("cursor {y} outside drawable band [{top}, {bottom}] on page {page}")]
    CursorOutOfBounds {
        y: f32,
        top: f32,
        bottom: f32,
        page: usize,
    },

    #[error("block of {required}pt cannot fit on an empty page ({available}pt available)")]
    BlockTooTall { required: f32, available: f32 },
}

/// Owns the pages of one document and the vertical cursor into the last one.
///
/// All positions handed out are relative to the cursor; callers never know
/// which page they are on. The cursor stays within
/// `[margin_top, height - margin_bottom]`.
pub struct PageManager {
    geometry: Geometry,
    pages: Vec<Page>,
    y: f32,
}

impl PageManager {
    /// Open a document whose first page is the cover
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::new(PageKind::Cover)],
            y: geometry.margin_top,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Space left between the cursor and the bottom margin
    pub fn remaining(&self) -> f32 {
        (self.geometry.bottom_limit() - self.y).max(0.0)
    }

    pub fn at_page_top(&self) -> bool {
        (self.y - self.geometry.margin_top).abs() < EPSILON
    }

    /// Move the cursor down. Spacing that runs past the bottom margin
    /// collapses onto it; the next `ensure_space` then breaks the page.
    pub fn advance(&mut self, dy: f32) -> Result<(), LayoutError> {
        if !dy.is_finite() || dy < 0.0 {
            return Err(LayoutError::InvalidAdvance(dy));
        }
        self.y = (self.y + dy).min(self.geometry.bottom_limit());
        Ok(())
    }

    /// Start a new page if `required` points do not fit below the cursor
    pub fn ensure_space(&mut self, required: f32) -> Result<f32, LayoutError> {
        if !required.is_finite() || required < 0.0 {
            return Err(LayoutError::InvalidAdvance(required));
        }
        if required > self.geometry.usable_height() + EPSILON {
            return Err(LayoutError::BlockTooTall {
                required,
                available: self.geometry.usable_height(),
            });
        }
        if self.y + required > self.geometry.bottom_limit() + EPSILON {
            self.new_page();
        }
        Ok(self.y)
    }

    /// Explicit page break
    pub fn new_page(&mut self) -> f32 {
        self.pages.push(Page::new(PageKind::Body));
        self.y = self.geometry.margin_top;
        trace!(page = self.pages.len(), "page break");
        self.y
    }

    /// Record the start of a section on the current page
    pub fn mark(&mut self, section: Section) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(DrawOp::Marker(section));
        }
    }

    /// Append an op to the current page, checking the cursor invariant
    pub fn draw(&mut self, op: DrawOp) -> Result<(), LayoutError> {
        let top = self.geometry.margin_top;
        let bottom = self.geometry.bottom_limit();
        if self.y < top - EPSILON || self.y > bottom + EPSILON {
            return Err(LayoutError::CursorOutOfBounds {
                y: self.y,
                top,
                bottom,
                page: self.pages.len(),
            });
        }
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
        Ok(())
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::page::{Color, FontStyle};

    fn text(y: f32) -> DrawOp {
        DrawOp::Text {
            x: 0.0,
            y,
            text: "x".to_string(),
            font: FontStyle::Regular,
            size: 10.0,
            color: Color::BLACK,
        }
    }

    #[test]
    fn test_starts_on_cover_at_top_margin() {
        let pm = PageManager::new(Geometry::default());
        assert_eq!(pm.page_count(), 1);
        assert_eq!(pm.pages()[0].kind, PageKind::Cover);
        assert_eq!(pm.y(), Geometry::default().margin_top);
    }

    #[test]
    fn test_ensure_space_is_noop_when_block_fits() {
        let mut pm = PageManager::new(Geometry::default());
        pm.advance(100.0).unwrap();
        let y = pm.ensure_space(50.0).unwrap();
        assert_eq!(pm.page_count(), 1);
        assert_eq!(y, 150.0);
    }

    #[test]
    fn test_ensure_space_breaks_exactly_at_bottom_margin() {
        let geometry = Geometry::default();
        let mut pm = PageManager::new(geometry);
        let remaining = pm.remaining();

        // Exactly filling the page does not break
        pm.ensure_space(remaining).unwrap();
        assert_eq!(pm.page_count(), 1);

        pm.advance(remaining - 10.0).unwrap();
        pm.ensure_space(10.0).unwrap();
        assert_eq!(pm.page_count(), 1);

        pm.ensure_space(10.5).unwrap();
        assert_eq!(pm.page_count(), 2);
        assert_eq!(pm.y(), geometry.margin_top);
        assert_eq!(pm.pages()[1].kind, PageKind::Body);
    }

    #[test]
    fn test_advance_collapses_at_bottom() {
        let geometry = Geometry::default();
        let mut pm = PageManager::new(geometry);
        pm.advance(10_000.0).unwrap();
        assert_eq!(pm.y(), geometry.bottom_limit());
        assert_eq!(pm.remaining(), 0.0);
        assert!(pm.draw(text(pm.y())).is_ok());
    }

    #[test]
    fn test_invalid_advance_fails_fast() {
        let mut pm = PageManager::new(Geometry::default());
        assert_eq!(pm.advance(-1.0), Err(LayoutError::InvalidAdvance(-1.0)));
        assert!(pm.advance(f32::NAN).is_err());
    }

    #[test]
    fn test_block_taller_than_page_is_an_error() {
        let mut pm = PageManager::new(Geometry::default());
        let err = pm.ensure_space(10_000.0).unwrap_err();
        assert!(matches!(err, LayoutError::BlockTooTall { .. }));
        assert_eq!(pm.page_count(), 1);
    }

    #[test]
    fn test_markers_land_on_current_page() {
        let mut pm = PageManager::new(Geometry::default());
        pm.mark(Section::Cover);
        pm.new_page();
        pm.mark(Section::ExecutiveSummary);
        let pages = pm.into_pages();
        assert_eq!(pages[0].sections().collect::<Vec<_>>(), vec![Section::Cover]);
        assert_eq!(
            pages[1].sections().collect::<Vec<_>>(),
            vec![Section::ExecutiveSummary]
        );
    }
}
