use serde::Serialize;

/// RGB colour with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
}

/// Fixed page dimensions and margins, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for Geometry {
    /// A4 portrait
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin_top: 50.0,
            margin_bottom: 60.0,
            margin_left: 45.0,
            margin_right: 45.0,
        }
    }
}

impl Geometry {
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Lowest y a draw may reach
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin_bottom
    }

    pub fn usable_height(&self) -> f32 {
        self.bottom_limit() - self.margin_top
    }
}

/// Logical report sections, recorded as markers on the pages they start on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Cover,
    ExecutiveSummary,
    ProjectInfo,
    Timeline,
    Kyc,
    TokenDistribution,
    FindingsSummary,
    DetailedFindings,
    RiskOverview,
    Diagrams,
    SocialLinks,
}

/// One drawing primitive. Coordinates are top-down from the page's top-left
/// corner; `y` of text is its baseline, `y` of boxes is their top edge.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        font: FontStyle,
        size: f32,
        color: Color,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
        line_width: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
        line_width: f32,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        key: String,
    },
    // Not rendered; marks where a section begins.
    Marker(Section),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Cover,
    Body,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub kind: PageKind,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn new(kind: PageKind) -> Self {
        Self {
            kind,
            ops: Vec::new(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn sections(&self) -> impl Iterator<Item = Section> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Marker(section) => Some(*section),
            _ => None,
        })
    }

    pub fn image_keys(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image { key, .. } => Some(key.as_str()),
            _ => None,
        })
    }
}
