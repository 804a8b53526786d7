use crate::layout::{Color, FontStyle, TextStyle};
use crate::types::Severity;

pub const PRIMARY: Color = Color::rgb(30, 58, 138);
pub const TEXT: Color = Color::rgb(31, 41, 55);
pub const MUTED: Color = Color::rgb(107, 114, 128);
pub const RULE: Color = Color::rgb(209, 213, 219);
pub const TRACK: Color = Color::rgb(229, 231, 235);
pub const SUCCESS: Color = Color::rgb(22, 163, 74);
pub const SUCCESS_TINT: Color = Color::rgb(220, 252, 231);
pub const WARNING: Color = Color::rgb(217, 119, 6);
pub const DANGER: Color = Color::rgb(220, 38, 38);

pub const TITLE: TextStyle = TextStyle::new(FontStyle::Bold, 16.0, PRIMARY);
pub const SUBHEADING: TextStyle = TextStyle::new(FontStyle::Bold, 11.0, TEXT);
pub const BODY: TextStyle = TextStyle::new(FontStyle::Regular, 10.0, TEXT);
pub const LABEL: TextStyle = TextStyle::new(FontStyle::Bold, 10.0, TEXT);
pub const SMALL: TextStyle = TextStyle::new(FontStyle::Regular, 8.0, MUTED);

/// Vertical gap after each section
pub const SECTION_GAP: f32 = 18.0;

/// Side of icons overlaid on table cells
pub const ICON_SIZE: f32 = 10.0;

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::rgb(185, 28, 28),
        Severity::High => Color::rgb(234, 88, 12),
        Severity::Medium => Color::rgb(202, 138, 4),
        Severity::Low => Color::rgb(37, 99, 235),
        Severity::Informational => Color::rgb(75, 85, 99),
    }
}

/// Bar colour for a 0-100 score
pub fn score_color(score: u8) -> Color {
    match score {
        80.. => SUCCESS,
        50..=79 => WARNING,
        _ => DANGER,
    }
}
