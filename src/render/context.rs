use chrono::{DateTime, NaiveDate, Utc};

use crate::assets::{Icon, ImageSet};
use crate::layout::{DrawOp, FontSet, LayoutError, PageManager};
use crate::types::AuditRecord;

/// Read-only inputs shared by every section of one render
pub struct RenderContext<'a> {
    pub record: &'a AuditRecord,
    pub fonts: &'a FontSet,
    pub images: &'a ImageSet,
    pub org_name: &'a str,
    pub generated: DateTime<Utc>,
    /// Key of the resolved project logo, if any candidate loaded
    pub logo_key: Option<&'a str>,
}

impl RenderContext<'_> {
    /// Generation date as shown on the cover and in footers
    pub fn generated_label(&self) -> String {
        self.generated.format("%B %-d, %Y").to_string()
    }

    /// Draw a bundled icon with its top-left corner at (`x`, `y`).
    /// Missing icons are skipped.
    pub fn icon(
        &self,
        pm: &mut PageManager,
        icon: Icon,
        x: f32,
        y: f32,
        size: f32,
    ) -> Result<(), LayoutError> {
        self.image(pm, &icon.key(), x, y, size, size)
    }

    pub fn image(
        &self,
        pm: &mut PageManager,
        key: &str,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), LayoutError> {
        if !self.images.contains(key) {
            return Ok(());
        }
        pm.draw(DrawOp::Image {
            x,
            y,
            width,
            height,
            key: key.to_string(),
        })
    }
}

/// Human form of an ISO-8601 date or timestamp; `N/A` when absent.
/// Unparseable values are shown verbatim.
pub fn format_date(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return "N/A".to_string();
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format("%B %-d, %Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%B %-d, %Y").to_string();
    }
    raw.to_string()
}

/// Amount with thousands separators and at most two decimals
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return "N/A".to_string();
    }
    let rounded = format!("{:.2}", amount.abs());
    let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}

/// Value or `N/A` for blank optional text
pub fn or_na(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("N/A")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2024-03-05")), "March 5, 2024");
        assert_eq!(format_date(Some("2024-03-05T10:00:00Z")), "March 5, 2024");
        assert_eq!(format_date(Some("Q3 2024")), "Q3 2024");
        assert_eq!(format_date(None), "N/A");
        assert_eq!(format_date(Some(" ")), "N/A");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_000_000.0), "1,000,000");
        assert_eq!(format_amount(1234.5), "1,234.5");
        assert_eq!(format_amount(12.346), "12.35");
        assert_eq!(format_amount(-999.0), "-999");
        assert_eq!(format_amount(f64::NAN), "N/A");
    }

    #[test]
    fn test_or_na() {
        assert_eq!(or_na(Some("x")), "x");
        assert_eq!(or_na(Some("")), "N/A");
        assert_eq!(or_na(None), "N/A");
    }
}
