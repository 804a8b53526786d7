//! Section renderers, run in a fixed order over one `PageManager`.
//!
//! A section whose data is absent returns without drawing or marking
//! anything, so it takes no vertical space.

mod cover;
mod extras;
mod findings;
mod overview;
mod project;
mod summary;

use crate::layout::{text, DrawOp, LayoutError, PageManager, Section, Table, TableTheme};

use super::context::RenderContext;
use super::theme;

pub type SectionRenderer = fn(&mut PageManager, &RenderContext<'_>) -> Result<(), LayoutError>;

/// Every section in document order
pub const SECTIONS: [(Section, SectionRenderer); 11] = [
    (Section::Cover, cover::render),
    (Section::ExecutiveSummary, summary::render),
    (Section::ProjectInfo, project::render),
    (Section::Timeline, project::render_timeline),
    (Section::Kyc, extras::render_kyc),
    (Section::TokenDistribution, extras::render_distribution),
    (Section::FindingsSummary, findings::render_summary),
    (Section::DetailedFindings, findings::render_details),
    (Section::RiskOverview, overview::render),
    (Section::Diagrams, extras::render_diagrams),
    (Section::SocialLinks, extras::render_socials),
];

/// Room a heading keeps free below itself so it never ends a page alone
const HEADING_KEEP: f32 = 40.0;

/// Mark `section` and draw its title with a rule underneath
fn heading(pm: &mut PageManager, section: Section, title: &str) -> Result<(), LayoutError> {
    let style = theme::TITLE;
    let height = style.line_height() + 8.0;
    let top = pm.ensure_space(height + HEADING_KEEP)?;
    pm.mark(section);

    let geometry = *pm.geometry();
    let x = geometry.margin_left;
    pm.draw(text::text_at(x, top, title, style))?;
    let rule_y = top + style.line_height() + 2.0;
    pm.draw(DrawOp::Line {
        x1: x,
        y1: rule_y,
        x2: x + geometry.content_width(),
        y2: rule_y,
        color: theme::PRIMARY,
        line_width: 1.0,
    })?;
    pm.advance(height)
}

/// Bold sub-heading kept together with at least one body line
fn subheading(pm: &mut PageManager, title: &str) -> Result<(), LayoutError> {
    let style = theme::SUBHEADING;
    let top = pm.ensure_space(style.line_height() + theme::BODY.line_height())?;
    pm.draw(text::text_at(pm.geometry().margin_left, top, title, style))?;
    pm.advance(style.line_height() + 2.0)
}

/// Two-column label/value table spanning the content width
fn detail_table<'a>(rows: impl IntoIterator<Item = (&'a str, String)>, content_width: f32) -> Table {
    let label_width = 150.0;
    let mut table = Table::new(vec![label_width, content_width - label_width]).with_theme(TableTheme {
        stripe_fill: Some(theme::TRACK),
        ..TableTheme::default()
    });
    for (label, value) in rows {
        table = table.with_row([label.to_string(), value]);
    }
    table
}

fn end_section(pm: &mut PageManager) -> Result<(), LayoutError> {
    pm.advance(theme::SECTION_GAP)
}
