use crate::assets::Icon;
use crate::layout::text::{paragraph, text_at, TextStyle};
use crate::layout::{draw_table, Color, DrawOp, FontStyle, LayoutError, PageManager, Section, Table};
use crate::render::context::RenderContext;
use crate::render::severity::{group_active, tier_counts};
use crate::render::theme;
use crate::types::{Finding, Severity};

use super::{end_section, heading};

const BADGE_HEIGHT: f32 = 18.0;
const BADGE_PAD: f32 = 8.0;
const ACCENT_WIDTH: f32 = 3.0;
const INDENT: f32 = 10.0;
const TITLE_STYLE: TextStyle = TextStyle::new(FontStyle::Bold, 11.0, theme::TEXT);
const BADGE_STYLE: TextStyle = TextStyle::new(FontStyle::Bold, 8.0, Color::WHITE);
const META_STYLE: TextStyle = TextStyle::new(FontStyle::Regular, 9.0, theme::MUTED);
const AFFIRMATION_HEIGHT: f32 = 56.0;

/// Per-tier counts; always drawn, zero-filled when nothing was found
pub fn render_summary(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let geometry = *pm.geometry();
    heading(pm, Section::FindingsSummary, "Findings Summary")?;

    let counts = tier_counts(ctx.record);
    let width = geometry.content_width();
    let number = (width - 160.0) / 3.0;
    let mut table = Table::new(vec![160.0, number, number, number])
        .with_header(["Severity", "Found", "Pending", "Resolved"])
        .with_indent(0, theme::ICON_SIZE + 4.0);

    let mut total = [0u32; 3];
    for (severity, tier) in &counts {
        total[0] = total[0].saturating_add(tier.found);
        total[1] = total[1].saturating_add(tier.pending);
        total[2] = total[2].saturating_add(tier.resolved);
        table = table.with_row([
            severity.label().to_string(),
            tier.found.to_string(),
            tier.pending.to_string(),
            tier.resolved.to_string(),
        ]);
    }
    table = table.with_row([
        "Total".to_string(),
        total[0].to_string(),
        total[1].to_string(),
        total[2].to_string(),
    ]);

    draw_table(pm, ctx.fonts, &table, geometry.margin_left, |pm, cell| {
        if cell.column != 0 {
            return Ok(());
        }
        let Some(&(severity, _)) = cell.row.and_then(|row| counts.get(row)) else {
            return Ok(());
        };
        ctx.icon(
            pm,
            Icon::for_severity(severity),
            cell.x + table.theme.padding,
            cell.y + table.theme.padding,
            theme::ICON_SIZE,
        )
    })?;

    end_section(pm)
}

/// Active findings grouped by severity, or an affirmation block when none
/// are active
pub fn render_details(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    heading(pm, Section::DetailedFindings, "Detailed Findings")?;

    let groups = group_active(&ctx.record.findings);
    if groups.is_empty() {
        affirmation(pm)?;
        return end_section(pm);
    }

    for group in &groups {
        bucket_header(pm, ctx, group.severity, group.findings.len())?;
        for finding in &group.findings {
            finding_block(pm, ctx, finding)?;
        }
        pm.advance(6.0)?;
    }

    end_section(pm)
}

fn affirmation(pm: &mut PageManager) -> Result<(), LayoutError> {
    let geometry = *pm.geometry();
    let x = geometry.margin_left;
    let top = pm.ensure_space(AFFIRMATION_HEIGHT)?;
    pm.draw(DrawOp::FillRect {
        x,
        y: top,
        width: geometry.content_width(),
        height: AFFIRMATION_HEIGHT,
        color: theme::SUCCESS_TINT,
    })?;
    pm.draw(DrawOp::FillRect {
        x,
        y: top,
        width: ACCENT_WIDTH,
        height: AFFIRMATION_HEIGHT,
        color: theme::SUCCESS,
    })?;
    let title = TextStyle::new(FontStyle::Bold, 13.0, theme::SUCCESS);
    pm.draw(text_at(x + 14.0, top + 10.0, "No Critical Findings", title))?;
    pm.draw(text_at(
        x + 14.0,
        top + 12.0 + title.line_height(),
        "Every reported check passed. No active issues remain in the audited contracts.",
        theme::BODY,
    ))?;
    pm.advance(AFFIRMATION_HEIGHT)
}

/// Severity-coloured badge with the bucket's active count
fn bucket_header(
    pm: &mut PageManager,
    ctx: &RenderContext<'_>,
    severity: Severity,
    count: usize,
) -> Result<(), LayoutError> {
    let x = pm.geometry().margin_left;
    let label = format!("{} Issues ({})", severity.label(), count);
    let style = TextStyle::new(FontStyle::Bold, 10.0, Color::WHITE);
    let width = ctx.fonts.text_width(style.font, style.size, &label) + 2.0 * BADGE_PAD
        + theme::ICON_SIZE
        + 4.0;
    let height = BADGE_HEIGHT + 4.0;

    // Keep the badge with the head of its first finding
    let top = pm.ensure_space(height + head_height())?;
    pm.draw(DrawOp::FillRect {
        x,
        y: top,
        width,
        height: BADGE_HEIGHT,
        color: theme::severity_color(severity),
    })?;
    ctx.icon(
        pm,
        Icon::for_severity(severity),
        x + BADGE_PAD,
        top + (BADGE_HEIGHT - theme::ICON_SIZE) / 2.0,
        theme::ICON_SIZE,
    )?;
    pm.draw(text_at(
        x + BADGE_PAD + theme::ICON_SIZE + 4.0,
        top + (BADGE_HEIGHT - style.line_height()) / 2.0,
        &label,
        style,
    ))?;
    pm.advance(height + 6.0)
}

fn head_height() -> f32 {
    TITLE_STYLE.line_height() + META_STYLE.line_height() + 6.0
}

/// Small filled label; returns its width
fn badge(
    pm: &mut PageManager,
    ctx: &RenderContext<'_>,
    x: f32,
    top: f32,
    text: &str,
    color: Color,
) -> Result<f32, LayoutError> {
    let width = badge_width(ctx, text);
    let height = BADGE_STYLE.line_height() + 2.0;
    pm.draw(DrawOp::FillRect {
        x,
        y: top,
        width,
        height,
        color,
    })?;
    pm.draw(text_at(x + 5.0, top + 1.0, text, BADGE_STYLE))?;
    Ok(width)
}

fn badge_width(ctx: &RenderContext<'_>, text: &str) -> f32 {
    ctx.fonts.text_width(BADGE_STYLE.font, BADGE_STYLE.size, text) + 2.0 * 5.0
}

/// Reserve one line of the finding head, with the priority accent beside it
fn head_line(pm: &mut PageManager, priority: bool, height: f32) -> Result<f32, LayoutError> {
    let top = pm.ensure_space(height)?;
    if priority {
        let x = pm.geometry().margin_left;
        pm.draw(DrawOp::FillRect {
            x,
            y: top,
            width: ACCENT_WIDTH,
            height,
            color: theme::DANGER,
        })?;
    }
    Ok(top)
}

fn finding_block(
    pm: &mut PageManager,
    ctx: &RenderContext<'_>,
    finding: &Finding,
) -> Result<(), LayoutError> {
    let geometry = *pm.geometry();
    let left = geometry.margin_left;
    let right = left + geometry.content_width();
    let x = left + INDENT;
    let text_width = geometry.content_width() - INDENT;
    let priority = finding.severity.is_priority();
    let color = theme::severity_color(finding.severity);

    // The first title line stays with the first meta line
    let top = pm.ensure_space(head_height())?;

    // Badges are right-aligned: severity, then URGENT for priority findings
    let severity_label = finding.severity.label().to_uppercase();
    let mut badges_width = badge_width(ctx, &severity_label);
    if priority {
        badges_width += badge_width(ctx, "URGENT") + 4.0;
    }
    let mut badge_x = right - badges_width;
    badge_x += badge(pm, ctx, badge_x, top + 1.0, &severity_label, color)? + 4.0;
    if priority {
        badge(pm, ctx, badge_x, top + 1.0, "URGENT", theme::DANGER)?;
    }

    let title = format!("{}  {}", finding.id, finding.title);
    let title_width = (text_width - badges_width - 10.0).max(TITLE_STYLE.size);
    let title_lines = ctx.fonts.wrap(TITLE_STYLE.font, TITLE_STYLE.size, &title, title_width);
    for (i, line) in title_lines.iter().enumerate() {
        let gap = if i + 1 == title_lines.len() { 2.0 } else { 0.0 };
        let line_top = head_line(pm, priority, TITLE_STYLE.line_height() + gap)?;
        pm.draw(text_at(x, line_top, line, TITLE_STYLE))?;
        pm.advance(TITLE_STYLE.line_height() + gap)?;
    }

    let mut meta = format!("Status: {}", finding.status.label());
    if let Some(category) = finding.category.as_deref().filter(|c| !c.trim().is_empty()) {
        meta.push_str(&format!("   |   Category: {}", category.trim()));
    }
    if let Some(location) = finding.location.as_deref().filter(|l| !l.trim().is_empty()) {
        meta.push_str(&format!("   |   Location: {}", location.trim()));
    }
    let meta_x = x + theme::ICON_SIZE + 4.0;
    let meta_lines = ctx.fonts.wrap(META_STYLE.font, META_STYLE.size, &meta, right - meta_x);
    for (i, line) in meta_lines.iter().enumerate() {
        let line_top = head_line(pm, priority, META_STYLE.line_height())?;
        if i == 0 {
            ctx.icon(
                pm,
                Icon::for_status(finding.status.icon()),
                x,
                line_top + (META_STYLE.line_height() - theme::ICON_SIZE) / 2.0,
                theme::ICON_SIZE,
            )?;
        }
        pm.draw(text_at(meta_x, line_top, line, META_STYLE))?;
        pm.advance(META_STYLE.line_height())?;
    }
    pm.advance(4.0)?;

    let blocks = [
        ("Description", finding.description.as_deref()),
        ("Recommendation", finding.recommendation.as_deref()),
        ("Mitigation", finding.alleviation.as_deref()),
    ];
    for (label, body) in blocks {
        let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) else {
            continue;
        };
        // Label stays with the first line of its text
        let top = pm.ensure_space(theme::LABEL.line_height() + theme::BODY.line_height())?;
        pm.draw(text_at(x, top, label, theme::LABEL))?;
        pm.advance(theme::LABEL.line_height())?;
        paragraph(pm, ctx.fonts, x, text_width, body, theme::BODY)?;
        pm.advance(4.0)?;
    }

    let top = pm.ensure_space(10.0)?;
    pm.draw(DrawOp::Line {
        x1: left,
        y1: top + 5.0,
        x2: right,
        y2: top + 5.0,
        color: theme::RULE,
        line_width: 0.5,
    })?;
    pm.advance(10.0)
}
