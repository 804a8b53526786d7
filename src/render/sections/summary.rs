use crate::assets::Icon;
use crate::layout::text::{paragraph, text_at};
use crate::layout::{draw_table, DrawOp, LayoutError, PageManager, Section, Table};
use crate::render::context::RenderContext;
use crate::render::severity::active_count;
use crate::render::theme;
use crate::types::Severity;

use super::{end_section, heading, subheading};

const BAR_LABEL_WIDTH: f32 = 90.0;
const BAR_WIDTH: f32 = 300.0;
const BAR_HEIGHT: f32 = 8.0;
const BAR_ROW: f32 = 18.0;

/// Executive summary: intro, score bars, confidence and the severity legend
pub fn render(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let record = ctx.record;
    let geometry = *pm.geometry();
    let x = geometry.margin_left;
    let width = geometry.content_width();

    heading(pm, Section::ExecutiveSummary, "Executive Summary")?;

    let active = active_count(&record.findings);
    let intro = format!(
        "{org} reviewed the smart contracts of {name} for security vulnerabilities, \
         design issues and deviations from best practice. The review produced {total} \
         finding(s), of which {active} remain active at the time of writing.",
        org = ctx.org_name,
        name = record.name,
        total = record.findings.len(),
        active = active,
    );
    paragraph(pm, ctx.fonts, x, width, &intro, theme::BODY)?;
    pm.advance(10.0)?;

    let scores: Vec<(&str, u8)> = record
        .scores
        .entries()
        .into_iter()
        .filter_map(|(label, score)| score.map(|s| (label, s.min(100))))
        .collect();
    if !scores.is_empty() || record.scores.overall.is_some() {
        subheading(pm, "Audit Scores")?;
        for (label, score) in scores {
            score_bar(pm, label, score)?;
        }
        if let Some(overall) = record.scores.overall {
            let top = pm.ensure_space(theme::LABEL.line_height())?;
            pm.draw(text_at(
                x,
                top,
                &format!("Overall Score: {}/100", overall.min(100)),
                theme::LABEL,
            ))?;
            pm.advance(theme::LABEL.line_height())?;
        }
        pm.advance(8.0)?;
    }

    let top = pm.ensure_space(theme::LABEL.line_height())?;
    pm.draw(text_at(
        x,
        top,
        &format!("Audit Confidence: {}", ctx.record.confidence_label()),
        theme::LABEL,
    ))?;
    pm.advance(theme::LABEL.line_height() + 10.0)?;

    subheading(pm, "Issue Classification")?;
    let mut legend = Table::new(vec![110.0, width - 110.0])
        .with_header(["Severity", "Description"])
        .with_indent(0, theme::ICON_SIZE + 4.0);
    for severity in Severity::ALL {
        legend = legend.with_row([severity.label(), severity.description()]);
    }
    draw_table(pm, ctx.fonts, &legend, x, |pm, cell| {
        if cell.column != 0 {
            return Ok(());
        }
        let Some(row) = cell.row else {
            return Ok(());
        };
        let Some(&severity) = Severity::ALL.get(row) else {
            return Ok(());
        };
        ctx.icon(
            pm,
            Icon::for_severity(severity),
            cell.x + legend.theme.padding,
            cell.y + legend.theme.padding,
            theme::ICON_SIZE,
        )
    })?;

    end_section(pm)
}

fn score_bar(pm: &mut PageManager, label: &str, score: u8) -> Result<(), LayoutError> {
    let x = pm.geometry().margin_left;
    let top = pm.ensure_space(BAR_ROW)?;
    pm.draw(text_at(x, top, label, theme::BODY))?;

    let bar_x = x + BAR_LABEL_WIDTH;
    let bar_y = top + (theme::BODY.line_height() - BAR_HEIGHT) / 2.0;
    pm.draw(DrawOp::FillRect {
        x: bar_x,
        y: bar_y,
        width: BAR_WIDTH,
        height: BAR_HEIGHT,
        color: theme::TRACK,
    })?;
    if score > 0 {
        pm.draw(DrawOp::FillRect {
            x: bar_x,
            y: bar_y,
            width: BAR_WIDTH * score as f32 / 100.0,
            height: BAR_HEIGHT,
            color: theme::score_color(score),
        })?;
    }

    let value = format!("{}/100", score);
    pm.draw(text_at(bar_x + BAR_WIDTH + 10.0, top, &value, theme::LABEL))?;
    pm.advance(BAR_ROW)
}
