use crate::layout::text::paragraph;
use crate::layout::{draw_table, LayoutError, PageManager, Section, Table};
use crate::render::context::{format_date, or_na, RenderContext};
use crate::render::severity::group_active;
use crate::render::theme;
use crate::types::Severity;

use super::{detail_table, end_section, heading, subheading};

/// Project information table, risk analysis line and description
pub fn render(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let record = ctx.record;
    let info = &record.contract_info;
    let geometry = *pm.geometry();

    heading(pm, Section::ProjectInfo, "Project Information")?;

    let verified = match info.verified {
        Some(true) => "Yes".to_string(),
        Some(false) => "No".to_string(),
        None => "N/A".to_string(),
    };
    let rows = [
        ("Project Name", or_na(Some(record.name.as_str()))),
        ("Symbol", or_na(record.symbol.as_deref())),
        (
            "Decimals",
            record
                .decimals
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        ("Total Supply", or_na(record.supply.as_deref())),
        ("Platform", or_na(record.platform.as_deref())),
        ("Contract Address", or_na(info.address.as_deref())),
        ("Language", or_na(info.language.as_deref())),
        ("Owner", or_na(info.owner.as_deref())),
        ("Verified", verified),
        ("Compiler", or_na(info.compiler.as_deref())),
        ("License", or_na(info.license.as_deref())),
    ];
    let table = detail_table(rows, geometry.content_width());
    draw_table(pm, ctx.fonts, &table, geometry.margin_left, |_, _| Ok(()))?;
    pm.advance(12.0)?;

    subheading(pm, "Risk Analysis")?;
    paragraph(
        pm,
        ctx.fonts,
        geometry.margin_left,
        geometry.content_width(),
        &risk_summary(ctx),
        theme::BODY,
    )?;

    if let Some(description) = record.description.as_deref().filter(|d| !d.trim().is_empty()) {
        pm.advance(10.0)?;
        subheading(pm, "Project Description")?;
        paragraph(
            pm,
            ctx.fonts,
            geometry.margin_left,
            geometry.content_width(),
            description.trim(),
            theme::BODY,
        )?;
    }

    end_section(pm)
}

fn risk_summary(ctx: &RenderContext<'_>) -> String {
    let groups = group_active(&ctx.record.findings);
    let Some(highest) = groups.first() else {
        return "No active issues remain. The contracts show no outstanding risk from this review."
            .to_string();
    };

    let total: usize = groups.iter().map(|g| g.findings.len()).sum();
    let priority: usize = groups
        .iter()
        .filter(|g| g.severity.is_priority())
        .map(|g| g.findings.len())
        .sum();
    let level = match highest.severity {
        Severity::Critical => "Critical",
        Severity::High => "High",
        Severity::Medium => "Moderate",
        Severity::Low | Severity::Informational => "Low",
    };
    format!(
        "Overall risk level: {}. {} active issue(s) remain, {} of them rated Critical or High.",
        level, total, priority
    )
}

/// Milestone dates of the engagement
pub fn render_timeline(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let timeline = &ctx.record.timeline;
    let geometry = *pm.geometry();

    heading(pm, Section::Timeline, "Audit Timeline")?;

    let width = geometry.content_width();
    let table = Table::new(vec![width / 2.0, width / 2.0])
        .with_header(["Milestone", "Date"])
        .with_row(["Audit Request".to_string(), format_date(timeline.request.as_deref())])
        .with_row(["Onboarding".to_string(), format_date(timeline.onboarding.as_deref())])
        .with_row(["Audit Preview".to_string(), format_date(timeline.preview.as_deref())])
        .with_row(["Audit Release".to_string(), format_date(timeline.release.as_deref())]);
    draw_table(pm, ctx.fonts, &table, geometry.margin_left, |_, _| Ok(()))?;

    end_section(pm)
}
