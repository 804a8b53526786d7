use crate::layout::{draw_table, DrawOp, LayoutError, PageManager, Section, Table};
use crate::render::context::{format_amount, RenderContext};
use crate::render::theme;

use super::{detail_table, end_section, heading, subheading};

/// KYC block, drawn only when at least one KYC field is present
pub fn render_kyc(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let fields = ctx.record.kyc.as_ref().map(|kyc| kyc.fields()).unwrap_or_default();
    if fields.is_empty() {
        return Ok(());
    }
    let geometry = *pm.geometry();

    heading(pm, Section::Kyc, "KYC Verification")?;
    let rows = fields.into_iter().map(|(label, value)| (label, value.to_string()));
    let table = detail_table(rows, geometry.content_width());
    draw_table(pm, ctx.fonts, &table, geometry.margin_left, |_, _| Ok(()))?;

    end_section(pm)
}

/// Token allocations with their share of the total. Needs the enable flag
/// and at least one allocation.
pub fn render_distribution(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let Some(distribution) = ctx
        .record
        .token_distribution
        .as_ref()
        .filter(|d| d.enabled && !d.allocations.is_empty())
    else {
        return Ok(());
    };
    let geometry = *pm.geometry();
    let width = geometry.content_width();

    heading(pm, Section::TokenDistribution, "Token Distribution")?;

    let total: f64 = distribution
        .allocations
        .iter()
        .map(|a| a.amount)
        .filter(|a| a.is_finite() && *a > 0.0)
        .sum();
    let shares: Vec<f64> = distribution
        .allocations
        .iter()
        .map(|a| {
            if total > 0.0 && a.amount.is_finite() && a.amount > 0.0 {
                a.amount / total
            } else {
                0.0
            }
        })
        .collect();

    let mut table = Table::new(vec![130.0, 100.0, 80.0, width - 310.0])
        .with_header(["Allocation", "Amount", "Share", "Description"]);
    for (allocation, share) in distribution.allocations.iter().zip(&shares) {
        table = table.with_row([
            allocation.name.clone(),
            format_amount(allocation.amount),
            format!("{:.2}%", share * 100.0),
            allocation.description.clone().unwrap_or_default(),
        ]);
    }

    draw_table(pm, ctx.fonts, &table, geometry.margin_left, |pm, cell| {
        if cell.column != 2 {
            return Ok(());
        }
        let Some(&share) = cell.row.and_then(|row| shares.get(row)) else {
            return Ok(());
        };
        let padding = table.theme.padding;
        let track = cell.width - 2.0 * padding;
        let y = cell.y + cell.height - padding / 2.0 - 2.0;
        pm.draw(DrawOp::FillRect {
            x: cell.x + padding,
            y,
            width: track,
            height: 2.0,
            color: theme::TRACK,
        })?;
        if share > 0.0 {
            pm.draw(DrawOp::FillRect {
                x: cell.x + padding,
                y,
                width: track * share as f32,
                height: 2.0,
                color: theme::PRIMARY,
            })?;
        }
        Ok(())
    })?;

    end_section(pm)
}

/// Call graph and inheritance diagrams whose flag and URL are both set.
/// A diagram whose image failed to load keeps its title only.
pub fn render_diagrams(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let diagrams = ctx.record.graphs.enabled();
    if diagrams.is_empty() {
        return Ok(());
    }
    let geometry = *pm.geometry();

    heading(pm, Section::Diagrams, "Contract Diagrams")?;
    for (title, url) in diagrams {
        subheading(pm, title)?;
        if let Some(image) = ctx.images.get(url) {
            let max_height = geometry.usable_height() - theme::SUBHEADING.line_height() - 10.0;
            let (width, height) = image.fit(geometry.content_width(), max_height);
            let top = pm.ensure_space(height)?;
            let x = geometry.margin_left + (geometry.content_width() - width) / 2.0;
            ctx.image(pm, url, x, top, width, height)?;
            pm.advance(height)?;
        }
        pm.advance(12.0)?;
    }

    end_section(pm)
}

/// Project links, drawn only when at least one is set
pub fn render_socials(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let links = ctx.record.socials.links();
    if links.is_empty() {
        return Ok(());
    }
    let geometry = *pm.geometry();
    let width = geometry.content_width();

    heading(pm, Section::SocialLinks, "Social Links")?;
    let mut table = Table::new(vec![120.0, width - 120.0]).with_header(["Channel", "Link"]);
    for (label, link) in links {
        table = table.with_row([label, link]);
    }
    draw_table(pm, ctx.fonts, &table, geometry.margin_left, |_, _| Ok(()))?;

    end_section(pm)
}
