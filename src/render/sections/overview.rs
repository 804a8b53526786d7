use crate::assets::Icon;
use crate::layout::{draw_table, LayoutError, PageManager, Section, Table};
use crate::render::context::RenderContext;
use crate::render::theme;

use super::{end_section, heading};

fn flag_result(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "Detected",
        Some(false) => "Not Detected",
        None => "N/A",
    }
}

fn tax(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v),
        _ => "N/A".to_string(),
    }
}

/// Contract risk checks with pass/fail icons, followed by the taxes
pub fn render(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let overview = &ctx.record.overview;
    let geometry = *pm.geometry();
    let width = geometry.content_width();

    heading(pm, Section::RiskOverview, "Contract Risk Overview")?;

    let flags = overview.flags();
    let mut table = Table::new(vec![width * 0.6, width * 0.4])
        .with_header(["Check", "Result"])
        .with_indent(1, theme::ICON_SIZE + 4.0);
    for (label, flag) in &flags {
        table = table.with_row([label.to_string(), flag_result(*flag).to_string()]);
    }
    table = table
        .with_row(["Buy Tax".to_string(), tax(overview.buy_tax)])
        .with_row(["Sell Tax".to_string(), tax(overview.sell_tax)]);

    draw_table(pm, ctx.fonts, &table, geometry.margin_left, |pm, cell| {
        if cell.column != 1 {
            return Ok(());
        }
        let Some(Some(detected)) = cell.row.and_then(|row| flags.get(row)).map(|(_, flag)| *flag)
        else {
            return Ok(());
        };
        ctx.icon(
            pm,
            Icon::for_flag(detected),
            cell.x + table.theme.padding,
            cell.y + table.theme.padding,
            theme::ICON_SIZE,
        )
    })?;

    end_section(pm)
}
