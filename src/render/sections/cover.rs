use crate::layout::text::{centered, text_at, TextStyle};
use crate::layout::{Color, DrawOp, FontStyle, LayoutError, PageManager, Section};
use crate::render::context::RenderContext;
use crate::render::theme;

const BAND_HEIGHT: f32 = 190.0;
const LOGO_BOX: f32 = 120.0;

/// Cover page: title band, logo, project identity. Always ends with a page
/// break so the summary starts on a fresh page.
pub fn render(pm: &mut PageManager, ctx: &RenderContext<'_>) -> Result<(), LayoutError> {
    let geometry = *pm.geometry();
    let record = ctx.record;
    pm.mark(Section::Cover);

    pm.draw(DrawOp::FillRect {
        x: 0.0,
        y: 0.0,
        width: geometry.width,
        height: BAND_HEIGHT,
        color: theme::PRIMARY,
    })?;
    let org = TextStyle::new(FontStyle::Bold, 12.0, Color::WHITE);
    let title = TextStyle::new(FontStyle::Bold, 26.0, Color::WHITE);
    let subtitle = TextStyle::new(FontStyle::Regular, 12.0, Color::rgb(191, 219, 254));
    centered(pm, ctx.fonts, &ctx.org_name.to_uppercase(), org)?;
    pm.advance(20.0)?;
    centered(pm, ctx.fonts, "Smart Contract", title)?;
    centered(pm, ctx.fonts, "Security Audit", title)?;
    pm.advance(6.0)?;
    centered(pm, ctx.fonts, "Audit Report", subtitle)?;

    let band_bottom = BAND_HEIGHT + 40.0;
    if pm.y() < band_bottom {
        pm.advance(band_bottom - pm.y())?;
    }

    let logo = ctx
        .logo_key
        .and_then(|key| ctx.images.get(key).map(|image| (key, image)));
    if let Some((key, image)) = logo {
        let (width, height) = image.fit(LOGO_BOX, LOGO_BOX);
        let top = pm.ensure_space(height)?;
        ctx.image(pm, key, (geometry.width - width) / 2.0, top, width, height)?;
        pm.advance(height + 24.0)?;
    }

    let name = TextStyle::new(FontStyle::Bold, 24.0, theme::TEXT);
    centered(pm, ctx.fonts, &record.name, name)?;
    if let Some(symbol) = record.symbol.as_deref().filter(|s| !s.trim().is_empty()) {
        centered(pm, ctx.fonts, &format!("({})", symbol.trim()), theme::SUBHEADING)?;
    }
    if let Some(platform) = record.platform.as_deref().filter(|s| !s.trim().is_empty()) {
        centered(pm, ctx.fonts, platform.trim(), theme::BODY)?;
    }

    pm.advance(40.0)?;
    let meta = TextStyle::new(FontStyle::Regular, 11.0, theme::MUTED);
    centered(pm, ctx.fonts, &format!("Report Date: {}", ctx.generated_label()), meta)?;
    centered(pm, ctx.fonts, &format!("Prepared by {}", ctx.org_name), meta)?;

    let bottom = geometry.bottom_limit() - theme::SMALL.line_height();
    if pm.y() < bottom {
        pm.advance(bottom - pm.y())?;
        let notice = "This report is provided for informational purposes and is not investment advice.";
        let width = ctx.fonts.text_width(theme::SMALL.font, theme::SMALL.size, notice);
        pm.draw(text_at(
            ((geometry.width - width) / 2.0).max(geometry.margin_left),
            pm.y(),
            notice,
            theme::SMALL,
        ))?;
    }

    pm.new_page();
    Ok(())
}
