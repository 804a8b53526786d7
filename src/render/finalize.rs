use crate::layout::text::{text_at, TextStyle};
use crate::layout::{DrawOp, FontSet, Geometry, Page, PageKind};

use super::theme;

const FOOTER: TextStyle = theme::SMALL;

/// Second pass over the finished pages: stamps every page except the cover
/// with a rule, `left` text, centred `center` text and "Page X of Y".
pub fn stamp_footers(pages: &mut [Page], geometry: &Geometry, fonts: &FontSet, left: &str, center: &str) {
    let total = pages.len();
    let rule_y = geometry.bottom_limit() + 12.0;
    let top = rule_y + 6.0;
    let right = geometry.width - geometry.margin_right;

    for (index, page) in pages.iter_mut().enumerate() {
        if page.kind == PageKind::Cover {
            continue;
        }
        let number = format!("Page {} of {}", index + 1, total);
        let number_width = fonts.text_width(FOOTER.font, FOOTER.size, &number);
        let center_width = fonts.text_width(FOOTER.font, FOOTER.size, center);

        page.ops.push(DrawOp::Line {
            x1: geometry.margin_left,
            y1: rule_y,
            x2: right,
            y2: rule_y,
            color: theme::RULE,
            line_width: 0.5,
        });
        page.ops.push(text_at(geometry.margin_left, top, left, FOOTER));
        page.ops.push(text_at((geometry.width - center_width) / 2.0, top, center, FOOTER));
        page.ops.push(text_at(right - number_width, top, &number, FOOTER));
    }
}
