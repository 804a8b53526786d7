use super::cursor::{LayoutError, PageManager};
use super::fonts::FontSet;
use super::page::{Color, DrawOp, FontStyle};
use super::text::{text_at, TextStyle};

#[derive(Debug, Clone, Copy)]
pub struct TableTheme {
    pub header_fill: Color,
    pub header_text: Color,
    pub body_text: Color,
    pub stripe_fill: Option<Color>,
    pub border: Color,
    pub font_size: f32,
    pub padding: f32,
}

impl Default for TableTheme {
    fn default() -> Self {
        Self {
            header_fill: Color::rgb(31, 41, 55),
            header_text: Color::WHITE,
            body_text: Color::rgb(31, 41, 55),
            stripe_fill: Some(Color::rgb(243, 244, 246)),
            border: Color::rgb(209, 213, 219),
            font_size: 9.0,
            padding: 5.0,
        }
    }
}

/// Position and content of one drawn cell, handed to the cell hook
#[derive(Debug, Clone)]
pub struct Cell<'a> {
    /// Body row index; `None` for the header row
    pub row: Option<usize>,
    pub column: usize,
    pub text: &'a str,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Cell<'_> {
    pub fn is_header(&self) -> bool {
        self.row.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    pub column_widths: Vec<f32>,
    /// Extra left inset per column, leaving room for hook overlays
    pub column_indent: Vec<f32>,
    pub theme: TableTheme,
}

impl Table {
    pub fn new(column_widths: Vec<f32>) -> Self {
        let columns = column_widths.len();
        Self {
            header: None,
            rows: Vec::new(),
            column_widths,
            column_indent: vec![0.0; columns],
            theme: TableTheme::default(),
        }
    }

    pub fn with_header<S: Into<String>>(mut self, header: impl IntoIterator<Item = S>) -> Self {
        self.header = Some(header.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_row<S: Into<String>>(mut self, row: impl IntoIterator<Item = S>) -> Self {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_indent(mut self, column: usize, inset: f32) -> Self {
        if let Some(slot) = self.column_indent.get_mut(column) {
            *slot = inset;
        }
        self
    }

    pub fn with_theme(mut self, theme: TableTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn width(&self) -> f32 {
        self.column_widths.iter().sum()
    }

    fn style(&self, header: bool) -> TextStyle {
        if header {
            TextStyle::new(FontStyle::Bold, self.theme.font_size, self.theme.header_text)
        } else {
            TextStyle::new(FontStyle::Regular, self.theme.font_size, self.theme.body_text)
        }
    }

    fn wrap_row(&self, fonts: &FontSet, cells: &[String], header: bool) -> Vec<Vec<String>> {
        let style = self.style(header);
        self.column_widths
            .iter()
            .enumerate()
            .map(|(col, width)| {
                let text = cells.get(col).map(String::as_str).unwrap_or("");
                let inner = (width - 2.0 * self.theme.padding - self.column_indent[col]).max(1.0);
                fonts.wrap(style.font, style.size, text, inner)
            })
            .collect()
    }

    fn line_count(wrapped: &[Vec<String>]) -> usize {
        wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1)
    }

    fn row_height(&self, wrapped: &[Vec<String>], header: bool) -> f32 {
        self.segment_height(Self::line_count(wrapped), header)
    }

    fn segment_height(&self, lines: usize, header: bool) -> f32 {
        lines as f32 * self.style(header).line_height() + 2.0 * self.theme.padding
    }

    /// Body lines that fit in `available` points, padding included
    fn lines_fitting(&self, available: f32) -> usize {
        let inner = available - 2.0 * self.theme.padding;
        if inner <= 0.0 {
            return 0;
        }
        (inner / self.style(false).line_height() + 0.001).floor() as usize
    }
}

type HeaderRow<'t> = Option<(&'t Vec<String>, Vec<Vec<String>>)>;

/// Draw `table` at the cursor starting at `x`.
///
/// Space is checked per row, so tables may span pages; the header row is
/// repeated at the top of every continuation page. A row too tall for one
/// page is split between lines and continues below the repeated header.
/// `on_cell` runs once per cell after its background, text and border are
/// drawn; for a split row that is on its first piece.
pub fn draw_table<F>(
    pm: &mut PageManager,
    fonts: &FontSet,
    table: &Table,
    x: f32,
    mut on_cell: F,
) -> Result<(), LayoutError>
where
    F: FnMut(&mut PageManager, &Cell<'_>) -> Result<(), LayoutError>,
{
    let header: HeaderRow<'_> = table
        .header
        .as_ref()
        .map(|cells| (cells, table.wrap_row(fonts, cells, true)));
    let header_height = header
        .as_ref()
        .map(|(_, wrapped)| table.row_height(wrapped, true))
        .unwrap_or(0.0);

    let body: Vec<(&Vec<String>, Vec<Vec<String>>)> = table
        .rows
        .iter()
        .map(|cells| (cells, table.wrap_row(fonts, cells, false)))
        .collect();

    // Rows taller than this are split across pages
    let max_row = pm.geometry().usable_height() - header_height;
    let one_line = table.segment_height(1, false);
    if max_row < one_line {
        return Err(LayoutError::BlockTooTall {
            required: header_height + one_line,
            available: pm.geometry().usable_height(),
        });
    }

    // Keep the header together with the first body row, or its first line
    let first_row = body
        .first()
        .map(|(_, wrapped)| table.row_height(wrapped, false))
        .map(|height| if height > max_row { one_line } else { height })
        .unwrap_or(0.0);
    pm.ensure_space(header_height + first_row)?;
    repeat_header(pm, table, x, &header, header_height, &mut on_cell)?;

    for (index, (cells, wrapped)) in body.iter().enumerate() {
        let height = table.row_height(wrapped, false);
        let lines = Table::line_count(wrapped);

        if height <= max_row {
            let pages_before = pm.page_count();
            pm.ensure_space(height)?;
            if pm.page_count() != pages_before {
                repeat_header(pm, table, x, &header, header_height, &mut on_cell)?;
            }
            let band = Band { start: 0, count: lines, height };
            draw_row(pm, table, x, Some(index), cells, wrapped, band, Some(&mut on_cell))?;
            continue;
        }

        let mut start = 0;
        while start < lines {
            if table.lines_fitting(pm.remaining()) == 0 {
                pm.new_page();
                repeat_header(pm, table, x, &header, header_height, &mut on_cell)?;
            }
            let count = table.lines_fitting(pm.remaining()).clamp(1, lines - start);
            let band = Band {
                start,
                count,
                height: table.segment_height(count, false),
            };
            let hook = if start == 0 { Some(&mut on_cell) } else { None };
            draw_row(pm, table, x, Some(index), cells, wrapped, band, hook)?;
            start += count;
        }
    }

    Ok(())
}

fn repeat_header<F>(
    pm: &mut PageManager,
    table: &Table,
    x: f32,
    header: &HeaderRow<'_>,
    height: f32,
    on_cell: &mut F,
) -> Result<(), LayoutError>
where
    F: FnMut(&mut PageManager, &Cell<'_>) -> Result<(), LayoutError>,
{
    let Some((cells, wrapped)) = header else {
        return Ok(());
    };
    let band = Band {
        start: 0,
        count: Table::line_count(wrapped),
        height,
    };
    draw_row(pm, table, x, None, cells, wrapped, band, Some(on_cell))
}

/// The wrapped lines `start..start + count` of a row, drawn `height` tall
#[derive(Debug, Clone, Copy)]
struct Band {
    start: usize,
    count: usize,
    height: f32,
}

#[allow(clippy::too_many_arguments)]
fn draw_row<F>(
    pm: &mut PageManager,
    table: &Table,
    x: f32,
    row: Option<usize>,
    cells: &[String],
    wrapped: &[Vec<String>],
    band: Band,
    mut on_cell: Option<&mut F>,
) -> Result<(), LayoutError>
where
    F: FnMut(&mut PageManager, &Cell<'_>) -> Result<(), LayoutError>,
{
    let theme = &table.theme;
    let style = table.style(row.is_none());
    let top = pm.y();
    let height = band.height;

    let fill = match row {
        None => Some(theme.header_fill),
        Some(i) if i % 2 == 1 => theme.stripe_fill,
        Some(_) => None,
    };
    if let Some(color) = fill {
        pm.draw(DrawOp::FillRect {
            x,
            y: top,
            width: table.width(),
            height,
            color,
        })?;
    }

    let mut cell_x = x;
    for (col, width) in table.column_widths.iter().enumerate() {
        let text_x = cell_x + theme.padding + table.column_indent[col];
        let lines = wrapped[col].iter().skip(band.start).take(band.count);
        for (i, line) in lines.enumerate() {
            let line_top = top + theme.padding + i as f32 * style.line_height();
            pm.draw(text_at(text_x, line_top, line, style))?;
        }
        pm.draw(DrawOp::StrokeRect {
            x: cell_x,
            y: top,
            width: *width,
            height,
            color: theme.border,
            line_width: 0.5,
        })?;

        if let Some(hook) = on_cell.as_deref_mut() {
            let text = cells.get(col).map(String::as_str).unwrap_or("");
            hook(
                pm,
                &Cell {
                    row,
                    column: col,
                    text,
                    x: cell_x,
                    y: top,
                    width: *width,
                    height,
                },
            )?;
        }
        cell_x += width;
    }

    pm.advance(height)
}
