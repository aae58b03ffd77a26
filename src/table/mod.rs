//! # Table Layout
//!
//! Lays out a header row and body rows onto the canvas, one row at a time.
//!
//! A table runs through `Idle → HeaderDrawn → BodyRow(i) → Finished` exactly
//! once. Column widths are `available_width × weight`. Cell text is wrapped
//! greedily and a row is as tall as its tallest cell.
//!
//! Rows are never split across pages. If a row does not fit under the cursor
//! the table continues on a new page, with the header redrawn when
//! [`RenderStyle::repeat_header`] is set. A row taller than a whole page is
//! drawn where it starts and overflows the bottom margin.

use crate::canvas::{Canvas, PageState};
use crate::error::{Result, SlipError};
use crate::font::{FontSpec, TextMeasure};
use crate::style::RenderStyle;
use crate::text::wrap_text;

/// Horizontal placement of text inside a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// One column: its share of the available width and its text alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    pub weight: f64,
    pub align: Align,
}

impl ColumnSpec {
    pub fn new(weight: f64, align: Align) -> Self {
        Self { weight, align }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Idle,
    HeaderDrawn,
    /// The body row with this index was the last one drawn.
    BodyRow(usize),
    Finished,
}

/// Absolute widths for `columns` sharing `available` points.
///
/// Every weight must lie in (0, 1] and the weights must not sum above 1.0.
/// Weights below 1.0 in total leave the remainder of the width empty.
pub fn column_widths(columns: &[ColumnSpec], available: f64) -> Result<Vec<f64>> {
    if columns.is_empty() {
        return Err(SlipError::InvalidColumns("a table needs at least one column".to_string()));
    }
    for (i, col) in columns.iter().enumerate() {
        if !(col.weight > 0.0 && col.weight <= 1.0) {
            return Err(SlipError::InvalidColumns(format!(
                "column {} has weight {}, expected a value in (0, 1]",
                i, col.weight
            )));
        }
    }
    let total: f64 = columns.iter().map(|c| c.weight).sum();
    if total > 1.0 + 1e-9 {
        return Err(SlipError::InvalidColumns(format!(
            "column weights sum to {}, which exceeds 1.0",
            total
        )));
    }
    Ok(columns.iter().map(|c| available * c.weight).collect())
}

/// A row after wrapping: the lines of every cell and the row height.
struct MeasuredRow {
    cells: Vec<Vec<String>>,
    height: f64,
}

/// Lays out one table. Create a fresh layout per table.
pub struct TableLayout<'a, M: TextMeasure + ?Sized> {
    measure: &'a M,
    style: &'a RenderStyle,
    state: TableState,
}

impl<'a, M: TextMeasure + ?Sized> TableLayout<'a, M> {
    pub fn new(measure: &'a M, style: &'a RenderStyle) -> Self {
        Self {
            measure,
            style,
            state: TableState::Idle,
        }
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    /// Draw the table at `page.cursor_y` and return the cursor below it.
    ///
    /// An empty `header` draws no header row. Rows shorter than `columns`
    /// are padded with empty cells.
    pub fn render(
        &mut self,
        canvas: &mut Canvas,
        page: &mut PageState,
        columns: &[ColumnSpec],
        header: &[String],
        rows: &[Vec<String>],
    ) -> Result<f64> {
        if self.state != TableState::Idle {
            return Err(SlipError::Layout(format!(
                "table layout already used (state {:?})",
                self.state
            )));
        }

        let widths = column_widths(columns, page.content_width())?;
        if header.len() > columns.len() {
            return Err(SlipError::Layout(format!(
                "header has {} cells but the table has {} columns",
                header.len(),
                columns.len()
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() > columns.len() {
                return Err(SlipError::Layout(format!(
                    "row {} has {} cells but the table has {} columns",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
        }

        let header_row = if header.is_empty() {
            None
        } else {
            Some(self.measure_row(header, &widths, &self.style.header_font)?)
        };
        let body: Vec<MeasuredRow> = rows
            .iter()
            .map(|row| self.measure_row(row, &widths, &self.style.body_font))
            .collect::<Result<_>>()?;
        let header_height = header_row.as_ref().map_or(0.0, |h| h.height);

        // Keep the header together with the first body row.
        let first_height = body.first().map_or(0.0, |r| r.height);
        if !page.at_page_top() && !page.fits(header_height + first_height) {
            canvas.new_page(page);
        }

        // True while the current page holds nothing of this table except
        // possibly its header, and the table started at the page top.
        let mut fresh_page = page.at_page_top();

        if let Some(h) = &header_row {
            self.draw_row(canvas, page, columns, &widths, h, &self.style.header_font, true)?;
        }
        self.state = TableState::HeaderDrawn;

        for (i, row) in body.iter().enumerate() {
            if !page.fits(row.height) && !fresh_page {
                canvas.new_page(page);
                if self.style.repeat_header {
                    if let Some(h) = &header_row {
                        self.draw_row(canvas, page, columns, &widths, h, &self.style.header_font, true)?;
                    }
                }
            }

            if !page.fits(row.height) {
                log::warn!(
                    "table row {} is {:.1}pt tall and overflows the bottom margin; the page gets no footer",
                    i,
                    row.height
                );
            }

            log::trace!(
                "table row {}: {} line(s), height {:.2}pt at y {:.2}",
                i,
                row.cells.iter().map(Vec::len).max().unwrap_or(0),
                row.height,
                page.cursor_y
            );
            self.draw_row(canvas, page, columns, &widths, row, &self.style.body_font, false)?;
            fresh_page = false;
            self.state = TableState::BodyRow(i);
        }

        self.state = TableState::Finished;
        log::debug!(
            "table finished: {} row(s), cursor at {:.2} on page {}",
            rows.len(),
            page.cursor_y,
            canvas.page_count()
        );
        Ok(page.cursor_y)
    }

    fn line_height(&self, font: &FontSpec) -> f64 {
        font.size * self.style.line_height
    }

    fn measure_row(&self, cells: &[String], widths: &[f64], font: &FontSpec) -> Result<MeasuredRow> {
        let pad = self.style.cell_padding;
        let mut wrapped = Vec::with_capacity(widths.len());
        for (i, width) in widths.iter().enumerate() {
            let text = cells.get(i).map(String::as_str).unwrap_or("");
            let inner = (width - 2.0 * pad).max(0.0);
            wrapped.push(wrap_text(self.measure, text, font, inner)?);
        }
        let max_lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        Ok(MeasuredRow {
            cells: wrapped,
            height: max_lines as f64 * self.line_height(font) + 2.0 * pad,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_row(
        &self,
        canvas: &mut Canvas,
        page: &mut PageState,
        columns: &[ColumnSpec],
        widths: &[f64],
        row: &MeasuredRow,
        font: &FontSpec,
        is_header: bool,
    ) -> Result<()> {
        let pad = self.style.cell_padding;
        let weight = self.style.border_weight;
        let left = page.content_left();
        let total_width: f64 = widths.iter().sum();
        let top = page.cursor_y;
        let bottom = top + row.height;
        let lh = self.line_height(font);
        let ascent = self.measure.ascent(font)?;
        let half_leading = (lh - font.size) / 2.0;

        if is_header {
            canvas.fill_rect(left, top, total_width, row.height, self.style.header_fill);
        }

        let mut x = left;
        for (i, width) in widths.iter().enumerate() {
            let align = if is_header { Align::Center } else { columns[i].align };
            for (k, line) in row.cells[i].iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let text_width = self.measure.measure(line, font)?;
                let text_x = match align {
                    Align::Left => x + pad,
                    Align::Center => x + (width - text_width) / 2.0,
                    Align::Right => x + width - pad - text_width,
                };
                let baseline = top + pad + k as f64 * lh + half_leading + ascent;
                canvas.draw_text(line, text_x, baseline, font);
            }
            x += width;
        }

        canvas.draw_line(left, top, left + total_width, top, weight);
        canvas.draw_line(left, bottom, left + total_width, bottom, weight);
        let mut edge = left;
        canvas.draw_line(edge, top, edge, bottom, weight);
        for width in widths {
            edge += width;
            canvas.draw_line(edge, top, edge, bottom, weight);
        }

        page.cursor_y = bottom;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawOp, PageSize};
    use crate::font::FontContext;

    fn item_columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new(0.08, Align::Center),
            ColumnSpec::new(0.08, Align::Center),
            ColumnSpec::new(0.13, Align::Right),
            ColumnSpec::new(0.13, Align::Right),
            ColumnSpec::new(0.30, Align::Left),
            ColumnSpec::new(0.14, Align::Center),
            ColumnSpec::new(0.14, Align::Center),
        ]
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn texts_on(canvas: &Canvas, page: usize) -> Vec<String> {
        canvas.pages()[page]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_column_width_sum_matches_weight_sum() {
        let available = 487.28;
        let widths = column_widths(&item_columns(), available).unwrap();
        let sum: f64 = widths.iter().sum();
        assert!((sum - available).abs() < 1e-9);

        let half = vec![ColumnSpec::new(0.2, Align::Left), ColumnSpec::new(0.3, Align::Left)];
        let sum: f64 = column_widths(&half, available).unwrap().iter().sum();
        assert!((sum - available * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_column_weights_rejected() {
        let zero = vec![ColumnSpec::new(0.0, Align::Left)];
        assert!(matches!(column_widths(&zero, 100.0), Err(SlipError::InvalidColumns(_))));

        let too_big = vec![ColumnSpec::new(1.5, Align::Left)];
        assert!(matches!(column_widths(&too_big, 100.0), Err(SlipError::InvalidColumns(_))));

        let over = vec![ColumnSpec::new(0.6, Align::Left), ColumnSpec::new(0.6, Align::Left)];
        assert!(matches!(column_widths(&over, 100.0), Err(SlipError::InvalidColumns(_))));

        assert!(matches!(column_widths(&[], 100.0), Err(SlipError::InvalidColumns(_))));
    }

    #[test]
    fn test_state_transitions() {
        let fonts = FontContext::new();
        let style = RenderStyle::default();
        let mut canvas = Canvas::new(PageSize::A4);
        let mut page = canvas.page_state(style.margins);
        let mut table = TableLayout::new(&fonts, &style);
        assert_eq!(table.state(), TableState::Idle);

        let header = strings(&["A", "B"]);
        let cols = vec![ColumnSpec::new(0.5, Align::Left), ColumnSpec::new(0.5, Align::Left)];
        table
            .render(&mut canvas, &mut page, &cols, &header, &[strings(&["1", "2"])])
            .unwrap();
        assert_eq!(table.state(), TableState::Finished);

        let again = table.render(&mut canvas, &mut page, &cols, &header, &[]);
        assert!(matches!(again, Err(SlipError::Layout(_))));
    }

    #[test]
    fn test_returns_cursor_below_table() {
        let fonts = FontContext::new();
        let style = RenderStyle::default();
        let mut canvas = Canvas::new(PageSize::A4);
        let mut page = canvas.page_state(style.margins);
        let start = page.cursor_y;
        let cursor = TableLayout::new(&fonts, &style)
            .render(
                &mut canvas,
                &mut page,
                &[ColumnSpec::new(1.0, Align::Left)],
                &strings(&["Header"]),
                &[strings(&["Row"])],
            )
            .unwrap();

        // Header and body each hold one line.
        let row = 9.0 * style.line_height + 2.0 * style.cell_padding;
        assert!((cursor - (start + 2.0 * row)).abs() < 1e-9);
        assert_eq!(cursor, page.cursor_y);
    }

    #[test]
    fn test_alignment_offsets() {
        let fonts = FontContext::new();
        let style = RenderStyle::default();
        let mut canvas = Canvas::new(PageSize::A4);
        let mut page = canvas.page_state(style.margins);
        let cols = vec![
            ColumnSpec::new(0.25, Align::Left),
            ColumnSpec::new(0.25, Align::Center),
            ColumnSpec::new(0.25, Align::Right),
        ];
        TableLayout::new(&fonts, &style)
            .render(&mut canvas, &mut page, &cols, &[], &[strings(&["L", "C", "R"])])
            .unwrap();

        let width = page.content_width() * 0.25;
        let left = page.content_left();
        let w = |s: &str| fonts.measure(s, &style.body_font).unwrap();
        let xs: Vec<f64> = canvas.pages()[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        assert_eq!(xs.len(), 3);
        assert!((xs[0] - (left + style.cell_padding)).abs() < 1e-9);
        assert!((xs[1] - (left + width + (width - w("C")) / 2.0)).abs() < 1e-9);
        assert!((xs[2] - (left + 3.0 * width - style.cell_padding - w("R"))).abs() < 1e-9);
    }

    #[test]
    fn test_header_repeats_on_continuation_page() {
        let fonts = FontContext::new();
        let style = RenderStyle::default();
        let mut canvas = Canvas::new(PageSize::A4);
        let mut page = canvas.page_state(style.margins);
        let rows: Vec<Vec<String>> = (0..80).map(|i| vec![format!("row {}", i)]).collect();

        TableLayout::new(&fonts, &style)
            .render(
                &mut canvas,
                &mut page,
                &[ColumnSpec::new(1.0, Align::Left)],
                &strings(&["Description"]),
                &rows,
            )
            .unwrap();

        assert!(canvas.page_count() > 1);
        for p in 0..canvas.page_count() {
            assert_eq!(texts_on(&canvas, p)[0], "Description", "page {} lacks header", p + 1);
        }
        // Every row was drawn exactly once.
        let total: usize = (0..canvas.page_count())
            .map(|p| texts_on(&canvas, p).iter().filter(|t| t.starts_with("row ")).count())
            .sum();
        assert_eq!(total, 80);
    }

    #[test]
    fn test_header_not_repeated_when_disabled() {
        let fonts = FontContext::new();
        let style = RenderStyle {
            repeat_header: false,
            ..Default::default()
        };
        let mut canvas = Canvas::new(PageSize::A4);
        let mut page = canvas.page_state(style.margins);
        let rows: Vec<Vec<String>> = (0..80).map(|i| vec![format!("row {}", i)]).collect();
        TableLayout::new(&fonts, &style)
            .render(
                &mut canvas,
                &mut page,
                &[ColumnSpec::new(1.0, Align::Left)],
                &strings(&["Description"]),
                &rows,
            )
            .unwrap();
        assert!(canvas.page_count() > 1);
        assert!(texts_on(&canvas, 1)[0].starts_with("row "));
        assert!(!texts_on(&canvas, 1).contains(&"Description".to_string()));
    }

    #[test]
    fn test_row_taller_than_page_overflows_without_error() {
        let fonts = FontContext::new();
        let style = RenderStyle::default();
        let mut canvas = Canvas::new(PageSize::A4);
        let mut page = canvas.page_state(style.margins);
        let description = "word ".repeat(4000);

        let cursor = TableLayout::new(&fonts, &style)
            .render(
                &mut canvas,
                &mut page,
                &item_columns(),
                &strings(&["Qty", "Unit", "Unit Cost", "Total Cost", "Description", "Code", "Life"]),
                &[strings(&["1", "pc", "1.00", "1.00", &description, "X", "5 years"])],
            )
            .unwrap();

        assert_eq!(canvas.page_count(), 1);
        assert!(cursor > page.bottom_limit());
        let words = texts_on(&canvas, 0)
            .iter()
            .map(|t| t.split_whitespace().filter(|w| *w == "word").count())
            .sum::<usize>();
        assert_eq!(words, 4000, "no text may be truncated");
    }

    #[test]
    fn test_table_moves_to_new_page_with_header() {
        let fonts = FontContext::new();
        let style = RenderStyle::default();
        let mut canvas = Canvas::new(PageSize::A4);
        let mut page = canvas.page_state(style.margins);
        page.cursor_y = page.bottom_limit() - 20.0;

        TableLayout::new(&fonts, &style)
            .render(
                &mut canvas,
                &mut page,
                &[ColumnSpec::new(1.0, Align::Left)],
                &strings(&["Header"]),
                &[strings(&["Body"])],
            )
            .unwrap();

        assert_eq!(canvas.page_count(), 2);
        assert!(canvas.pages()[0].ops.is_empty());
        assert_eq!(texts_on(&canvas, 1), vec!["Header", "Body"]);
    }

    #[test]
    fn test_row_with_too_many_cells_rejected() {
        let fonts = FontContext::new();
        let style = RenderStyle::default();
        let mut canvas = Canvas::new(PageSize::A4);
        let mut page = canvas.page_state(style.margins);
        let result = TableLayout::new(&fonts, &style).render(
            &mut canvas,
            &mut page,
            &[ColumnSpec::new(1.0, Align::Left)],
            &[],
            &[strings(&["a", "b"])],
        );
        assert!(matches!(result, Err(SlipError::Layout(_))));
    }

    #[test]
    fn test_header_with_too_many_cells_rejected() {
        let fonts = FontContext::new();
        let style = RenderStyle::default();
        let mut canvas = Canvas::new(PageSize::A4);
        let mut page = canvas.page_state(style.margins);
        let mut table = TableLayout::new(&fonts, &style);
        let result = table.render(
            &mut canvas,
            &mut page,
            &[ColumnSpec::new(1.0, Align::Left)],
            &strings(&["Quantity", "Unit"]),
            &[strings(&["a"])],
        );
        assert!(matches!(result, Err(SlipError::Layout(ref msg)) if msg.contains("header")));
        assert_eq!(table.state(), TableState::Idle);
        assert!(canvas.pages()[0].ops.is_empty());
    }
}
