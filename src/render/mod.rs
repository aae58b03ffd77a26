//! # Document Renderer
//!
//! Draws one custody slip onto a fresh [`Canvas`], top to bottom:
//!
//! ```text
//!            INVENTORY CUSTODIAN SLIP            title, underlined
//! Entity Name: ________                          identification block
//! Fund Cluster: ________
//! ICS No.: ________
//! ┌───┬────┬──────┬──────┬─────────┬─────┬─────┐
//! │Qty│Unit│ Cost │Total │  Desc.  │ No. │Life │  item table
//! ├───┴────┴──────┴──────┼─────────┴─────┴─────┤
//! │ Received from: ...   │ Received by: ...    │  signature table
//! └──────────────────────┴─────────────────────┘
//! ```
//!
//! Every stage runs once and any failure aborts the render. The caller never
//! sees a partially drawn canvas.

use crate::canvas::{Canvas, PageState};
use crate::error::Result;
use crate::font::{FontSpec, TextMeasure};
use crate::model::DocumentBundle;
use crate::style::RenderStyle;
use crate::table::{Align, ColumnSpec, TableLayout};

/// Item table headings, in column order.
pub const ITEM_HEADER: [&str; 7] = [
    "Quantity",
    "Unit",
    "Unit Cost",
    "Total Cost",
    "Description",
    "Inventory Item No.",
    "Estimated Useful Life",
];

/// Column shares and alignment of the item table.
pub fn item_columns() -> Vec<ColumnSpec> {
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

/// Issuer on the left, recipient on the right.
pub fn signature_columns() -> Vec<ColumnSpec> {
    vec![ColumnSpec::new(0.5, Align::Left), ColumnSpec::new(0.5, Align::Left)]
}

pub struct DocumentRenderer<'a, M: TextMeasure + ?Sized> {
    measure: &'a M,
    style: &'a RenderStyle,
    title: &'a str,
}

impl<'a, M: TextMeasure + ?Sized> DocumentRenderer<'a, M> {
    pub fn new(measure: &'a M, style: &'a RenderStyle, title: &'a str) -> Self {
        Self {
            measure,
            style,
            title,
        }
    }

    /// Lay out the whole slip and return the finished canvas.
    pub fn render(&self, bundle: &DocumentBundle) -> Result<Canvas> {
        let mut canvas = Canvas::new(self.style.page_size);
        let mut page = canvas.page_state(self.style.margins);
        let request = &bundle.request;

        self.draw_title(&mut canvas, &mut page)?;

        self.draw_field(&mut canvas, &mut page, "Entity Name: ", &request.entity_name)?;
        self.draw_field(&mut canvas, &mut page, "Fund Cluster: ", &request.fund_cluster)?;
        self.draw_field(&mut canvas, &mut page, "ICS No.: ", &request.document_number)?;
        page.cursor_y += self.style.table_gap;

        let header: Vec<String> = ITEM_HEADER.iter().map(|h| h.to_string()).collect();
        let cursor = TableLayout::new(self.measure, self.style).render(
            &mut canvas,
            &mut page,
            &item_columns(),
            &header,
            &[bundle.item_row()],
        )?;

        page.cursor_y = cursor + self.style.signature_gap;
        let signatures = vec![bundle.issuer_block.clone(), bundle.recipient_block.clone()];
        TableLayout::new(self.measure, self.style).render(
            &mut canvas,
            &mut page,
            &signature_columns(),
            &[],
            &[signatures],
        )?;

        self.stamp_page_numbers(&mut canvas, &page)?;

        log::debug!(
            "rendered document {} on {} page(s)",
            request.document_number,
            canvas.page_count()
        );
        Ok(canvas)
    }

    /// Centered title with an underline exactly as wide as the text.
    fn draw_title(&self, canvas: &mut Canvas, page: &mut PageState) -> Result<()> {
        let font = &self.style.title_font;
        let width = self.measure.measure(self.title, font)?;
        let x = page.content_left() + (page.content_width() - width) / 2.0;
        let baseline = page.cursor_y + self.measure.ascent(font)?;

        canvas.draw_text(self.title, x, baseline, font);
        let rule_y = baseline + self.style.underline_offset;
        canvas.draw_line(x, rule_y, x + width, rule_y, self.style.underline_weight);

        page.cursor_y += font.size * self.style.line_height + self.style.title_gap;
        Ok(())
    }

    /// `label` at the left margin followed by `value` with an underline that
    /// starts where the label ends. The underline is drawn even for an empty
    /// value.
    fn draw_field(&self, canvas: &mut Canvas, page: &mut PageState, label: &str, value: &str) -> Result<()> {
        let label_font = &self.style.label_font;
        let value_font = &self.style.value_font;
        let baseline = page.cursor_y + self.line_ascent(label_font, value_font)?;

        let left = page.content_left();
        canvas.draw_text(label, left, baseline, label_font);

        let value_x = left + self.measure.measure(label, label_font)?;
        let value_width = self.measure.measure(value, value_font)?;
        if !value.is_empty() {
            canvas.draw_text(value, value_x, baseline, value_font);
        }
        let rule_y = baseline + self.style.underline_offset;
        canvas.draw_line(value_x, rule_y, value_x + value_width, rule_y, self.style.underline_weight);

        page.cursor_y += self.style.field_spacing;
        Ok(())
    }

    fn line_ascent(&self, a: &FontSpec, b: &FontSpec) -> Result<f64> {
        Ok(self.measure.ascent(a)?.max(self.measure.ascent(b)?))
    }

    /// "Page N of M" centered in the bottom margin. Pages whose content
    /// already runs into the margin get no footer.
    fn stamp_page_numbers(&self, canvas: &mut Canvas, page: &PageState) -> Result<()> {
        let total = canvas.page_count();
        if !self.style.page_numbers || total < 2 {
            return Ok(());
        }
        let font = &self.style.footer_font;
        let y = page.page_height - page.margins.bottom / 2.0;
        for index in 0..total {
            if canvas.pages()[index]
                .lowest_y()
                .is_some_and(|lowest| lowest > page.bottom_limit())
            {
                log::debug!("page {} overflows its bottom margin; no footer", index + 1);
                continue;
            }
            let text = format!("Page {} of {}", index + 1, total);
            let width = self.measure.measure(&text, font)?;
            let x = page.content_left() + (page.content_width() - width) / 2.0;
            canvas.draw_text_on(index, &text, x, y, font);
        }
        Ok(())
    }
}
