//! # Render Style
//!
//! Every presentational parameter of the slip lives in one [`RenderStyle`]
//! value that is handed to the renderer once. Draw calls never carry inline
//! styling of their own.

use serde::{Deserialize, Serialize};

use crate::canvas::{Margins, PageSize};
use crate::font::FontSpec;

/// An RGB color with components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Fonts, weights, fills and spacing for the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderStyle {
    pub page_size: PageSize,
    pub margins: Margins,

    pub title_font: FontSpec,
    /// Labels of the identification block ("Entity Name:").
    pub label_font: FontSpec,
    /// Underlined values of the identification block.
    pub value_font: FontSpec,
    pub header_font: FontSpec,
    pub body_font: FontSpec,
    pub footer_font: FontSpec,

    /// Background of table header cells.
    pub header_fill: Color,
    /// Stroke weight of table borders.
    pub border_weight: f64,
    /// Stroke weight of title and value underlines.
    pub underline_weight: f64,
    /// Distance from a baseline down to its underline.
    pub underline_offset: f64,
    /// Inner padding of every table cell, on all four sides.
    pub cell_padding: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,

    /// Space below the title block.
    pub title_gap: f64,
    /// Vertical distance between identification lines.
    pub field_spacing: f64,
    /// Space between the identification block and the item table.
    pub table_gap: f64,
    /// Space between the item table and the signature block.
    pub signature_gap: f64,

    /// Redraw the header row at the top of continuation pages.
    pub repeat_header: bool,
    /// Stamp "Page N of M" at the bottom of every page of multi-page output.
    pub page_numbers: bool,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margins: Margins::uniform(54.0),
            title_font: FontSpec::new("Helvetica", 14.0).bold(),
            label_font: FontSpec::new("Helvetica", 10.0).bold(),
            value_font: FontSpec::new("Helvetica", 10.0),
            header_font: FontSpec::new("Helvetica", 9.0).bold(),
            body_font: FontSpec::new("Helvetica", 9.0),
            footer_font: FontSpec::new("Helvetica", 8.0),
            header_fill: Color::rgb(0.9, 0.9, 0.9),
            border_weight: 0.5,
            underline_weight: 0.75,
            underline_offset: 2.0,
            cell_padding: 4.0,
            line_height: 1.3,
            title_gap: 18.0,
            field_spacing: 16.0,
            table_gap: 12.0,
            signature_gap: 0.0,
            repeat_header: true,
            page_numbers: true,
        }
    }
}
