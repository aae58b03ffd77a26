//! # Page Canvas
//!
//! The drawable surface: a list of pages of fixed size, each holding the
//! primitive draw operations placed on it. Coordinates are in points with the
//! origin at the top-left corner of the page and `y` growing downward; the PDF
//! writer flips them on output.
//!
//! The canvas does not clip. Keeping content inside
//! `[margins.left, page_width - margins.right]` is the caller's job.
//!
//! The vertical cursor lives in [`PageState`], a separate value threaded by
//! `&mut` through every component of one render. It is never stored inside the
//! canvas or captured by a closure, so two renders can never share it.

use serde::{Deserialize, Serialize};

use crate::font::FontSpec;
use crate::style::Color;

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    /// 8.5 x 13 in, the common government long bond paper.
    Folio,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Folio => (612.0, 936.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(54.0)
    }
}

/// Mutable page geometry and cursor for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    /// Top of the next block to place.
    pub cursor_y: f64,
    pub page_width: f64,
    pub page_height: f64,
    pub margins: Margins,
}

impl PageState {
    /// A fresh state with the cursor at the top margin.
    pub fn new(page_width: f64, page_height: f64, margins: Margins) -> Self {
        Self {
            cursor_y: margins.top,
            page_width,
            page_height,
            margins,
        }
    }

    pub fn content_left(&self) -> f64 {
        self.margins.left
    }

    pub fn content_width(&self) -> f64 {
        self.page_width - self.margins.horizontal()
    }

    /// Height of the area between the top and bottom margins.
    pub fn content_height(&self) -> f64 {
        self.page_height - self.margins.vertical()
    }

    /// The lowest y content may reach.
    pub fn bottom_limit(&self) -> f64 {
        self.page_height - self.margins.bottom
    }

    /// Whether a block of `height` placed at the cursor stays above the bottom margin.
    pub fn fits(&self, height: f64) -> bool {
        self.cursor_y + height <= self.bottom_limit()
    }

    /// Whether nothing has been placed on the current page yet.
    pub fn at_page_top(&self) -> bool {
        self.cursor_y <= self.margins.top + 1e-6
    }
}

/// One primitive placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Baseline-anchored text starting at `x`.
    Text {
        x: f64,
        y: f64,
        text: String,
        font: FontSpec,
    },
    /// A straight stroked rule.
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        weight: f64,
    },
    /// A filled rectangle; `y` is its top edge.
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasPage {
    pub ops: Vec<DrawOp>,
}

impl CanvasPage {
    /// Largest y any operation reaches, or `None` on a blank page.
    pub fn lowest_y(&self) -> Option<f64> {
        self.ops
            .iter()
            .map(|op| match op {
                DrawOp::Text { y, .. } => *y,
                DrawOp::Line { y1, y2, .. } => y1.max(*y2),
                DrawOp::FillRect { y, height, .. } => y + height,
            })
            .reduce(f64::max)
    }
}

/// The page surface. Every page has the same physical size.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: f64,
    height: f64,
    pages: Vec<CanvasPage>,
}

impl Canvas {
    /// A canvas with one empty page.
    pub fn new(size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        Self {
            width,
            height,
            pages: vec![CanvasPage::default()],
        }
    }

    pub fn page_width(&self) -> f64 {
        self.width
    }

    pub fn page_height(&self) -> f64 {
        self.height
    }

    pub fn pages(&self) -> &[CanvasPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// A [`PageState`] matching this canvas' geometry.
    pub fn page_state(&self, margins: Margins) -> PageState {
        PageState::new(self.width, self.height, margins)
    }

    fn current(&mut self) -> &mut CanvasPage {
        if self.pages.is_empty() {
            self.pages.push(CanvasPage::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    pub fn draw_text(&mut self, text: &str, x: f64, y: f64, font: &FontSpec) {
        self.current().ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            font: font.clone(),
        });
    }

    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, weight: f64) {
        self.current().ops.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            weight,
        });
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.current().ops.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    /// Append a fresh page and move the cursor back to the top margin.
    pub fn new_page(&mut self, state: &mut PageState) {
        self.pages.push(CanvasPage::default());
        state.cursor_y = state.margins.top;
        log::debug!("started page {}", self.pages.len());
    }

    /// Draw text onto an arbitrary page, used for post-layout decorations
    /// such as page-number footers.
    pub fn draw_text_on(&mut self, page_index: usize, text: &str, x: f64, y: f64, font: &FontSpec) {
        if let Some(page) = self.pages.get_mut(page_index) {
            page.ops.push(DrawOp::Text {
                x,
                y,
                text: text.to_string(),
                font: font.clone(),
            });
        }
    }
}
