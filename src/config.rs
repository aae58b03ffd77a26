//! Engine configuration.
//!
//! Everything is optional in JSON; missing fields take the defaults of an
//! Inventory Custodian Slip printed on A4 in Philippine English.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlipError};
use crate::format::FormatLocale;
use crate::style::RenderStyle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub style: RenderStyle,
    pub locale: FormatLocale,
    /// Leading part of generated document numbers (`ICS-2025-03-042`).
    pub document_prefix: String,
    /// Leading part of suggested filenames. May be empty.
    pub filename_prefix: String,
    /// Printed centered at the top of the first page.
    pub title: String,
    /// Written to the PDF Author entry when set.
    pub author: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            style: RenderStyle::default(),
            locale: FormatLocale::default(),
            document_prefix: "ICS".to_string(),
            filename_prefix: "ICS".to_string(),
            title: "INVENTORY CUSTODIAN SLIP".to_string(),
            author: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that deserialize fine but cannot produce a page.
    pub fn validate(&self) -> Result<()> {
        let style = &self.style;
        let (width, height) = style.page_size.dimensions();
        if !(width > 0.0 && height > 0.0) {
            return Err(SlipError::Config(format!(
                "page size must be positive, got {} x {}",
                width, height
            )));
        }
        if style.margins.horizontal() >= width || style.margins.vertical() >= height {
            return Err(SlipError::Config("margins leave no room for content".to_string()));
        }
        let fonts = [
            ("titleFont", &style.title_font),
            ("labelFont", &style.label_font),
            ("valueFont", &style.value_font),
            ("headerFont", &style.header_font),
            ("bodyFont", &style.body_font),
            ("footerFont", &style.footer_font),
        ];
        for (name, font) in fonts {
            if !(font.size > 0.0) {
                return Err(SlipError::Config(format!("{} size must be positive", name)));
            }
        }
        if !(style.line_height > 0.0) {
            return Err(SlipError::Config("lineHeight must be positive".to_string()));
        }
        if style.cell_padding < 0.0 {
            return Err(SlipError::Config("cellPadding must not be negative".to_string()));
        }
        if !self.locale.date_format_is_valid() {
            return Err(SlipError::Config(format!(
                "dateFormat {:?} is not a valid chrono pattern",
                self.locale.date_format
            )));
        }
        if self.document_prefix.trim().is_empty() {
            return Err(SlipError::Config("documentPrefix must not be empty".to_string()));
        }
        Ok(())
    }
}
