//! Structured error types for the slip engine.
//!
//! Every failure inside the engine surfaces as one [`SlipError`] to the
//! immediate caller. Nothing is retried internally and no partial artifact is
//! ever handed to a sink.

use thiserror::Error;

/// The unified error type returned by all public engine functions.
#[derive(Debug, Error)]
pub enum SlipError {
    /// JSON input or configuration failed to parse.
    #[error("Failed to parse input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// The measurement backend has no font registered under this key.
    /// Fatal for the whole render: every downstream position depends on it.
    #[error("Font could not be resolved: {family} (weight {weight}, italic: {italic})")]
    FontResolution {
        family: String,
        weight: u32,
        italic: bool,
    },

    /// Custom font bytes could not be parsed.
    #[error("Font error: {0}")]
    FontData(String),

    /// A line-item field could not be coerced to a non-negative number.
    #[error("Invalid line item: {field} = {value:?} is not a non-negative number")]
    InvalidLineItem { field: &'static str, value: String },

    /// Column weights outside (0, 1] or summing to more than the available width.
    #[error("Invalid table columns: {0}")]
    InvalidColumns(String),

    /// A table was asked to render after it already finished.
    #[error("Layout error: {0}")]
    Layout(String),

    /// Configuration values that parse but make no sense.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The artifact sink could not store the rendered document.
    #[error("Failed to deliver document: {0}")]
    Delivery(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SlipError>;

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for SlipError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected shape. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        SlipError::Parse { source: e, hint }
    }
}
