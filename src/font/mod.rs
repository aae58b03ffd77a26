//! # Font Management and Text Measurement
//!
//! The measurement adapter every layout decision depends on. Given a font and
//! a string, [`TextMeasure::measure`] returns its rendered width in points.
//!
//! Two kinds of fonts are supported:
//! - standard PDF fonts (Helvetica, Courier) with bundled AFM metrics, which
//!   need no embedding;
//! - custom TrueType fonts registered at runtime, measured through
//!   `ttf-parser` and embedded by the PDF writer.
//!
//! Resolution never silently falls back to another family. A font that is not
//! registered fails with [`SlipError::FontResolution`], because a wrong width
//! would corrupt every position computed downstream.

pub mod encoding;
pub mod metrics;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlipError};
pub use metrics::StandardFontMetrics;

/// A font request as used by draw operations: family, weight, style, size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontSpec {
    pub family: String,
    /// Font weight (100-900). Snapped to regular (400) or bold (700).
    pub weight: u32,
    pub italic: bool,
    /// Size in points.
    pub size: f64,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Helvetica".to_string(),
            weight: 400,
            italic: false,
            size: 10.0,
        }
    }
}

impl FontSpec {
    pub fn new(family: &str, size: f64) -> Self {
        Self {
            family: family.to_string(),
            size,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = 700;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn key(&self) -> FontKey {
        FontKey::new(&self.family, self.weight, self.italic)
    }
}

/// Registry key. Ordered so that anything iterating fonts is deterministic.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, weight: u32, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            weight: snap_weight(weight),
            italic,
        }
    }
}

fn snap_weight(weight: u32) -> u32 {
    if weight >= 600 {
        700
    } else {
        400
    }
}

/// The standard PDF fonts we ship metrics for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Obliques share the advance widths of their upright faces.
    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &metrics::HELVETICA,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &metrics::HELVETICA_BOLD,
            Self::Courier
            | Self::CourierBold
            | Self::CourierOblique
            | Self::CourierBoldOblique => &metrics::COURIER,
        }
    }
}

/// A TrueType font registered at runtime.
#[derive(Debug, Clone)]
pub struct CustomFont {
    pub data: Vec<u8>,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl CustomFont {
    /// Validate the font bytes and capture the metrics needed for layout.
    pub fn parse(family: &str, data: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| {
            SlipError::FontData(format!("Failed to parse TTF data for font '{}': {}", family, e))
        })?;
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();
        Ok(Self {
            data,
            units_per_em,
            ascender,
            descender,
        })
    }

    fn face(&self) -> Result<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, 0)
            .map_err(|e| SlipError::FontData(format!("Failed to parse TTF data: {}", e)))
    }

    /// Width of `text` in points. Missing glyphs measure as `.notdef`.
    pub fn measure(&self, text: &str, font_size: f64) -> Result<f64> {
        let face = self.face()?;
        let notdef = face.glyph_hor_advance(ttf_parser::GlyphId(0)).unwrap_or(0);
        let units: u32 = text
            .chars()
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .unwrap_or(notdef) as u32
            })
            .sum();
        Ok(units as f64 * font_size / self.units_per_em as f64)
    }

    pub fn ascent(&self, font_size: f64) -> f64 {
        self.ascender as f64 * font_size / self.units_per_em as f64
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType font that needs to be embedded.
    Custom(CustomFont),
}

/// The measurement adapter. Pure and deterministic for a given (text, font).
pub trait TextMeasure {
    /// Rendered width of `text` in points.
    fn measure(&self, text: &str, font: &FontSpec) -> Result<f64>;

    /// Distance from the top of a line to its baseline, in points.
    fn ascent(&self, font: &FontSpec) -> Result<f64>;
}

/// Maps (family, weight, italic) to font data.
#[derive(Debug, Clone)]
pub struct FontContext {
    fonts: BTreeMap<FontKey, FontData>,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    /// A context with the standard Helvetica and Courier faces registered.
    pub fn new() -> Self {
        let mut fonts = BTreeMap::new();

        let standard_mappings = [
            (("Helvetica", 400, false), StandardFont::Helvetica),
            (("Helvetica", 700, false), StandardFont::HelveticaBold),
            (("Helvetica", 400, true), StandardFont::HelveticaOblique),
            (("Helvetica", 700, true), StandardFont::HelveticaBoldOblique),
            (("Courier", 400, false), StandardFont::Courier),
            (("Courier", 700, false), StandardFont::CourierBold),
            (("Courier", 400, true), StandardFont::CourierOblique),
            (("Courier", 700, true), StandardFont::CourierBoldOblique),
        ];

        for ((family, weight, italic), font) in standard_mappings {
            fonts.insert(FontKey::new(family, weight, italic), FontData::Standard(font));
        }

        Self { fonts }
    }

    /// Register a TrueType font. Replaces any font under the same key.
    pub fn register_ttf(&mut self, family: &str, weight: u32, italic: bool, data: Vec<u8>) -> Result<()> {
        let font = CustomFont::parse(family, data)?;
        log::debug!(
            "registered custom font '{}' weight {} italic {} ({} units/em)",
            family,
            weight,
            italic,
            font.units_per_em
        );
        self.fonts
            .insert(FontKey::new(family, weight, italic), FontData::Custom(font));
        Ok(())
    }

    /// Look up a font by key, without any family fallback.
    pub fn resolve(&self, key: &FontKey) -> Result<&FontData> {
        self.fonts.get(key).ok_or_else(|| SlipError::FontResolution {
            family: key.family.clone(),
            weight: key.weight,
            italic: key.italic,
        })
    }

    /// Iterate over all registered fonts in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&FontKey, &FontData)> {
        self.fonts.iter()
    }
}

impl TextMeasure for FontContext {
    fn measure(&self, text: &str, font: &FontSpec) -> Result<f64> {
        match self.resolve(&font.key())? {
            FontData::Standard(std_font) => Ok(std_font
                .metrics()
                .measure_bytes(&encoding::to_winansi(text), font.size)),
            FontData::Custom(custom) => custom.measure(text, font.size),
        }
    }

    fn ascent(&self, font: &FontSpec) -> Result<f64> {
        match self.resolve(&font.key())? {
            FontData::Standard(std_font) => Ok(std_font.metrics().ascent(font.size)),
            FontData::Custom(custom) => Ok(custom.ascent(font.size)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let w = ctx.measure(" ", &FontSpec::new("Helvetica", 12.0)).unwrap();
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.measure("Received by", &FontSpec::new("Helvetica", 12.0)).unwrap();
        let bold = ctx
            .measure("Received by", &FontSpec::new("Helvetica", 12.0).bold())
            .unwrap();
        assert!(bold > regular, "Bold text should be wider than regular text");
    }

    #[test]
    fn test_font_context_weight_resolution() {
        let ctx = FontContext::new();
        let mut w800 = FontSpec::new("Helvetica", 12.0);
        w800.weight = 800;
        let a = ctx.measure("A", &FontSpec::new("Helvetica", 12.0).bold()).unwrap();
        let b = ctx.measure("A", &w800).unwrap();
        assert!((a - b).abs() < 0.001);
    }

    #[test]
    fn test_unknown_family_fails_instead_of_falling_back() {
        let ctx = FontContext::new();
        let err = ctx.measure("A", &FontSpec::new("Garamond", 12.0)).unwrap_err();
        assert!(matches!(err, SlipError::FontResolution { ref family, .. } if family == "Garamond"));
    }

    #[test]
    fn test_measure_is_additive() {
        let ctx = FontContext::new();
        let font = FontSpec::new("Helvetica", 9.0);
        let whole = ctx.measure("Fund Cluster:", &font).unwrap();
        let parts = ctx.measure("Fund ", &font).unwrap() + ctx.measure("Cluster:", &font).unwrap();
        assert!((whole - parts).abs() < 1e-9);
    }

    #[test]
    fn test_empty_string_has_zero_width() {
        let ctx = FontContext::new();
        assert_eq!(ctx.measure("", &FontSpec::default()).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_ttf_rejected() {
        let mut ctx = FontContext::new();
        let err = ctx.register_ttf("Broken", 400, false, vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, SlipError::FontData(_)));
    }

    #[test]
    fn test_ascent_scales_with_size() {
        let ctx = FontContext::new();
        let a10 = ctx.ascent(&FontSpec::new("Helvetica", 10.0)).unwrap();
        let a20 = ctx.ascent(&FontSpec::new("Helvetica", 20.0)).unwrap();
        assert!((a20 - 2.0 * a10).abs() < 1e-9);
        assert!((a10 - 7.18).abs() < 1e-9);
    }
}
