//! # Custody Slip
//!
//! A fixed-form layout engine for Inventory Custodian Slips: the one-page
//! record of an asset passing from an issuing officer to the person who
//! becomes accountable for it.
//!
//! The layout is small and fixed. A title, three underlined identification
//! fields, a seven-column item table and a two-column signature table. What
//! makes it an engine rather than a template is that every position is
//! measured: underlines follow the measured width of their labels, cell text
//! wraps at measured widths, and rows that do not fit continue on a new page
//! with the table header repeated.
//!
//! ## Architecture
//!
//! ```text
//! SlipInput (JSON/API)
//!       ↓
//!   [model]    : normalize, derive totals, number, formatted strings
//!       ↓
//!   [render]   : title, identification block, tables onto a Canvas
//!       ↓        (uses [table] + [text] + [font] measurement)
//!   [pdf]      : serialize the canvas to PDF bytes
//!       ↓
//!   [output]   : filename + delivery to an ArtifactSink
//! ```
//!
//! Clock and randomness enter only through [`RenderContext`], so a render
//! with a fixed timestamp and seed is byte-for-byte reproducible.

pub mod canvas;
pub mod config;
pub mod error;
pub mod font;
pub mod format;
pub mod model;
pub mod output;
pub mod pdf;
pub mod render;
pub mod style;
pub mod table;
pub mod text;

pub use config::EngineConfig;
pub use error::{Result, SlipError};
pub use model::{DocumentBundle, DocumentModelBuilder, RenderContext, SlipInput};
pub use output::{ArtifactSink, DirectorySink, MemorySink, RenderTarget, RenderedDocument};

use canvas::Canvas;
use font::FontContext;
use pdf::Metadata;
use render::DocumentRenderer;

/// What a call to [`Engine::generate`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A PDF was rendered and accepted by the sink.
    Delivered { filename: String, bytes: usize },
    /// The bundle went to the caller's callback; nothing was drawn.
    Handed { document_number: String },
}

/// Configuration and fonts shared by any number of renders.
///
/// An engine holds no per-render state. Each render builds its own canvas and
/// page cursor, so one engine can serve several threads at once.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    fonts: FontContext,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_fonts(config, FontContext::new())
    }

    pub fn with_fonts(config: EngineConfig, fonts: FontContext) -> Self {
        Self { config, fonts }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    /// For registering custom TrueType fonts before rendering.
    pub fn fonts_mut(&mut self) -> &mut FontContext {
        &mut self.fonts
    }

    pub fn build_bundle(&self, input: &SlipInput, ctx: &mut RenderContext) -> Result<DocumentBundle> {
        DocumentModelBuilder::new(self.config.locale.clone(), &self.config.document_prefix).build(input, ctx)
    }

    /// Lay out a bundle without serializing it.
    pub fn layout(&self, bundle: &DocumentBundle) -> Result<Canvas> {
        DocumentRenderer::new(&self.fonts, &self.config.style, &self.config.title).render(bundle)
    }

    /// Lay out and serialize a bundle.
    pub fn render(&self, bundle: &DocumentBundle) -> Result<RenderedDocument> {
        let canvas = self.layout(bundle)?;
        let request = &bundle.request;
        let metadata = Metadata {
            title: Some(self.config.title.clone()),
            author: self.config.author.clone(),
            subject: Some(request.document_number.clone()),
            creation_date: Some(bundle.issued_at),
        };
        let bytes = output::serialize(&canvas, &metadata, &self.fonts)?;
        let filename = output::suggest_filename(
            &self.config.filename_prefix,
            &request.document_number,
            &request.line_item.code,
        );
        Ok(RenderedDocument { filename, bytes })
    }

    /// Build the bundle, then either render it into the sink or hand it to
    /// the callback. A failure at any stage delivers nothing.
    pub fn generate(&self, input: &SlipInput, ctx: &mut RenderContext, target: RenderTarget<'_>) -> Result<Outcome> {
        let bundle = self.build_bundle(input, ctx)?;
        match target {
            RenderTarget::Callback(callback) => {
                let document_number = bundle.request.document_number.clone();
                callback(bundle);
                Ok(Outcome::Handed { document_number })
            }
            RenderTarget::File(sink) => {
                let document = self.render(&bundle)?;
                let outcome = Outcome::Delivered {
                    filename: document.filename.clone(),
                    bytes: document.bytes.len(),
                };
                sink.deliver(document)?;
                Ok(outcome)
            }
        }
    }
}

/// Render a slip with the default configuration, the local clock and an
/// entropy-seeded document number.
pub fn render(input: &SlipInput) -> Result<RenderedDocument> {
    let engine = Engine::default();
    let bundle = engine.build_bundle(input, &mut RenderContext::now())?;
    engine.render(&bundle)
}

/// Render a slip described as JSON.
pub fn render_json(json: &str) -> Result<RenderedDocument> {
    let input: SlipInput = serde_json::from_str(json)?;
    render(&input)
}
