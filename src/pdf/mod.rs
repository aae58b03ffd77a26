//! # PDF Serializer
//!
//! Writes the pages of a finished [`Canvas`] as a PDF 1.7 file.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, pages, content streams
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- root and info references
//! %%EOF
//! ```
//!
//! Standard fonts are plain Type1 references with `/WinAnsiEncoding`. Custom
//! TrueType fonts are embedded whole as CIDFontType2 with Identity-H encoding:
//! FontFile2, FontDescriptor, CIDFont, ToUnicode CMap and the Type0 root.
//!
//! The canvas is top-left based; every y is flipped to `page_height - y` here.
//! Output is byte-for-byte deterministic for a given canvas and metadata:
//! fonts are numbered in key order and the only date written is the one the
//! caller passes in.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use chrono::NaiveDateTime;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::canvas::{Canvas, CanvasPage, DrawOp};
use crate::error::{Result, SlipError};
use crate::font::encoding::to_winansi;
use crate::font::{CustomFont, FontContext, FontData, FontKey};

/// Document information dictionary entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creation_date: Option<NaiveDateTime>,
}

pub struct PdfWriter;

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Glyph lookup for an embedded TrueType font.
struct EmbeddedFont {
    char_to_gid: BTreeMap<char, u16>,
}

struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Resource index (`/F0`, `/F1`, ...) is the position in this list.
    font_objects: Vec<(FontKey, usize)>,
    embedded: BTreeMap<FontKey, EmbeddedFont>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict_extra: &str, raw: &[u8]) -> usize {
        let compressed = compress_to_vec_zlib(raw, 6);
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< /Length {}{} /Filter /FlateDecode >>\nstream\n",
            compressed.len(),
            dict_extra
        );
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_index(&self, key: &FontKey) -> Option<usize> {
        self.font_objects.iter().position(|(k, _)| k == key)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize every page of `canvas`.
    pub fn write(&self, canvas: &Canvas, metadata: &Metadata, fonts: &FontContext) -> Result<Vec<u8>> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            embedded: BTreeMap::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        builder.push(vec![]);
        builder.push(vec![]);
        builder.push(vec![]);

        self.register_fonts(&mut builder, canvas.pages(), fonts)?;

        let mut page_obj_ids: Vec<usize> = Vec::new();
        let font_resources = Self::build_font_resource_dict(&builder.font_objects);

        for page in canvas.pages() {
            let content = self.build_content_stream(page, canvas.page_height(), &builder)?;
            let content_obj_id = builder.push_stream("", content.as_bytes());

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                canvas.page_width(),
                canvas.page_height(),
                content_obj_id,
                font_resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.push(Self::build_info_dict(metadata).into_bytes());

        log::debug!(
            "serialized {} page(s), {} font(s), {} object(s)",
            page_obj_ids.len(),
            builder.font_objects.len(),
            builder.objects.len() - 1
        );
        Ok(Self::serialize(&builder, info_obj_id))
    }

    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[CanvasPage], fonts: &FontContext) -> Result<()> {
        let mut font_chars: BTreeMap<FontKey, BTreeSet<char>> = BTreeMap::new();
        for page in pages {
            for op in &page.ops {
                if let DrawOp::Text { text, font, .. } = op {
                    font_chars.entry(font.key()).or_default().extend(text.chars());
                }
            }
        }

        // A page with no text still needs a valid, if empty, resource dict.
        if font_chars.is_empty() {
            font_chars.insert(FontKey::new("Helvetica", 400, false), BTreeSet::new());
        }

        for (key, used_chars) in &font_chars {
            match fonts.resolve(key)? {
                FontData::Standard(std_font) => {
                    let font_dict = format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                         /Encoding /WinAnsiEncoding >>",
                        std_font.pdf_name()
                    );
                    let obj_id = builder.push(font_dict.into_bytes());
                    builder.font_objects.push((key.clone(), obj_id));
                }
                FontData::Custom(custom) => {
                    let type0_obj_id = Self::write_custom_font_objects(builder, key, custom, used_chars)?;
                    builder.font_objects.push((key.clone(), type0_obj_id));
                }
            }
        }
        Ok(())
    }

    fn write_custom_font_objects(
        builder: &mut PdfBuilder,
        key: &FontKey,
        font: &CustomFont,
        used_chars: &BTreeSet<char>,
    ) -> Result<usize> {
        let face = ttf_parser::Face::parse(&font.data, 0).map_err(|e| {
            SlipError::FontData(format!("Failed to parse TTF data for font '{}': {}", key.family, e))
        })?;

        let char_to_gid: BTreeMap<char, u16> = used_chars
            .iter()
            .filter_map(|&ch| face.glyph_index(ch).map(|gid| (ch, gid.0)))
            .collect();

        let pdf_font_name = Self::sanitize_font_name(&key.family, key.weight, key.italic);
        let scale = 1000.0 / font.units_per_em as f64;

        let fontfile2_id = builder.push_stream(&format!(" /Length1 {}", font.data.len()), &font.data);

        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(font.ascender) as f64 * scale;
        let font_descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox [{} {} {} {}] /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            pdf_font_name,
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
            if key.italic { -12 } else { 0 },
            (font.ascender as f64 * scale) as i32,
            (font.descender as f64 * scale) as i32,
            cap_height as i32,
            if key.weight >= 700 { 120 } else { 80 },
            fontfile2_id,
        );
        let font_descriptor_id = builder.push(font_descriptor.into_bytes());

        let default_width = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| (adv as f64 * scale) as u32)
            .unwrap_or(1000);
        let cidfont = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} \
             /CIDToGIDMap /Identity >>",
            pdf_font_name,
            font_descriptor_id,
            default_width,
            Self::build_w_array(&char_to_gid, &face, scale),
        );
        let cidfont_id = builder.push(cidfont.into_bytes());

        let cmap = Self::build_tounicode_cmap(&char_to_gid, &pdf_font_name);
        let tounicode_id = builder.push_stream("", cmap.as_bytes());

        let type0 = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} \
             /Encoding /Identity-H /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            pdf_font_name, cidfont_id, tounicode_id,
        );
        let type0_id = builder.push(type0.into_bytes());

        builder.embedded.insert(key.clone(), EmbeddedFont { char_to_gid });
        Ok(type0_id)
    }

    /// `[gid [width] gid [width] ...]` in glyph order.
    fn build_w_array(char_to_gid: &BTreeMap<char, u16>, face: &ttf_parser::Face, scale: f64) -> String {
        let gids: BTreeSet<u16> = char_to_gid.values().copied().collect();
        let mut result = String::from("[");
        for gid in gids {
            let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
            let _ = write!(result, " {} [{}]", gid, (advance as f64 * scale) as u32);
        }
        result.push_str(" ]");
        result
    }

    /// CMap from glyph ids back to Unicode, for text extraction.
    fn build_tounicode_cmap(char_to_gid: &BTreeMap<char, u16>, font_name: &str) -> String {
        let mut gid_to_unicode: Vec<(u16, char)> = char_to_gid.iter().map(|(&ch, &gid)| (gid, ch)).collect();
        gid_to_unicode.sort();
        gid_to_unicode.dedup_by_key(|(gid, _)| *gid);

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
        cmap.push_str("/CIDSystemInfo\n<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        // At most 100 entries per beginbfchar block.
        for chunk in gid_to_unicode.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, ch) in chunk {
                let mut units = [0u16; 2];
                let utf16: String = ch.encode_utf16(&mut units).iter().map(|u| format!("{:04X}", u)).collect();
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }

    /// Strips characters that are not valid in a PDF name and appends
    /// weight and style suffixes.
    fn sanitize_font_name(family: &str, weight: u32, italic: bool) -> String {
        let mut name: String = family
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if name.is_empty() {
            name = "CustomFont".to_string();
        }
        if weight >= 700 {
            name.push_str("-Bold");
        }
        if italic {
            name.push_str("-Italic");
        }
        name
    }

    fn build_font_resource_dict(font_objects: &[(FontKey, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_content_stream(&self, page: &CanvasPage, page_height: f64, builder: &PdfBuilder) -> Result<String> {
        let mut stream = String::new();

        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, text, font } => {
                    let key = font.key();
                    let index = builder.font_index(&key).ok_or_else(|| SlipError::FontResolution {
                        family: key.family.clone(),
                        weight: key.weight,
                        italic: key.italic,
                    })?;
                    let encoded = match builder.embedded.get(&key) {
                        Some(embedded) => Self::encode_glyphs(text, embedded),
                        None => format!("({})", Self::escape_pdf_bytes(&to_winansi(text))),
                    };
                    let _ = write!(
                        stream,
                        "BT\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n{} Tj\nET\n",
                        index,
                        font.size,
                        x,
                        page_height - y,
                        encoded
                    );
                }
                DrawOp::Line { x1, y1, x2, y2, weight } => {
                    let _ = write!(
                        stream,
                        "q\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                        weight,
                        x1,
                        page_height - y1,
                        x2,
                        page_height - y2
                    );
                }
                DrawOp::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        color.r,
                        color.g,
                        color.b,
                        x,
                        page_height - y - height,
                        width,
                        height
                    );
                }
            }
        }

        Ok(stream)
    }

    /// Identity-H hex string of glyph ids. Unmapped characters use `.notdef`.
    fn encode_glyphs(text: &str, font: &EmbeddedFont) -> String {
        let hex: String = text
            .chars()
            .map(|ch| format!("{:04X}", font.char_to_gid.get(&ch).copied().unwrap_or(0)))
            .collect();
        format!("<{}>", hex)
    }

    /// Escape a byte string for a PDF literal. Bytes outside printable ASCII
    /// are written as octal escapes so the content stream stays 7-bit.
    fn escape_pdf_bytes(bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        for &b in bytes {
            match b {
                b'(' | b')' | b'\\' => {
                    out.push('\\');
                    out.push(b as char);
                }
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    fn pdf_date(date: &NaiveDateTime) -> String {
        format!("D:{}", date.format("%Y%m%d%H%M%S"))
    }

    fn build_info_dict(metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        let entries = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
        ];
        for (name, value) in entries {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", name, Self::escape_pdf_bytes(&to_winansi(value)));
            }
        }
        if let Some(date) = &metadata.creation_date {
            let _ = write!(info, "/CreationDate ({}) ", Self::pdf_date(date));
        }
        let _ = write!(
            info,
            "/Producer (custody-slip {}) >>",
            env!("CARGO_PKG_VERSION")
        );
        info
    }

    fn serialize(builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        output.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );
        output
    }
}
