//! PDF rendering of an estimate.
//!
//! Lays out [`ReportLine`]s on A4 pages: a centered laboratory header on
//! every page, bold date/total/detail headers, and a two-column
//! description/price layout for priced lines. Pages break automatically.

use std::fs::File;
use std::path::Path;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};
use tariffa_core::report::CURRENCY;
use tariffa_core::{Estimate, ReportLine};
use thiserror::Error;

use crate::settings::PdfSettings;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 15.0;
const CONTENT_W: f32 = PAGE_W - 2.0 * MARGIN;
const LAYER: &str = "Layer 1";

const PT_TO_MM: f32 = 0.352_778;
/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;

/// Builtin PDF fonts cannot encode `€`.
const ASCII_CURRENCY: &str = "EUR";

const NAVY: (f32, f32, f32) = (0.0, 0.0, 128.0 / 255.0);

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("cannot read font {}: {source}", .path.display())]
    FontFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("pdf error: {0}")]
    Pdf(#[from] printpdf::Error),
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    currency: &'static str,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, settings: &PdfSettings) -> Result<Self, PdfError> {
        match &settings.font {
            Some(path) => {
                let regular = doc.add_external_font(open_font(path)?)?;
                let bold = match &settings.bold_font {
                    Some(bold_path) => doc.add_external_font(open_font(bold_path)?)?,
                    None => regular.clone(),
                };
                Ok(Self {
                    regular,
                    bold,
                    currency: CURRENCY,
                })
            }
            None => Ok(Self {
                regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
                bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
                currency: ASCII_CURRENCY,
            }),
        }
    }
}

fn open_font(path: &Path) -> Result<File, PdfError> {
    File::open(path).map_err(|source| PdfError::FontFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Writing position on the current page.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: &'a Fonts,
    title: &'a str,
    y: f32,
    pages: usize,
}

impl<'a> Cursor<'a> {
    fn new(
        doc: &'a PdfDocumentReference,
        layer: PdfLayerReference,
        fonts: &'a Fonts,
        title: &'a str,
    ) -> Self {
        let mut cursor = Self {
            doc,
            layer,
            fonts,
            title,
            y: PAGE_H - MARGIN,
            pages: 1,
        };
        cursor.page_header();
        cursor
    }

    fn page_header(&mut self) {
        let size = 14.0;
        let x = MARGIN + (CONTENT_W - text_width(self.title, size)).max(0.0) / 2.0;
        self.set_color((0.0, 0.0, 0.0));
        self.text_row(self.title, size, x, 10.0, true);
        self.y -= 5.0;
    }

    /// Start a new page when `height` does not fit above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_H - MARGIN;
        self.pages += 1;
        self.page_header();
    }

    fn set_color(&self, (r, g, b): (f32, f32, f32)) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    /// Write `text` in a row of the given height and move below it.
    fn text_row(&mut self, text: &str, size: f32, x: f32, height: f32, bold: bool) {
        self.put(text, size, x, height, bold);
        self.y -= height;
    }

    /// Write `text` in the current row without moving down.
    fn put(&self, text: &str, size: f32, x: f32, height: f32, bold: bool) {
        let font = if bold {
            &self.fonts.bold
        } else {
            &self.fonts.regular
        };
        let baseline = self.y - height * 0.7;
        self.layer.use_text(text, size, Mm(x), Mm(baseline), font);
    }

    fn line(&mut self, line: &ReportLine<'_>) {
        let currency = self.fonts.currency;
        match line {
            // Printed by the page header.
            ReportLine::Title(_) => {}
            ReportLine::Blank => self.y -= 4.0,
            ReportLine::Generated(_) => {
                self.reserve(8.0);
                self.text_row(&line.text(currency), 11.0, MARGIN, 8.0, true);
                self.y -= 3.0;
            }
            ReportLine::Total(_) => {
                self.reserve(10.0);
                self.set_color(NAVY);
                self.text_row(&line.text(currency), 12.0, MARGIN, 10.0, true);
                self.set_color((0.0, 0.0, 0.0));
            }
            ReportLine::DetailHeader => {
                self.reserve(10.0);
                self.text_row(&line.text(currency), 12.0, MARGIN, 10.0, true);
            }
            ReportLine::Item { label, amount } => {
                let size = 11.0;
                let desc_w = CONTENT_W * 0.75;
                let price = format!("{currency} {amount}");
                let wrapped = wrap(&format!("- {label}"), chars_fitting(desc_w, size));
                for (i, part) in wrapped.iter().enumerate() {
                    self.reserve(8.0);
                    if i == 0 {
                        let x = PAGE_W - MARGIN - text_width(&price, size);
                        self.put(&price, size, x, 8.0, false);
                    }
                    self.text_row(part, size, MARGIN, 8.0, false);
                }
            }
            ReportLine::Unresolved(_) => {
                let size = 11.0;
                for part in wrap(&line.text(currency), chars_fitting(CONTENT_W, size)) {
                    self.reserve(8.0);
                    self.text_row(&part, size, MARGIN, 8.0, false);
                }
            }
        }
    }
}

/// Render an estimate as PDF bytes.
pub fn render_pdf(
    estimate: &Estimate,
    laboratory: &str,
    settings: &PdfSettings,
) -> Result<Vec<u8>, PdfError> {
    let (doc, pages) = layout(estimate, laboratory, settings)?;
    tracing::debug!(pages, lines = estimate.lines.len(), "rendered estimate pdf");
    Ok(doc.save_to_bytes()?)
}

/// Lay out the document, returning it with its page count.
fn layout(
    estimate: &Estimate,
    laboratory: &str,
    settings: &PdfSettings,
) -> Result<(PdfDocumentReference, usize), PdfError> {
    let (doc, page, layer) = PdfDocument::new("Preventivo", Mm(PAGE_W), Mm(PAGE_H), LAYER);
    let fonts = Fonts::load(&doc, settings)?;
    let first_layer = doc.get_page(page).get_layer(layer);

    let pages = {
        let mut cursor = Cursor::new(&doc, first_layer, &fonts, laboratory);
        for line in estimate.report_lines(laboratory) {
            cursor.line(&line);
        }
        cursor.pages
    };
    Ok((doc, pages))
}

/// Approximate rendered width in millimetres.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM * PT_TO_MM
}

fn chars_fitting(width: f32, size: f32) -> usize {
    ((width / (size * AVG_GLYPH_EM * PT_TO_MM)) as usize).max(1)
}

/// Greedy word wrap to at most `max_chars` per line. Words longer than a
/// line are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed =
            current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if !current.is_empty() && needed > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
