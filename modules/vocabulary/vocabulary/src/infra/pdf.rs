//! A4 word/translation table rendering.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use thiserror::Error;

use crate::domain::ports::{PdfRenderer, WordRow};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const LEFT: f32 = 5.0;
const COLUMN_WIDTH: f32 = 100.0;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 15.0;
const ROW_HEIGHT: f32 = 8.0;
const FONT_SIZE: f32 = 12.0;
const MAX_CELL_CHARS: usize = 40;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("pdf rendering failed: {0}")]
    Render(#[from] printpdf::Error),
}

fn cell(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(MAX_CELL_CHARS - 3).collect();
    out.push_str("...");
    out
}

struct Table<'a> {
    layer: PdfLayerReference,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
    y: f32,
}

impl Table<'_> {
    fn header(&mut self) {
        self.row("Word", "Translation", true);
    }

    fn row(&mut self, left: &str, right: &str, bold: bool) {
        let font = if bold { self.bold } else { self.regular };
        self.layer
            .use_text(cell(left), FONT_SIZE, Mm(LEFT), Mm(self.y), font);
        self.layer.use_text(
            cell(right),
            FONT_SIZE,
            Mm(LEFT + COLUMN_WIDTH),
            Mm(self.y),
            font,
        );
        self.y -= ROW_HEIGHT;
    }

    fn is_full(&self) -> bool {
        self.y < BOTTOM
    }
}

/// Renders with the built-in Helvetica faces.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintPdfRenderer;

impl PrintPdfRenderer {
    fn render(title: &str, rows: &[WordRow]) -> Result<Vec<u8>, PdfError> {
        let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "words");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

        let mut table = Table {
            layer: doc.get_page(page).get_layer(layer),
            regular: &regular,
            bold: &bold,
            y: TOP,
        };
        table.header();

        for row in rows {
            if table.is_full() {
                let (page, layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "words");
                table.layer = doc.get_page(page).get_layer(layer);
                table.y = TOP;
                table.header();
            }
            table.row(&row.word, &row.translation, false);
        }

        Ok(doc.save_to_bytes()?)
    }
}

impl PdfRenderer for PrintPdfRenderer {
    fn render_word_table(&self, title: &str, rows: &[WordRow]) -> anyhow::Result<Vec<u8>> {
        Ok(Self::render(title, rows)?)
    }
}
