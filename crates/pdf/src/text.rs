//! Page-level text access: whole pages and cropped regions.

pub mod cleanup;

use crate::parser::backend::{LopdfBackend, PageId, PdfBackend};
use crate::parser::layout::{
    extract_page_spans, group_spans_into_lines, lines_to_text, spans_in_region, TextSpan,
};
use crate::PdfError;

pub use cleanup::cleanup_text;

/// Bounds of a page or region in PDF user space: `[x0, y0, x1, y1]`.
pub type Bounds = [f32; 4];

/// One page's positioned text, extracted once.
#[derive(Debug, Clone, Default)]
pub struct PageText {
    pub spans: Vec<TextSpan>,
    pub bounds: Option<Bounds>,
}

impl PageText {
    pub fn text(&self) -> String {
        cleanup_text(&lines_to_text(&group_spans_into_lines(self.spans.clone())))
    }

    pub fn region_text(&self, region: Bounds) -> String {
        let spans = spans_in_region(&self.spans, region);
        cleanup_text(&lines_to_text(&group_spans_into_lines(spans)))
    }
}

/// Extract every page of `backend` in page order.
///
/// A page whose content cannot be read yields no spans rather than failing
/// the whole document.
pub fn extract_pages(backend: &dyn PdfBackend) -> Vec<PageText> {
    backend
        .pages()
        .into_iter()
        .map(|(number, id)| extract_page(backend, number, id))
        .collect()
}

fn extract_page(backend: &dyn PdfBackend, number: u32, id: PageId) -> PageText {
    let spans = extract_page_spans(backend, id).unwrap_or_else(|e| {
        log::warn!("page {}: text extraction failed: {}", number, e);
        Vec::new()
    });
    let bounds = match backend.media_box(id) {
        Ok(bounds) => Some(bounds),
        Err(e) => {
            log::debug!("page {}: no usable MediaBox: {}", number, e);
            None
        }
    };
    PageText { spans, bounds }
}

/// A loaded PDF reduced to its positioned text.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    pages: Vec<PageText>,
}

impl TextDocument {
    /// Parse PDF bytes. Encrypted and unparsable documents are errors;
    /// unreadable individual pages are not.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        log::debug!("loaded PDF with {} pages", backend.page_count());
        Ok(Self::from_backend(&backend))
    }

    pub fn from_backend(backend: &dyn PdfBackend) -> Self {
        Self {
            pages: extract_pages(backend),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Cleaned text of page `index` (0-based); empty when out of range.
    pub fn page_text(&self, index: usize) -> String {
        self.pages.get(index).map(PageText::text).unwrap_or_default()
    }

    pub fn page_texts(&self) -> Vec<String> {
        self.pages.iter().map(PageText::text).collect()
    }

    pub fn page_bounds(&self, index: usize) -> Option<Bounds> {
        self.pages.get(index).and_then(|page| page.bounds)
    }

    /// Text of the spans on page `index` whose origin lies inside `region`.
    pub fn region_text(&self, index: usize, region: Bounds) -> String {
        self.pages
            .get(index)
            .map(|page| page.region_text(region))
            .unwrap_or_default()
    }
}
