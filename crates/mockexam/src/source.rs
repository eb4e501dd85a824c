use std::io::Read;
use std::path::Path;

use mockexam_core::notice::Notice;
use mockexam_core::segment::{PageSource, Rect};
use pdf::TextDocument;

use crate::prelude::*;

/// [`PageSource`] over a parsed PDF.
pub struct PdfSource(TextDocument);

fn to_rect([x0, y0, x1, y1]: pdf::Bounds) -> Rect {
    Rect::new(x0, y0, x1, y1)
}

impl PageSource for PdfSource {
    fn page_count(&self) -> usize {
        self.0.page_count()
    }

    fn page_text(&self, index: usize) -> String {
        self.0.page_text(index)
    }

    fn page_bounds(&self, index: usize) -> Option<Rect> {
        self.0.page_bounds(index).map(to_rect)
    }

    fn region_text(&self, index: usize, region: Rect) -> String {
        self.0
            .region_text(index, [region.x0, region.y0, region.x1, region.y1])
    }
}

/// Open a PDF as a page source.
///
/// A file that cannot be read or parsed becomes an empty source plus a
/// notice, so the rest of the pipeline keeps going.
pub fn open_pdf(path: &Path) -> (Box<dyn PageSource>, Option<Notice>) {
    let parsed = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| TextDocument::from_bytes(&bytes).map_err(|e| e.to_string()));

    match parsed {
        Ok(doc) => {
            log::info!("{}: {} pages", path.display(), doc.page_count());
            (Box::new(PdfSource(doc)), None)
        }
        Err(reason) => {
            log::warn!("{}: {}", path.display(), reason);
            let notice = Notice::SourceUnreadable {
                source: path.display().to_string(),
                reason,
            };
            (Box::new(Vec::<String>::new()), Some(notice))
        }
    }
}

/// Read a text file, or stdin when `path` is `-`.
pub fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .wrap_err("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_pdf_becomes_empty_source_with_notice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pdf");

        let (source, notice) = open_pdf(&path);
        assert_eq!(source.page_count(), 0);
        assert!(matches!(notice, Some(Notice::SourceUnreadable { .. })));
    }

    #[test]
    fn test_corrupt_pdf_becomes_empty_source_with_notice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        let (source, notice) = open_pdf(&path);
        assert_eq!(source.page_count(), 0);
        assert!(notice.is_some());
    }

    #[test]
    fn test_read_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.txt");
        std::fs::write(&path, "1 A\n2 B\n").unwrap();
        assert_eq!(read_text(&path).unwrap(), "1 A\n2 B\n");
    }
}
