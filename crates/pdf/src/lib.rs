//! PDF text layer access for mockexam.
//!
//! [`TextDocument`] loads a PDF with `lopdf`, walks each page's content
//! stream into positioned spans and rebuilds lines from them, either for the
//! whole page or for a cropped region of it.

use thiserror::Error;

pub mod parser;
pub mod text;

pub use text::{cleanup_text, Bounds, PageText, TextDocument};

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    use super::*;

    /// Build a PDF whose pages show each `(x, y, text)` with a 12pt font.
    fn build_pdf(pages: &[Vec<(f32, f32, &str)>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut operations = vec![Operation::new("BT", vec![])];
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            for (x, y, text) in lines {
                operations.push(Operation::new(
                    "Tm",
                    vec![
                        1.into(),
                        0.into(),
                        0.into(),
                        1.into(),
                        Object::Real(*x),
                        Object::Real(*y),
                    ],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_page_texts_in_order() {
        let bytes = build_pdf(&[
            vec![(72.0, 700.0, "1) What is 2+2?"), (72.0, 680.0, "A. 3")],
            vec![(72.0, 700.0, "2) Next question")],
        ]);
        let doc = TextDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(
            doc.page_texts(),
            vec!["1) What is 2+2?\nA. 3", "2) Next question"]
        );
    }

    #[test]
    fn test_page_bounds_inherited_from_page_tree() {
        let bytes = build_pdf(&[vec![(72.0, 700.0, "1. Only")]]);
        let doc = TextDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_bounds(0), Some([0.0, 0.0, 595.0, 842.0]));
        assert_eq!(doc.page_bounds(5), None);
    }

    #[test]
    fn test_region_text_crops_columns() {
        let bytes = build_pdf(&[vec![
            (40.0, 700.0, "1. Left question"),
            (320.0, 700.0, "1. Right question"),
            (40.0, 680.0, "A. left option"),
        ]]);
        let doc = TextDocument::from_bytes(&bytes).unwrap();

        assert_eq!(
            doc.region_text(0, [0.0, 0.0, 297.5, 842.0]),
            "1. Left question\nA. left option"
        );
        assert_eq!(
            doc.region_text(0, [297.5, 0.0, 595.0, 842.0]),
            "1. Right question"
        );
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let bytes = build_pdf(&[vec![(72.0, 700.0, "1. Only")]]);
        let doc = TextDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_text(3), "");
        assert_eq!(doc.region_text(3, [0.0, 0.0, 1.0, 1.0]), "");
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(matches!(
            TextDocument::from_bytes(b"%PDF-1.5 broken"),
            Err(PdfError::Parse(_))
        ));
    }
}
