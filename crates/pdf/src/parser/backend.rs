use std::collections::BTreeMap;

use lopdf::{self, content::Content};

use crate::PdfError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// Font resource of a page, as far as text decoding cares.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Resource key (e.g. `b"F1"`).
    pub name: Vec<u8>,
    pub base_font: Option<String>,
    pub encoding: Option<String>,
}

/// A lopdf-independent PDF value, enough to drive the text state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Numeric operand as `f32`, accepting both integers and reals.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a content-stream operand. Dictionaries, booleans and references
/// never matter for text extraction and collapse to `Other`.
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Best-effort decoding of raw PDF string bytes.
///
/// UTF-16BE with BOM first, then UTF-8, then Latin-1.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, payload @ ..] = bytes {
        let code_units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Abstraction over the PDF parser so span extraction can be tested
/// against prepared content operations.
pub trait PdfBackend {
    /// Mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError>;

    /// Raw (possibly compressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode string bytes from a text-showing operator using the font's
    /// declared encoding where possible.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Page MediaBox as `[llx, lly, urx, ury]`.
    fn media_box(&self, page: PageId) -> Result<[f32; 4], PdfError>;
}

/// [`PdfBackend`] backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Walk up the page tree until a MediaBox is found.
    fn find_media_box(&self, dict: &lopdf::Dictionary) -> Option<Vec<lopdf::Object>> {
        if let Ok(obj) = dict.get(b"MediaBox") {
            if let Some(arr) = self.resolve_array(obj) {
                return Some(arr);
            }
        }

        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = self.doc.get_object(parent_id).ok()?.as_dict().ok()?;
        self.find_media_box(parent)
    }

    fn resolve_array(&self, obj: &lopdf::Object) -> Option<Vec<lopdf::Object>> {
        match obj {
            lopdf::Object::Array(arr) => Some(arr.clone()),
            lopdf::Object::Reference(id) => self
                .doc
                .get_object(*id)
                .ok()
                .and_then(|resolved| resolved.as_array().ok())
                .cloned(),
            _ => None,
        }
    }

    fn resolve_number(&self, obj: &lopdf::Object) -> Result<f32, PdfError> {
        let resolved = match obj {
            lopdf::Object::Reference(id) => self
                .doc
                .get_object(*id)
                .map_err(|e| PdfError::Parse(e.to_string()))?,
            other => other,
        };
        match resolved {
            lopdf::Object::Integer(i) => Ok(*i as f32),
            lopdf::Object::Real(f) => Ok(*f),
            _ => Err(PdfError::Parse(format!(
                "expected number in MediaBox, got {:?}",
                resolved
            ))),
        }
    }

    fn font_encoding_name(&self, page: PageId, font_name: &[u8]) -> Option<String> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let font_dict = fonts.get(font_name)?;
        match font_dict.get(b"Encoding").ok()? {
            lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError> {
        let fonts_map = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        let name_of = |dict: &lopdf::Dictionary, key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).into_owned())
        };

        Ok(fonts_map
            .iter()
            .map(|(name, dict)| BackendFontInfo {
                name: name.clone(),
                base_font: name_of(dict, b"BaseFont"),
                encoding: name_of(dict, b"Encoding"),
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        // Identity-H/V fonts carry 2-byte codes that usually map to UTF-16.
        let identity = self
            .font_encoding_name(page, font_name)
            .is_some_and(|enc| enc.contains("Identity"));
        if identity && bytes.len() >= 2 && bytes.len() % 2 == 0 {
            let code_units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            let decoded = String::from_utf16_lossy(&code_units);
            if !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                return decoded;
            }
        }

        decode_text_simple(bytes)
    }

    fn media_box(&self, page: PageId) -> Result<[f32; 4], PdfError> {
        let page_dict = self
            .doc
            .get_object(page)
            .and_then(|obj| obj.as_dict())
            .map_err(|e| PdfError::Parse(format!("cannot get page dictionary: {}", e)))?;

        let media_box = self
            .find_media_box(page_dict)
            .ok_or_else(|| PdfError::Parse("MediaBox not found for page".into()))?;
        if media_box.len() < 4 {
            return Err(PdfError::Parse(format!(
                "MediaBox has {} elements, expected 4",
                media_box.len()
            )));
        }

        let mut rect = [0.0; 4];
        for (slot, obj) in rect.iter_mut().zip(&media_box) {
            *slot = self.resolve_number(obj)?;
        }
        Ok(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_text_simple_utf8() {
        assert_eq!(decode_text_simple("प्रश्न 1".as_bytes()), "प्रश्न 1");
    }

    #[test]
    fn decode_text_simple_latin1() {
        let input: &[u8] = &[0x63, 0x61, 0x66, 0xE9];
        assert_eq!(decode_text_simple(input), "caf\u{00E9}");
    }

    #[test]
    fn decode_text_simple_utf16be() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x29];
        assert_eq!(decode_text_simple(input), "A)");
    }

    #[test]
    fn decode_text_simple_utf16be_odd_trailing_byte() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x41, 0x00];
        assert_eq!(decode_text_simple(input), "A");
    }

    #[test]
    fn decode_text_simple_empty() {
        assert_eq!(decode_text_simple(&[]), "");
    }

    #[test]
    fn get_number_accepts_integer_and_real() {
        assert_eq!(get_number_from_value(&PdfValue::Integer(-10)), Some(-10.0));
        assert_eq!(get_number_from_value(&PdfValue::Real(2.5)), Some(2.5));
        assert_eq!(get_number_from_value(&PdfValue::Name(b"F1".to_vec())), None);
    }

    #[test]
    fn convert_object_keeps_text_operands() {
        let arr = lopdf::Object::Array(vec![
            lopdf::Object::String(b"1.".to_vec(), lopdf::StringFormat::Literal),
            lopdf::Object::Integer(-250),
        ]);
        assert_eq!(
            convert_object(&arr),
            PdfValue::Array(vec![PdfValue::Str(b"1.".to_vec()), PdfValue::Integer(-250)]),
        );
        assert_eq!(
            convert_object(&lopdf::Object::Boolean(true)),
            PdfValue::Other
        );
    }

    #[test]
    fn load_bytes_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
