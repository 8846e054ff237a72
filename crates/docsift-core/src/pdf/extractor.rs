//! PDF text and image extraction using lopdf and pdf-extract.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF content extractor using lopdf.
#[derive(Default)]
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a PDF from bytes in one step.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    fn decode_image(doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("image XObject {}x{}", width, height);

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            // JPEG streams are decoded from the raw (still compressed) bytes.
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("unsupported image filter");
                return None;
            }
            _ => {}
        }

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            return None;
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.clone()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()).map(<[u8]>::to_vec),
                Object::Reference(r) => doc
                    .get_object(*r)
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(<[u8]>::to_vec),
                _ => None,
            })
            .unwrap_or_else(|| b"DeviceRGB".to_vec());

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let pixels = usize::try_from(width.checked_mul(height)?).ok()?;
        let rgb_len = pixels.checked_mul(3)?;

        match color_space.as_slice() {
            b"DeviceRGB" | b"RGB" if data.len() >= rgb_len => {
                RgbImage::from_raw(width, height, data[..rgb_len].to_vec())
                    .map(DynamicImage::ImageRgb8)
            }
            b"DeviceGray" | b"G" if data.len() >= pixels => {
                GrayImage::from_raw(width, height, data[..pixels].to_vec())
                    .map(DynamicImage::ImageLuma8)
            }
            _ => None,
        }
    }

    /// Resources of a page, walking up the page tree for inherited ones.
    fn resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
        let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res))) = doc.dereference(resources) {
                return Some(res.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => Self::resources(doc, *parent),
            _ => None,
        }
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt("").map_err(|_| PdfError::Encrypted)?;
            debug!("decrypted PDF with empty password");

            // pdf-extract reads from bytes, so keep the decrypted form.
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let pages = doc.get_pages().len();
        if pages == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("loaded PDF with {} pages", pages);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        self.document()?;
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let page_id = *doc.get_pages().get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        let xobjects = Self::resources(doc, page_id)
            .and_then(|res| res.get(b"XObject").ok().cloned())
            .and_then(|x| match doc.dereference(&x) {
                Ok((_, Object::Dictionary(dict))) => Some(dict.clone()),
                _ => None,
            });

        if let Some(xobjects) = xobjects {
            for (_, obj_ref) in xobjects.iter() {
                if let Ok((_, obj)) = doc.dereference(obj_ref) {
                    if let Some(img) = Self::decode_image(doc, obj) {
                        images.push(img);
                    }
                }
            }
        }

        debug!("extracted {} images from page {}", images.len(), page);
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_extractor() {
        let extractor = PdfExtractor::new();
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.extract_text().is_err());
        assert!(extractor.usable_text(0).is_none());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let result = PdfExtractor::from_bytes(b"not a pdf");
        assert!(matches!(result, Err(PdfError::Parse(_))));
    }

    fn image_stream(width: i64, height: i64, content: Vec<u8>) -> Object {
        let mut dict = Dictionary::new();
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(width));
        dict.set("Height", Object::Integer(height));
        dict.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));
        Object::Stream(lopdf::Stream::new(dict, content))
    }

    #[test]
    fn test_decode_gray_image() {
        let doc = Document::new();
        let image = PdfExtractor::decode_image(&doc, &image_stream(2, 2, vec![0, 64, 128, 255]));
        let image = image.unwrap();
        assert_eq!((image.width(), image.height()), (2, 2));
    }

    #[test]
    fn test_decode_rejects_bad_dimensions() {
        let doc = Document::new();
        assert!(PdfExtractor::decode_image(&doc, &image_stream(-1, 4, vec![0; 16])).is_none());
        assert!(PdfExtractor::decode_image(&doc, &image_stream(70_000, 70_000, vec![0; 16])).is_none());
    }
}
