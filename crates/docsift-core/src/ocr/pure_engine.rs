//! OCR provider backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use super::{LayoutReconstructor, OcrProvider, RecognizedWord};
use crate::error::{DocsiftError, OcrError, Result};
use crate::models::config::{DocsiftConfig, PdfConfig};
use crate::pdf::{PdfExtractor, PdfProcessor};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

enum SourceKind {
    Pdf,
    Image,
}

/// Runs OCR on images and scanned PDFs; digital PDFs use their text layer.
pub struct PureOcrProvider {
    engine: Option<pure_onnx_ocr::engine::OcrEngine>,
    pdf: PdfConfig,
    reconstructor: LayoutReconstructor,
}

impl PureOcrProvider {
    /// Load the models named in `config`.
    ///
    /// With `text_only` set, or when the model files are missing, no engine
    /// is loaded and only PDF text layers can be read.
    pub fn from_config(config: &DocsiftConfig, text_only: bool) -> Result<Self> {
        let engine = if text_only {
            None
        } else if !config.ocr.models_available() {
            warn!(
                "OCR models not found in {}, only PDF text layers can be read",
                config.ocr.model_dir.display()
            );
            None
        } else {
            let (det, rec, dict) = config.ocr.model_paths();
            let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
                .det_model_path(&det)
                .rec_model_path(&rec)
                .dictionary_path(&dict)
                .build()
                .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;
            info!("Loaded pure-onnx-ocr engine from {}", config.ocr.model_dir.display());
            Some(engine)
        };

        Ok(Self {
            engine,
            pdf: config.pdf.clone(),
            reconstructor: LayoutReconstructor::from_config(&config.layout),
        })
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    fn kind(path: &Path) -> Result<SourceKind> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if ext == "pdf" {
            Ok(SourceKind::Pdf)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(SourceKind::Image)
        } else {
            Err(DocsiftError::UnsupportedFormat(path.to_path_buf()))
        }
    }

    /// Recognize the words of one image.
    pub fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedWord>> {
        let engine = self.engine.as_ref().ok_or_else(|| {
            OcrError::ModelLoad("no OCR engine loaded".to_string())
        })?;

        let start = Instant::now();
        let (width, height) = image.dimensions();

        let results = engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let words: Vec<RecognizedWord> = results
            .iter()
            .filter_map(|r| {
                let (left, top) = top_left(&r.bounding_box)?;
                Some(RecognizedWord::new(r.text.replace("[UNK]", " "), left, top))
            })
            .collect();

        debug!(
            "OCR {}x{}: {} words in {}ms",
            width,
            height,
            words.len(),
            start.elapsed().as_millis()
        );
        Ok(words)
    }

    fn load_pdf(path: &Path) -> Result<PdfExtractor> {
        let data = std::fs::read(path)?;
        Ok(PdfExtractor::from_bytes(&data)?)
    }

    fn page_image(pdf: &PdfExtractor, path: &Path, page: u32) -> Result<DynamicImage> {
        pdf.extract_images(page)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                OcrError::NoPageImage {
                    path: path.to_path_buf(),
                    page,
                }
                .into()
            })
    }
}

impl OcrProvider for PureOcrProvider {
    fn get_text(&self, document: &Path) -> Result<String> {
        match Self::kind(document)? {
            SourceKind::Image => {
                let image = image::open(document)?;
                Ok(self.reconstructor.reconstruct_text(&self.recognize(&image)?))
            }
            SourceKind::Pdf => {
                let pdf = Self::load_pdf(document)?;

                if self.pdf.prefer_embedded_text {
                    if let Some(text) = pdf.usable_text(self.pdf.min_text_length) {
                        debug!("using text layer of {}", document.display());
                        return Ok(text);
                    }
                }

                let mut pages = pdf.page_count();
                if self.pdf.max_pages > 0 {
                    pages = pages.min(self.pdf.max_pages as u32);
                }

                let mut text = Vec::new();
                for page in 1..=pages {
                    for image in pdf.extract_images(page)? {
                        text.push(self.reconstructor.reconstruct_text(&self.recognize(&image)?));
                    }
                }
                Ok(text.join("\n"))
            }
        }
    }

    fn get_word_boxes(&self, document: &Path, page: u32) -> Result<Vec<RecognizedWord>> {
        let image = match Self::kind(document)? {
            SourceKind::Image if page == 1 => image::open(document)?,
            SourceKind::Image => {
                return Err(OcrError::NoPageImage {
                    path: document.to_path_buf(),
                    page,
                }
                .into());
            }
            SourceKind::Pdf => Self::page_image(&Self::load_pdf(document)?, document, page)?,
        };

        self.recognize(&image)
    }
}

/// Minimum x and y over the exterior of a detected polygon.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> Option<(i32, i32)> {
    polygon.exterior().coords().fold(None, |acc, c| {
        let (x, y) = (c.x, c.y);
        Some(match acc {
            None => (x, y),
            Some((ax, ay)) => (f64::min(ax, x), f64::min(ay, y)),
        })
    })
    .map(|(x, y)| (x.round() as i32, y.round() as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_only() -> PureOcrProvider {
        PureOcrProvider::from_config(&DocsiftConfig::default(), true).unwrap()
    }

    #[test]
    fn test_text_only_has_no_engine() {
        assert!(!text_only().has_engine());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = text_only().get_text(Path::new("notes.docx"));
        assert!(matches!(result, Err(DocsiftError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_image_page_beyond_first() {
        let result = text_only().get_word_boxes(Path::new("scan.png"), 2);
        assert!(matches!(
            result,
            Err(DocsiftError::Ocr(OcrError::NoPageImage { page: 2, .. }))
        ));
    }

    #[test]
    fn test_recognize_without_engine() {
        let image = DynamicImage::new_rgb8(4, 4);
        let result = text_only().recognize(&image);
        assert!(matches!(result, Err(DocsiftError::Ocr(OcrError::ModelLoad(_)))));
    }
}
