use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::{OcrEngine, OcrPageResult};
use super::ExtractionError;

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct BundledTesseract {
    tessdata_dir: Option<std::path::PathBuf>,
    languages: String,
}

#[cfg(feature = "ocr")]
impl BundledTesseract {
    /// Initialize with an optional tessdata directory and a "+"-joined language list.
    ///
    /// With an explicit directory every requested language must have its
    /// `<lang>.traineddata` there. Without one, Tesseract's own lookup
    /// (`TESSDATA_PREFIX`, compiled-in path) is used and checked lazily.
    pub fn new(tessdata_dir: Option<&Path>, languages: &str) -> Result<Self, ExtractionError> {
        if let Some(dir) = tessdata_dir {
            check_traineddata(dir, languages)?;
        }

        tracing::info!(
            languages,
            tessdata = ?tessdata_dir.map(|d| d.display().to_string()),
            "Tesseract OCR engine configured"
        );

        Ok(Self {
            tessdata_dir: tessdata_dir.map(Path::to_path_buf),
            languages: languages.to_string(),
        })
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for BundledTesseract {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        let tessdata_str = match self.tessdata_dir {
            Some(ref dir) => Some(
                dir.to_str()
                    .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?,
            ),
            None => None,
        };

        let tess = tesseract::Tesseract::new(tessdata_str, Some(&self.languages))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?;

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let confidence = tess.mean_text_conf().max(0) as f32 / 100.0;

        tracing::debug!(
            chars = text.len(),
            confidence,
            "Tesseract recognized image"
        );

        Ok(OcrPageResult { text, confidence })
    }

    fn languages(&self) -> &str {
        &self.languages
    }
}

/// Verify `<lang>.traineddata` exists in `dir` for every language in `languages`.
pub fn check_traineddata(dir: &Path, languages: &str) -> Result<(), ExtractionError> {
    for lang in languages.split('+').filter(|l| !l.is_empty()) {
        if !dir.join(format!("{lang}.traineddata")).exists() {
            return Err(ExtractionError::TessdataNotFound {
                dir: dir.to_path_buf(),
                lang: lang.to_string(),
            });
        }
    }
    Ok(())
}

/// Stand-in engine when OCR cannot run (feature disabled or init failure).
/// Digital PDFs still work; any page that needs OCR fails with the stored reason.
pub struct UnavailableOcrEngine {
    reason: String,
    languages: String,
}

impl UnavailableOcrEngine {
    pub fn new(reason: impl Into<String>, languages: &str) -> Self {
        Self {
            reason: reason.into(),
            languages: languages.to_string(),
        }
    }
}

impl OcrEngine for UnavailableOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        Err(ExtractionError::OcrInit(self.reason.clone()))
    }

    fn languages(&self) -> &str {
        &self.languages
    }
}

/// Build the production OCR engine, degrading to [`UnavailableOcrEngine`].
pub fn build_ocr_engine(
    tessdata_dir: Option<&Path>,
    languages: &str,
) -> Box<dyn OcrEngine + Send + Sync> {
    #[cfg(feature = "ocr")]
    {
        match BundledTesseract::new(tessdata_dir, languages) {
            Ok(engine) => Box::new(engine),
            Err(e) => {
                tracing::warn!(error = %e, "OCR unavailable, scanned pages will fail");
                Box::new(UnavailableOcrEngine::new(e.to_string(), languages))
            }
        }
    }

    #[cfg(not(feature = "ocr"))]
    {
        let _ = tessdata_dir;
        tracing::warn!("Built without the `ocr` feature, scanned pages will fail");
        Box::new(UnavailableOcrEngine::new(
            "OCR support is not compiled in (rebuild with --features ocr)",
            languages,
        ))
    }
}

/// Mock OCR engine for unit testing without Tesseract.
///
/// Returns its responses in rotation and counts calls.
pub struct MockOcrEngine {
    responses: Vec<String>,
    confidence: f32,
    fail: bool,
    calls: AtomicUsize,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self::with_responses(&[text], confidence)
    }

    pub fn with_responses(responses: &[&str], confidence: f32) -> Self {
        Self {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            confidence,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// An engine whose every call fails with `OcrProcessing`.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_responses(&[], 0.0)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ExtractionError::OcrProcessing("mock engine failure".into()));
        }
        let text = if self.responses.is_empty() {
            String::new()
        } else {
            self.responses[call % self.responses.len()].clone()
        };
        Ok(OcrPageResult {
            text,
            confidence: self.confidence,
        })
    }

    fn languages(&self) -> &str {
        crate::config::DEFAULT_OCR_LANGUAGES
    }
}
