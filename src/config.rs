use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "CV Text Extractor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Suggested file name for the generated Word document.
pub const DOWNLOAD_FILE_NAME: &str = "cv_text.docx";

/// MIME type of the generated Word document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Upload MIME types the extractor accepts.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["application/pdf", "image/png", "image/jpeg"];

/// Latin script plus Vietnamese, the CV languages this tool targets.
pub const DEFAULT_OCR_LANGUAGES: &str = "eng+vie";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 50;

/// Matches the 200 DPI default of the pdf2image / poppler toolchain.
pub const DEFAULT_RENDER_DPI: u32 = 200;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "cvtext=info,cvtext_lib=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Root for per-request workspaces. `None` means a process-owned temp dir.
    pub work_dir: Option<PathBuf>,
    pub tessdata_dir: Option<PathBuf>,
    pub ocr_languages: String,
    pub render_dpi: u32,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8501)),
            work_dir: None,
            tessdata_dir: None,
            ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
            render_dpi: DEFAULT_RENDER_DPI,
            max_upload_bytes: (DEFAULT_MAX_UPLOAD_MB * 1024 * 1024) as usize,
        }
    }
}

impl AppConfig {
    /// Build the configuration from `CVTEXT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("CVTEXT_BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    var: "CVTEXT_BIND_ADDR",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => defaults.bind_addr,
        };

        let render_dpi = match get("CVTEXT_RENDER_DPI") {
            Some(raw) => {
                let dpi = parse_positive("CVTEXT_RENDER_DPI", &raw)?;
                u32::try_from(dpi).map_err(|_| out_of_range("CVTEXT_RENDER_DPI", &raw))?
            }
            None => defaults.render_dpi,
        };

        let max_upload_bytes = match get("CVTEXT_MAX_UPLOAD_MB") {
            Some(raw) => parse_positive("CVTEXT_MAX_UPLOAD_MB", &raw)?
                .checked_mul(1024 * 1024)
                .and_then(|bytes| usize::try_from(bytes).ok())
                .ok_or_else(|| out_of_range("CVTEXT_MAX_UPLOAD_MB", &raw))?,
            None => defaults.max_upload_bytes,
        };

        let ocr_languages = match get("CVTEXT_OCR_LANGUAGES") {
            Some(raw) => normalize_languages(&raw).ok_or_else(|| ConfigError::InvalidValue {
                var: "CVTEXT_OCR_LANGUAGES",
                value: raw.clone(),
                reason: "expected language codes joined by '+', e.g. eng+vie".into(),
            })?,
            None => defaults.ocr_languages,
        };

        Ok(Self {
            bind_addr,
            work_dir: get("CVTEXT_WORK_DIR").map(PathBuf::from),
            tessdata_dir: get("CVTEXT_TESSDATA_DIR").map(PathBuf::from),
            ocr_languages,
            render_dpi,
            max_upload_bytes,
        })
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: "must be greater than zero".into(),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn out_of_range(var: &'static str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
        reason: "value is too large".into(),
    }
}

/// Accepts "eng+vie", "eng, vie" or "eng vie"; returns Tesseract's "eng+vie" form.
fn normalize_languages(raw: &str) -> Option<String> {
    let langs: Vec<&str> = raw
        .split(|c: char| c == '+' || c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    let valid = !langs.is_empty()
        && langs
            .iter()
            .all(|l| l.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));

    valid.then(|| langs.join("+"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.ocr_languages, "eng+vie");
        assert_eq!(config.render_dpi, 200);
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert!(config.work_dir.is_none());
        assert!(config.tessdata_dir.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CVTEXT_BIND_ADDR", "0.0.0.0:9000"),
            ("CVTEXT_WORK_DIR", "/var/tmp/cvtext"),
            ("CVTEXT_TESSDATA_DIR", "/usr/share/tessdata"),
            ("CVTEXT_OCR_LANGUAGES", "eng, fra"),
            ("CVTEXT_RENDER_DPI", "300"),
            ("CVTEXT_MAX_UPLOAD_MB", "5"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.work_dir, Some(PathBuf::from("/var/tmp/cvtext")));
        assert_eq!(config.tessdata_dir, Some(PathBuf::from("/usr/share/tessdata")));
        assert_eq!(config.ocr_languages, "eng+fra");
        assert_eq!(config.render_dpi, 300);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("CVTEXT_WORK_DIR", "  "), ("CVTEXT_RENDER_DPI", "")]))
                .unwrap();
        assert!(config.work_dir.is_none());
        assert_eq!(config.render_dpi, DEFAULT_RENDER_DPI);
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let err = AppConfig::from_lookup(lookup_from(&[("CVTEXT_BIND_ADDR", "localhost")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "CVTEXT_BIND_ADDR", .. }));
    }

    #[test]
    fn rejects_zero_dpi() {
        let err =
            AppConfig::from_lookup(lookup_from(&[("CVTEXT_RENDER_DPI", "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn rejects_garbage_languages() {
        assert!(AppConfig::from_lookup(lookup_from(&[("CVTEXT_OCR_LANGUAGES", "eng+../x")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("CVTEXT_OCR_LANGUAGES", "+ ,")])).is_err());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn accepted_mime_types_cover_pdf_and_images() {
        assert!(ACCEPTED_MIME_TYPES.contains(&"application/pdf"));
        assert!(ACCEPTED_MIME_TYPES.contains(&"image/png"));
        assert!(ACCEPTED_MIME_TYPES.contains(&"image/jpeg"));
    }

    #[test]
    fn oversized_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("CVTEXT_RENDER_DPI", "4294967296")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "CVTEXT_RENDER_DPI", .. }));

        let err = AppConfig::from_lookup(lookup_from(&[(
            "CVTEXT_MAX_UPLOAD_MB",
            "18446744073709551615",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "CVTEXT_MAX_UPLOAD_MB", .. }));
    }
}
