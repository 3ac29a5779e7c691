pub mod api;
pub mod config;
pub mod pipeline;

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::pipeline::extraction::orchestrator::DocumentExtractor;
use crate::pipeline::extraction::pdf::PdfTextExtractor;
use crate::pipeline::extraction::pdf_renderer::EmbeddedImageRenderer;
use crate::pipeline::extraction::pdfium::PdfiumRenderer;
use crate::pipeline::extraction::types::PdfPageRenderer;
use crate::pipeline::extraction::build_ocr_engine;
use crate::pipeline::import::staging::cleanup_orphaned_workspaces;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server error: {0}")]
    Server(String),
}

/// Where request workspaces live for the lifetime of the process.
enum WorkRoot {
    /// Operator-provided directory, left in place on exit.
    Configured(PathBuf),
    /// Removed when dropped at shutdown.
    Owned(tempfile::TempDir),
}

impl WorkRoot {
    fn prepare(config: &AppConfig) -> Result<Self, std::io::Error> {
        match &config.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let removed = cleanup_orphaned_workspaces(dir);
                if removed > 0 {
                    tracing::info!(removed, "Removed leftover request workspaces");
                }
                Ok(Self::Configured(dir.clone()))
            }
            None => Ok(Self::Owned(
                tempfile::Builder::new().prefix("cvtext-").tempdir()?,
            )),
        }
    }

    fn path(&self) -> PathBuf {
        match self {
            Self::Configured(dir) => dir.clone(),
            Self::Owned(dir) => dir.path().to_path_buf(),
        }
    }
}

/// Wire the production extractor: pdf-extract for text, Tesseract for OCR,
/// PDFium for rendering with the lopdf image fallback.
pub fn build_extractor(config: &AppConfig) -> DocumentExtractor {
    let ocr_engine = build_ocr_engine(config.tessdata_dir.as_deref(), &config.ocr_languages);

    let renderer: Box<dyn PdfPageRenderer + Send + Sync> = match PdfiumRenderer::new() {
        Ok(renderer) => {
            tracing::info!("PDF page rendering via PDFium");
            Box::new(renderer)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "PDFium unavailable, scanned pages will use their embedded images"
            );
            Box::new(EmbeddedImageRenderer)
        }
    };

    DocumentExtractor::new(ocr_engine, Box::new(PdfTextExtractor), renderer)
        .with_render_dpi(config.render_dpi)
}

pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let work_root = WorkRoot::prepare(&config)?;
    tracing::info!(
        work_root = %work_root.path().display(),
        ocr_languages = %config.ocr_languages,
        render_dpi = config.render_dpi,
        max_upload_bytes = config.max_upload_bytes,
        "Configuration loaded"
    );

    let extractor = build_extractor(&config);
    let state = api::AppState::new(
        Arc::new(extractor),
        work_root.path(),
        config.ocr_languages.clone(),
        config.max_upload_bytes,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let server = api::start_server_on(state, config.bind_addr)
            .await
            .map_err(StartupError::Server)?;
        tracing::info!("Open http://{} in a browser", server.session.server_addr);

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }
        server.stop().await;
        Ok::<(), StartupError>(())
    })?;

    drop(work_root);
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
