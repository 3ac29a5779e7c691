pub mod docx;

pub use docx::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write Word document: {0}")]
    DocumentWrite(String),
}
