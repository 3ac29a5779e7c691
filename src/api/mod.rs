//! HTTP surface: the upload page, JSON extraction and .docx download.
//!
//! `app_router()` returns a composable `Router`; `server` binds it and
//! manages the background task.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::app_router;
pub use server::{start_server_on, AppServer, ServerSession};
pub use types::AppState;
