pub mod import;
pub mod extraction;
pub mod export;
pub mod processor;
