//! Wiring shared by the `character` and `pdf_qa` binaries.

pub mod config;
pub mod telemetry;

pub use config::{CharacterConfig, PdfQaConfig, RetryConfig, load_api_config};
pub use telemetry::init_tracing;
