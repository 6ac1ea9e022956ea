pub mod config;
pub mod error;
pub mod types;

pub use config::{CatalogSource, Config, LogFormat, ModelSettings, PipelineLimits, ResponseFormat};
pub use error::{FailureKind, RecommendError};
pub use types::*;
