pub mod catalog;
pub mod extract;
pub mod invoker;
pub mod pipeline;
pub mod prompt;
pub mod traits;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use catalog::{catalog_from_source, CatalogIndex, FileCatalog, HttpCatalog};
pub use extract::{extract_json_candidate, Candidate, CandidateSource};
pub use invoker::ClaudeInvoker;
pub use pipeline::{RecommendationPipeline, Stage};
pub use prompt::PromptBuilder;
pub use traits::{CatalogReader, InvokeError, TextModel};
pub use validate::{
    excerpt, sanitize_confidence, sanitize_recommendations, ValidationError, DEFAULT_CONFIDENCE,
    EXCERPT_CHARS,
};
