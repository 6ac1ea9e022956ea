use serde::{Deserialize, Serialize};

/// Shown alongside an empty recommendation list.
pub const NO_MATCH_MESSAGE: &str = "No relevant books found in our library for your query. Try a different search term or browse our available books.";

// --- Catalog ---

/// A book as served by the catalog store. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// --- Query ---

/// One user request. `requestor_id` is opaque and only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationQuery {
    pub text: String,
    pub requestor_id: String,
}

impl RecommendationQuery {
    pub fn new(text: impl Into<String>, requestor_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            requestor_id: requestor_id.into(),
        }
    }

    /// Length in characters, which is what the query limit is measured in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

// --- Results ---

/// A recommendation whose fields have been type-checked and sanitized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub author: String,
    pub reason: String,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecommendationResult {
    /// Wraps validated recommendations; an empty list becomes the no-match result.
    pub fn from_recommendations(recommendations: Vec<Recommendation>) -> Self {
        if recommendations.is_empty() {
            return Self::no_match();
        }
        Self {
            recommendations,
            message: None,
        }
    }

    pub fn no_match() -> Self {
        Self {
            recommendations: Vec::new(),
            message: Some(NO_MATCH_MESSAGE.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recommendations.len()
    }
}
