// Test mocks for the recommendation pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockCatalog (CatalogReader): fixed snapshot or forced failure
// - MockModel (TextModel): canned reply or classified failure, records prompts
//
// Both count calls so tests can assert a collaborator was never reached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use bookwise_common::{CatalogItem, PipelineLimits};

use crate::pipeline::RecommendationPipeline;
use crate::traits::{CatalogReader, InvokeError, TextModel};

// ---------------------------------------------------------------------------
// MockCatalog
// ---------------------------------------------------------------------------

pub struct MockCatalog {
    items: Vec<CatalogItem>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            items: Vec::new(),
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogReader for MockCatalog {
    async fn list_available(&self) -> Result<Vec<CatalogItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            bail!("MockCatalog: {message}");
        }
        Ok(self.items.clone())
    }
}

// ---------------------------------------------------------------------------
// MockModel
// ---------------------------------------------------------------------------

pub struct MockModel {
    reply: Result<String, InvokeError>,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: InvokeError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextModel for MockModel {
    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn invoke(&self, prompt: &str) -> std::result::Result<String, InvokeError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn book(title: &str, author: &str, genre: &str) -> CatalogItem {
    let id = title.to_lowercase().replace(' ', "-");
    CatalogItem::new(id, title, author, genre)
}

/// A small catalog drawn from the library's seed data.
pub fn sample_catalog() -> Vec<CatalogItem> {
    vec![
        book("The Midnight Library", "Matt Haig", "Fiction"),
        book("Project Hail Mary", "Andy Weir", "Science Fiction"),
        book("The Silent Patient", "Alex Michaelides", "Mystery"),
        book("Gone Girl", "Gillian Flynn", "Mystery"),
    ]
}

/// Wrap a JSON payload the way chatty models do.
pub fn fenced(json: &str) -> String {
    format!("Here are my recommendations:\n\n```json\n{json}\n```\n\nHappy reading!")
}

pub fn pipeline_with(
    catalog: Arc<MockCatalog>,
    model: Arc<MockModel>,
    limits: PipelineLimits,
) -> RecommendationPipeline {
    RecommendationPipeline::new(catalog, model, limits)
}

pub fn pipeline(catalog: Arc<MockCatalog>, model: Arc<MockModel>) -> RecommendationPipeline {
    pipeline_with(catalog, model, PipelineLimits::default())
}
