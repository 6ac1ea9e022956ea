use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use bookwise_common::{CatalogItem, CatalogSource, Recommendation};

use crate::traits::CatalogReader;

/// Build the reader configured for this deployment.
pub fn catalog_from_source(source: &CatalogSource) -> Arc<dyn CatalogReader> {
    match source {
        CatalogSource::Http { base_url, timeout } => Arc::new(HttpCatalog::new(base_url, *timeout)),
        CatalogSource::File(path) => Arc::new(FileCatalog::new(path.clone())),
    }
}

// ---------------------------------------------------------------------------
// Body decoding
// ---------------------------------------------------------------------------

/// The books API answers either with its scan envelope or a bare array.
/// `Bare` is tried first: derived structs also accept sequences, so the
/// envelope would otherwise swallow a one-element array.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    Bare(Vec<CatalogItem>),
    Envelope { response: ScanOutput },
}

#[derive(Deserialize)]
struct ScanOutput {
    #[serde(rename = "Items", default)]
    items: Vec<CatalogItem>,
}

/// Decode a catalog payload, accepting `{"response": {"Items": [...]}}` or `[...]`.
pub fn parse_catalog_body(body: &str) -> Result<Vec<CatalogItem>> {
    let parsed: CatalogBody =
        serde_json::from_str(body).context("catalog body is not a recognised books payload")?;
    Ok(match parsed {
        CatalogBody::Envelope { response } => response.items,
        CatalogBody::Bare(items) => items,
    })
}

// ---------------------------------------------------------------------------
// HttpCatalog
// ---------------------------------------------------------------------------

pub struct HttpCatalog {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!("{}/getBooks", base_url.trim_end_matches('/')),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogReader for HttpCatalog {
    async fn list_available(&self) -> Result<Vec<CatalogItem>> {
        let response = self
            .http
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("catalog request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("catalog request to {} returned {}", self.url, status);
        }

        let body = response.text().await.context("failed to read catalog body")?;
        let items = parse_catalog_body(&body)?;
        debug!(url = %self.url, items = items.len(), "Fetched catalog over HTTP");
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// FileCatalog
// ---------------------------------------------------------------------------

pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogReader for FileCatalog {
    async fn list_available(&self) -> Result<Vec<CatalogItem>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read catalog file {}", self.path.display()))?;
        parse_catalog_body(&body)
    }
}

// ---------------------------------------------------------------------------
// CatalogIndex
// ---------------------------------------------------------------------------

/// (title, author) lookup over a snapshot. Comparison ignores case and
/// whitespace differences.
pub struct CatalogIndex {
    entries: HashSet<(String, String)>,
}

impl CatalogIndex {
    pub fn new(items: &[CatalogItem]) -> Self {
        Self {
            entries: items
                .iter()
                .map(|item| (normalize(&item.title), normalize(&item.author)))
                .collect(),
        }
    }

    pub fn contains(&self, recommendation: &Recommendation) -> bool {
        self.entries.contains(&(
            normalize(&recommendation.title),
            normalize(&recommendation.author),
        ))
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scan_envelope() {
        let body = r#"{"response": {"Items": [
            {"id": "1", "title": "Gone Girl", "author": "Gillian Flynn", "genre": "Mystery"}
        ], "Count": 1}}"#;
        let items = parse_catalog_body(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].genre, "Mystery");
    }

    #[test]
    fn envelope_without_items_is_empty() {
        assert!(parse_catalog_body(r#"{"response": {}}"#).unwrap().is_empty());
    }

    #[test]
    fn parses_bare_array() {
        let body = r#"[{"title": "Dune", "author": "Frank Herbert", "genre": "Science Fiction"}]"#;
        let items = parse_catalog_body(body).unwrap();
        assert_eq!(items[0].title, "Dune");
    }

    #[test]
    fn rejects_unrecognised_payload() {
        assert!(parse_catalog_body(r#"{"books": []}"#).is_err());
        assert!(parse_catalog_body("<html>").is_err());
    }

    #[test]
    fn http_catalog_appends_books_route() {
        let catalog = HttpCatalog::new("https://api.example.com/prod/", Duration::from_secs(5));
        assert_eq!(catalog.url(), "https://api.example.com/prod/getBooks");
    }

    #[test]
    fn index_matches_loosely() {
        let index = CatalogIndex::new(&[CatalogItem::new("1", "Gone Girl", "Gillian Flynn", "Mystery")]);
        let hit = Recommendation {
            title: "  gone  girl ".to_string(),
            author: "GILLIAN FLYNN".to_string(),
            reason: "r".to_string(),
            confidence: 0.5,
        };
        let miss = Recommendation {
            title: "Sharp Objects".to_string(),
            ..hit.clone()
        };
        assert!(index.contains(&hit));
        assert!(!index.contains(&miss));
    }

    #[tokio::test]
    async fn file_catalog_reads_json_array() {
        let path = std::env::temp_dir().join(format!("bookwise-catalog-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"[{"id": "7", "title": "Rebecca", "author": "Daphne du Maurier", "genre": "Gothic"}]"#,
        )
        .await
        .unwrap();

        let items = FileCatalog::new(&path).list_available().await.unwrap();
        tokio::fs::remove_file(&path).await.ok();

        assert_eq!(items, vec![CatalogItem::new("7", "Rebecca", "Daphne du Maurier", "Gothic")]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let catalog = FileCatalog::new("/nonexistent/bookwise/books.json");
        assert!(catalog.list_available().await.is_err());
    }
}
