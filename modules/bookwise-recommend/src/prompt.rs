use tracing::debug;

use bookwise_common::CatalogItem;

const ROLE_PREAMBLE: &str = "You are a librarian AI. Based on the user query: ";

const CATALOG_HEADER: &str = "AVAILABLE BOOKS IN OUR LIBRARY:";

const TASK_INSTRUCTIONS: &str = r#"Task: Recommend ONLY books that exist in our library above. If no relevant books exist, return an empty recommendations array.

Format as JSON:
{
  "recommendations": [
    {
      "title": "Exact title from library",
      "author": "Exact author from library",
      "reason": "Why this book matches the query (max 40 words)",
      "confidence": 0.95
    }
  ]
}

IMPORTANT: Only recommend books that are actually in our library list above. If no relevant books exist, return {"recommendations": []}."#;

const UNKNOWN_GENRE: &str = "Unknown";

/// Renders the grounding prompt. Output is a pure function of the query and
/// the catalog snapshot.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_catalog_items: usize,
}

impl PromptBuilder {
    pub fn new(max_catalog_items: usize) -> Self {
        Self { max_catalog_items }
    }

    pub fn build(&self, query: &str, catalog: &[CatalogItem]) -> String {
        if catalog.len() > self.max_catalog_items {
            debug!(
                catalog_items = catalog.len(),
                rendered = self.max_catalog_items,
                "Catalog exceeds prompt bound, rendering leading items only"
            );
        }

        let books = catalog
            .iter()
            .take(self.max_catalog_items)
            .map(catalog_line)
            .collect::<Vec<_>>()
            .join("\n");

        let mut prompt = String::with_capacity(
            ROLE_PREAMBLE.len() + query.len() + books.len() + TASK_INSTRUCTIONS.len() + 64,
        );
        prompt.push_str(ROLE_PREAMBLE);
        prompt.push('"');
        prompt.push_str(query);
        prompt.push_str("\"\n\n");
        prompt.push_str(CATALOG_HEADER);
        prompt.push('\n');
        prompt.push_str(&books);
        prompt.push_str("\n\n");
        prompt.push_str(TASK_INSTRUCTIONS);
        prompt
    }
}

/// `"<title>" by <author> (<genre>)`, always a single line.
pub fn catalog_line(item: &CatalogItem) -> String {
    let genre = one_line(&item.genre);
    format!(
        "\"{}\" by {} ({})",
        one_line(&item.title),
        one_line(&item.author),
        if genre.is_empty() { UNKNOWN_GENRE } else { genre.as_str() }
    )
}

fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
