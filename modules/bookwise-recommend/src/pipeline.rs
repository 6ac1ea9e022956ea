use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use bookwise_common::{
    CatalogItem, PipelineLimits, Recommendation, RecommendError, RecommendationQuery,
    RecommendationResult,
};

use crate::catalog::CatalogIndex;
use crate::extract::extract_json_candidate;
use crate::prompt::PromptBuilder;
use crate::traits::{CatalogReader, TextModel};
use crate::validate::{excerpt, sanitize_recommendations};

/// Non-terminal states of one request, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingInput,
    FetchingCatalog,
    BuildingPrompt,
    InvokingModel,
    Extracting,
    Validating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ValidatingInput => "validating_input",
            Stage::FetchingCatalog => "fetching_catalog",
            Stage::BuildingPrompt => "building_prompt",
            Stage::InvokingModel => "invoking_model",
            Stage::Extracting => "extracting",
            Stage::Validating => "validating",
        };
        f.write_str(name)
    }
}

/// Grounds one query in the catalog and turns the model's answer into a
/// bounded, typed result. Holds no per-request state, so one instance serves
/// concurrent requests.
pub struct RecommendationPipeline {
    catalog: Arc<dyn CatalogReader>,
    model: Arc<dyn TextModel>,
    prompts: PromptBuilder,
    limits: PipelineLimits,
}

impl RecommendationPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        model: Arc<dyn TextModel>,
        limits: PipelineLimits,
    ) -> Self {
        Self {
            catalog,
            model,
            prompts: PromptBuilder::new(limits.max_catalog_items),
            limits,
        }
    }

    pub fn limits(&self) -> &PipelineLimits {
        &self.limits
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Run the request to `Done` or a classified failure. Never retries.
    pub async fn recommend(
        &self,
        query: &RecommendationQuery,
    ) -> Result<RecommendationResult, RecommendError> {
        let started = Instant::now();
        let mut stage = Stage::ValidatingInput;

        let outcome = self.run(query, &mut stage).await;

        let query_len = query.char_len();
        match &outcome {
            Ok(result) => info!(
                requestor = %query.requestor_id,
                query_len,
                recommendation_count = result.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                model = self.model.model_id(),
                "Recommendation request successful"
            ),
            Err(e) => warn!(
                requestor = %query.requestor_id,
                query_len,
                kind = %e.kind(),
                stage = %stage,
                error = %e,
                raw_excerpt = e.raw_excerpt().unwrap_or_default(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Recommendation request failed"
            ),
        }
        outcome
    }

    async fn run(
        &self,
        query: &RecommendationQuery,
        stage: &mut Stage,
    ) -> Result<RecommendationResult, RecommendError> {
        self.validate_input(query)?;

        advance(stage, Stage::FetchingCatalog);
        let catalog = self
            .catalog
            .list_available()
            .await
            .map_err(|e| RecommendError::CatalogUnavailable(format!("{e:#}")))?;
        debug!(items = catalog.len(), "Catalog snapshot fetched");

        advance(stage, Stage::BuildingPrompt);
        let prompt = self.prompts.build(&query.text, &catalog);

        advance(stage, Stage::InvokingModel);
        let raw = self.model.invoke(&prompt).await?;
        debug!(
            raw_chars = raw.chars().count(),
            raw_excerpt = %excerpt(&raw),
            "Model responded"
        );

        advance(stage, Stage::Extracting);
        let candidate = extract_json_candidate(&raw).ok_or_else(|| {
            RecommendError::ExtractionFailed {
                raw_excerpt: excerpt(&raw),
            }
        })?;
        debug!(source = ?candidate.source, "Located JSON candidate");

        advance(stage, Stage::Validating);
        let mut recommendations =
            sanitize_recommendations(candidate.text).map_err(|e| e.with_raw_response(&raw))?;
        self.check_catalog_membership(&mut recommendations, &catalog);
        recommendations.truncate(self.limits.max_recommendations);

        Ok(RecommendationResult::from_recommendations(recommendations))
    }

    fn validate_input(&self, query: &RecommendationQuery) -> Result<(), RecommendError> {
        if query.text.trim().is_empty() {
            return Err(RecommendError::EmptyQuery);
        }
        let length = query.char_len();
        if length > self.limits.max_query_chars {
            return Err(RecommendError::QueryTooLong {
                length,
                max: self.limits.max_query_chars,
            });
        }
        Ok(())
    }

    /// Report recommendations naming books outside the snapshot; drop them
    /// when membership is enforced.
    fn check_catalog_membership(
        &self,
        recommendations: &mut Vec<Recommendation>,
        catalog: &[CatalogItem],
    ) {
        let index = CatalogIndex::new(catalog);
        let off_catalog: Vec<String> = recommendations
            .iter()
            .filter(|r| !index.contains(r))
            .map(|r| format!("\"{}\" by {}", r.title, r.author))
            .collect();
        if off_catalog.is_empty() {
            return;
        }

        warn!(
            count = off_catalog.len(),
            titles = ?off_catalog,
            enforced = self.limits.enforce_catalog_membership,
            "Model recommended books outside the catalog snapshot"
        );
        if self.limits.enforce_catalog_membership {
            recommendations.retain(|r| index.contains(r));
        }
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "Pipeline transition");
    *stage = next;
}
