use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bookwise_common::{Config, LogFormat};
use bookwise_recommend::{catalog_from_source, ClaudeInvoker, RecommendationPipeline};

mod requestor;
mod rest;
mod routes;

pub struct AppState {
    pub pipeline: RecommendationPipeline,
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("bookwise=info".parse()?);
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format)?;

    let mut invoker = ClaudeInvoker::new(config.anthropic_api_key.clone(), &config.model);
    if let Some(ref url) = config.anthropic_base_url {
        invoker = invoker.with_base_url(url.clone());
    }

    let pipeline = RecommendationPipeline::new(
        catalog_from_source(&config.catalog),
        Arc::new(invoker),
        config.limits.clone(),
    );
    let app = routes::router(Arc::new(AppState { pipeline }));

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!(
        model = %config.model.model,
        max_results = config.limits.max_recommendations,
        enforce_catalog = config.limits.enforce_catalog_membership,
        "Bookwise API starting on {addr}"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
