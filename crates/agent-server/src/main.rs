//! Retention Agent HTTP Server
//!
//! Axum-based server exposing the player retention agent over a small REST API.

mod demo;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{LlmProvider, TracingObserver};
use agent_runtime::OllamaProvider;
use retention_advisor::{AdvisorConfig, MySqlDataSource, RetentionAdvisor, UserDataSource};

use crate::handlers::{health_check, list_models, retention_plan, risk_analysis};
use crate::state::AppState;

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        // Agent API
        .route("/api/risk-analysis", post(risk_analysis))
        .route("/api/retention-plan", post(retention_plan))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Warehouse source when a database is configured, demo players otherwise
async fn user_source(database_url: Option<&str>) -> retention_advisor::Result<Arc<dyn UserDataSource>> {
    match database_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => Ok(Arc::new(MySqlDataSource::connect(url).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set - serving demo players only");
            Ok(Arc::new(demo::seeded_source()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AdvisorConfig::from_env()?;

    // Initialize LLM provider
    let provider: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::from_env());

    // Verify Ollama connection
    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("Connected to Ollama");
            if let Ok(models) = provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("Ollama not available - agent runs will fail");
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    let source = user_source(std::env::var("DATABASE_URL").ok().as_deref()).await?;
    let advisor = RetentionAdvisor::new(provider.clone(), source, &config)?
        .with_observer(Arc::new(TracingObserver));

    tracing::info!("Registered {} tools:", advisor.agent().tools().len());
    for name in advisor.agent().tools().names() {
        tracing::info!("  • {}", name);
    }

    let state = AppState {
        provider,
        advisor: Arc::new(advisor),
    };

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("retention agent server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health              - Health check");
    tracing::info!("  GET  /api/models          - List available models");
    tracing::info!("  POST /api/risk-analysis   - Analyze a player's churn risk");
    tracing::info!("  POST /api/retention-plan  - Build a retention plan");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
