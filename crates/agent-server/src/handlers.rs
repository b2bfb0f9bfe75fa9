//! HTTP Handlers

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, RunResult, provider::ModelInfo};
use retention_advisor::{AdvisorError, RiskLevel, UserProfile};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ollama_connected: bool,
    pub tools: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RiskAnalysisRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct RetentionPlanRequest {
    pub user_id: String,
    pub risk_level: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// Agent failures are upstream failures: the model misbehaved or is unreachable
fn agent_failure(err: &AdvisorError) -> ApiError {
    tracing::error!(error = %err, "Agent run failed");
    match err {
        AdvisorError::Agent(inner @ AgentError::Parse(_)) => {
            api_error(StatusCode::BAD_GATEWAY, inner.user_message(), "PARSE_ERROR")
        }
        AdvisorError::Agent(inner @ (AgentError::Provider(_) | AgentError::ProviderUnavailable(_))) => {
            api_error(StatusCode::BAD_GATEWAY, inner.user_message(), "MODEL_ERROR")
        }
        other => api_error(StatusCode::BAD_GATEWAY, other.to_string(), "AGENT_ERROR"),
    }
}

fn require_user_id(user_id: &str) -> Result<(), ApiError> {
    if user_id.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "user_id must not be empty", "INVALID_REQUEST"));
    }
    Ok(())
}

/// Unwrap a JSON body, reporting rejections in the usual error shape
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Request body rejected");
        api_error(rejection.status(), rejection.body_text(), "INVALID_REQUEST")
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ollama_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        ollama_connected,
        tools: state.advisor.agent().tools().names().into_iter().map(String::from).collect(),
    })
}

/// Models available on the provider
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<ModelInfo>>, ApiError> {
    state.provider.list_models().await.map(Json).map_err(|e| {
        tracing::warn!(error = %e, "Model listing failed");
        api_error(StatusCode::BAD_GATEWAY, e.user_message(), "MODEL_ERROR")
    })
}

/// Churn risk analysis for one player
pub async fn risk_analysis(
    State(state): State<AppState>,
    payload: Result<Json<RiskAnalysisRequest>, JsonRejection>,
) -> Result<Json<RunResult>, ApiError> {
    let payload = json_body(payload)?;
    require_user_id(&payload.user_id)?;

    state
        .advisor
        .analyze_user_risk(&payload.user_id, &payload.profile)
        .await
        .map(Json)
        .map_err(|e| agent_failure(&e))
}

/// Retention plan for a player at a given risk tier
pub async fn retention_plan(
    State(state): State<AppState>,
    payload: Result<Json<RetentionPlanRequest>, JsonRejection>,
) -> Result<Json<RunResult>, ApiError> {
    let payload = json_body(payload)?;
    require_user_id(&payload.user_id)?;

    state
        .advisor
        .generate_retention_plan(&payload.user_id, RiskLevel::parse(&payload.risk_level))
        .await
        .map(Json)
        .map_err(|e| agent_failure(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_is_bad_gateway() {
        let (status, Json(body)) = agent_failure(&AdvisorError::Agent(AgentError::Parse("no json".into())));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.code, "PARSE_ERROR");
    }

    #[test]
    fn test_provider_failure_code() {
        let (_, Json(body)) = agent_failure(&AdvisorError::Agent(AgentError::ProviderUnavailable("down".into())));
        assert_eq!(body.code, "MODEL_ERROR");
    }

    #[test]
    fn test_profile_flattened_into_request() {
        let request: RiskAnalysisRequest = serde_json::from_str(
            r#"{"user_id": "p1", "max_level": 30, "max_viplevel": 2, "num_event": 80, "event_list": ["login"]}"#,
        )
        .unwrap();

        assert_eq!(request.user_id, "p1");
        assert_eq!(request.profile.num_event, 80);
        assert_eq!(request.profile.event_list, vec!["login"]);
    }

    #[test]
    fn test_profile_numbers_optional_in_request() {
        let request: RiskAnalysisRequest =
            serde_json::from_str(r#"{"user_id": "p1", "event_list": ["login", "logout"]}"#).unwrap();

        assert_eq!(request.profile.num_event, 0);
        assert_eq!(request.profile.max_viplevel, 0);
    }
}
