//! The authenticated ask endpoint.
//!
//! `POST /ask` — body `{ "question": string, "mode": "SIMPLE"|"VERBOSE" }`.
//! The authenticated principal arrives in the `x-principal` header, injected
//! by the identity layer in front of this service; callers cannot choose it.
//! The response is always a JSON answer string: backend answer, placeholder,
//! feedback acknowledgement, or rate-limit message.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use phoenix_agent::AskRuntime;
use phoenix_core::{AnswerMode, Principal, RequestError};

/// Header populated by the identity layer with the authenticated principal.
pub const PRINCIPAL_HEADER: &str = "x-principal";

#[derive(Clone)]
pub struct AskState {
    pub runtime: Arc<AskRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub mode: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AskErrorBody {
    pub error: String,
}

pub fn router(runtime: Arc<AskRuntime>) -> Router {
    Router::new().route("/ask", post(ask)).with_state(AskState { runtime })
}

pub async fn ask(
    State(state): State<AskState>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, Json<AskErrorBody>)> {
    let principal = principal_from_headers(&headers)?;

    let mode: AnswerMode = request.mode.parse().map_err(bad_request)?;

    info!(
        event_name = "server.ask.received",
        principal = %principal.0,
        mode = mode.as_str(),
        "ask request received"
    );

    let answer =
        state.runtime.ask(&principal, &request.question, mode).await.map_err(bad_request)?;

    Ok(Json(AskResponse { answer }))
}

fn principal_from_headers(
    headers: &HeaderMap,
) -> Result<Principal, (StatusCode, Json<AskErrorBody>)> {
    let value = headers
        .get(PRINCIPAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if value.is_empty() {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(AskErrorBody { error: "missing authenticated principal".to_string() }),
        ));
    }

    Ok(Principal(value.to_string()))
}

fn bad_request(error: RequestError) -> (StatusCode, Json<AskErrorBody>) {
    (StatusCode::BAD_REQUEST, Json(AskErrorBody { error: error.to_string() }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use phoenix_agent::{
        AgentDispatcher, AskRuntime, HttpAgentBackend, NoPause, PLACEHOLDER_ANSWER,
        RATE_LIMITED_ANSWER,
    };
    use phoenix_core::config::BackendConfig;
    use phoenix_core::{keys, StaticSettings};
    use phoenix_db::InMemoryAccessLedger;

    use super::{router, PRINCIPAL_HEADER};

    fn backend_config() -> BackendConfig {
        BackendConfig {
            base_url: "http://localhost:9090".to_string(),
            api_key: None,
            timeout_secs: 5,
            request_timeout_secs: 10,
            disabled_delay_min_ms: 0,
            disabled_delay_max_ms: 0,
        }
    }

    /// Disabled-backend runtime: the HTTP client is constructed but never
    /// called, so no listener is needed.
    fn runtime(max_count: &str) -> Arc<AskRuntime> {
        let settings = Arc::new(
            StaticSettings::default()
                .with(keys::RATE_WINDOW_MINUTES, "1")
                .with(keys::RATE_MAX_COUNT, max_count)
                .with(keys::BACKEND_ENABLED, "FALSE"),
        );
        let backend =
            Arc::new(HttpAgentBackend::new(&backend_config()).expect("build http client"));
        let dispatcher =
            AgentDispatcher::new(backend, settings.clone(), Arc::new(NoPause), &backend_config());
        Arc::new(AskRuntime::new(
            settings,
            Arc::new(InMemoryAccessLedger::default()),
            dispatcher,
            Arc::new(NoPause),
            Duration::from_secs(1),
        ))
    }

    fn ask_request(principal: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::post("/ask").header("content-type", "application/json");
        if let Some(principal) = principal {
            builder = builder.header(PRINCIPAL_HEADER, principal);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    #[tokio::test]
    async fn ask_returns_the_placeholder_when_the_backend_is_disabled() {
        let app = router(runtime("4"));

        let response = app
            .oneshot(ask_request(Some("alice"), r#"{"question":"What is X?","mode":"SIMPLE"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["answer"], PLACEHOLDER_ANSWER);
    }

    #[tokio::test]
    async fn ask_without_a_principal_is_unauthorized() {
        let app = router(runtime("4"));

        let response = app
            .oneshot(ask_request(None, r#"{"question":"What is X?","mode":"SIMPLE"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn ask_with_an_unknown_mode_is_a_bad_request() {
        let app = router(runtime("4"));

        let response = app
            .oneshot(ask_request(Some("alice"), r#"{"question":"What is X?","mode":"TERSE"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert!(payload["error"].as_str().unwrap_or_default().contains("TERSE"));
    }

    #[tokio::test]
    async fn ask_with_a_blank_question_is_a_bad_request() {
        let app = router(runtime("4"));

        let response = app
            .oneshot(ask_request(Some("alice"), r#"{"question":"   ","mode":"SIMPLE"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn second_question_over_the_limit_gets_the_rate_limit_message() {
        let app = router(runtime("1"));

        let first = app
            .clone()
            .oneshot(ask_request(Some("alice"), r#"{"question":"first","mode":"SIMPLE"}"#))
            .await
            .expect("response");
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(ask_request(Some("alice"), r#"{"question":"second","mode":"SIMPLE"}"#))
            .await
            .expect("response");

        assert_eq!(second.status(), StatusCode::OK);
        let body = to_bytes(second.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["answer"], RATE_LIMITED_ANSWER);
    }
}
