//! HTTP handlers for the agent API.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::response::Sse;
use axum::response::sse::{Event as SseEvent, KeepAlive};
use futures_util::future;
use futures_util::stream::{Stream, StreamExt};
use rand::seq::IndexedRandom;
use serde_json::{Value, json};

use crate::auth::{AuthError, verify_token};
use crate::event_bus::STREAM_END_SCOPE;
use crate::server::SharedState;
use crate::server::dto::RunAgentInput;
use crate::server::error::ApiError;

/// Greeting lines served by `GET /greetings`.
pub const GREETINGS: [&str; 10] = [
    "こんにちは、今日もがんばりましょう",
    "好きな料理はなんですか？",
    "いい天気ですね！",
    "最近なにかおもしろいことありました？",
    "お元気ですか？",
    "今日のご予定は？",
    "コーヒーでも飲みませんか？",
    "素敵な一日になりますように",
    "何かお手伝いできることはありますか？",
    "今日も一日お疲れさまです",
];

/// `GET /health`.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// `GET /copilotkit/{agent_name}/health`.
pub async fn agent_health(
    State(state): State<SharedState>,
    Path(agent_name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let agent = state
        .registry
        .get(&agent_name)
        .ok_or_else(|| ApiError::AgentNotFound(agent_name.clone()))?;
    Ok(Json(json!({
        "status": "ok",
        "agent": {"name": agent.name},
    })))
}

/// `GET /copilotkit/agents`.
pub async fn list_agents(State(state): State<SharedState>) -> Json<Value> {
    let agents: Vec<Value> = state
        .registry
        .agents()
        .iter()
        .map(|agent| json!({"name": agent.name, "description": agent.description}))
        .collect();
    Json(json!({"agents": agents}))
}

/// `GET /greetings`.
pub async fn greetings() -> Json<Value> {
    let message = GREETINGS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(GREETINGS[0]);
    Json(json!({"message": message}))
}

/// `POST /copilotkit/{agent_name}`.
///
/// Resolves the agent, verifies the bearer token, loads the caller's
/// profile, and streams the run's events back as SSE. The last event is a
/// stream-end diagnostic; clients stop reading there. Dropping the
/// response (client disconnect) aborts the run.
pub async fn run_agent(
    State(state): State<SharedState>,
    Path(agent_name): Path<String>,
    headers: HeaderMap,
    Json(input): Json<RunAgentInput>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let agent = state
        .registry
        .get(&agent_name)
        .ok_or_else(|| ApiError::AgentNotFound(agent_name.clone()))?;

    let token = bearer_token(&headers).ok_or(AuthError::Invalid)?;
    let user_id = verify_token(token, &state.settings.jwt_secret)?;

    let profile = state
        .store
        .fetch_profile(&user_id)
        .await?
        .map(|profile| profile.to_value())
        .unwrap_or(Value::Null);

    tracing::info!(
        agent = %agent_name,
        user = %user_id,
        messages = input.messages.len(),
        "starting agent run"
    );

    let initial_state = input.into_initial_state(&user_id, profile);
    let (invocation, events) = agent.graph.invoke_streaming(initial_state).await;

    // The invocation handle rides along in the scan state so dropping the
    // SSE stream aborts the run.
    let stream = events
        .into_async_stream()
        .scan((invocation, false), |(_invocation, done), event| {
            if *done {
                return future::ready(None);
            }
            if event.scope_label() == Some(STREAM_END_SCOPE) {
                *done = true;
            }
            let sse = SseEvent::default().data(event.to_json_value().to_string());
            future::ready(Some(Ok::<_, Infallible>(sse)))
        });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

/// Extract a bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_strips_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_or_malformed_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn greetings_pool_is_the_expected_size() {
        assert_eq!(GREETINGS.len(), 10);
        assert!(GREETINGS.contains(&"いい天気ですね！"));
    }
}
