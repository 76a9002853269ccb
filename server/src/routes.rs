//! Axum router and handlers.

use crate::auth::{AuthConfig, verify_token};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use taskforce_application::{DirectMessageUseCase, EndpointClient, RunTaskUseCase};
use taskforce_domain::{AgentIdentity, FailureKind, TaskResult};
use tracing::info;

/// Shared state accessible from handlers.
#[derive(Clone)]
pub struct AppState {
    pub run_task: Arc<RunTaskUseCase>,
    pub direct: Arc<DirectMessageUseCase>,
    pub client: Arc<dyn EndpointClient>,
    pub auth: Option<AuthConfig>,
}

/// `POST /chat` request payload.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// `pm` for full orchestration, `A`/`B`/`C` for the direct bypass.
    pub target: AgentIdentity,
    pub message: String,
    /// Optional sanity check: when present it must equal `target`.
    /// Sessions are keyed strictly by agent identity, so addressing one
    /// agent through another's session is rejected outright.
    #[serde(default)]
    pub session_hint: Option<AgentIdentity>,
}

/// `POST /assign` request payload (placeholder endpoint).
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    #[allow(dead_code)]
    pub description: String,
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/assign", post(assign_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Orchestrator ready");
    axum::serve(listener, router(state)).await
}

/// HTTP status for a finished task.
///
/// Structured failures still carry a full JSON body; the status code
/// reflects who is at fault: the caller (400), the upstream backends
/// (502) or this process (500).
fn status_for(result: &TaskResult) -> StatusCode {
    match result.failure() {
        None => StatusCode::OK,
        Some(failure) => match failure.kind {
            FailureKind::InvalidRequest => StatusCode::BAD_REQUEST,
            FailureKind::DecompositionFailed
            | FailureKind::EndpointUnreachable
            | FailureKind::AuthRejected
            | FailureKind::MalformedResponse => StatusCode::BAD_GATEWAY,
            FailureKind::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

/// POST /chat
async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Response {
    if let Err(rejection) = verify_token(&state.auth, &headers) {
        return rejection.into_response();
    }

    if request.message.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "message must not be empty").into_response();
    }
    if let Some(hint) = request.session_hint
        && hint != request.target
    {
        return (
            StatusCode::BAD_REQUEST,
            "session_hint must match target; sessions are per-agent",
        )
            .into_response();
    }

    info!(target = %request.target, "Processing inbound message");
    let result = match request.target {
        AgentIdentity::Pm => state.run_task.execute(&request.message, None).await,
        worker => state.direct.execute(worker, &request.message, None).await,
    };

    (status_for(&result), Json(result)).into_response()
}

/// POST /assign — placeholder for a future external assignment workflow.
async fn assign_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(_request): Json<AssignRequest>,
) -> Response {
    if let Err(rejection) = verify_token(&state.auth, &headers) {
        return rejection.into_response();
    }
    (
        StatusCode::NOT_IMPLEMENTED,
        "Assignment endpoint not implemented",
    )
        .into_response()
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Response {
    match state.client.probe(AgentIdentity::Pm).await {
        Ok(()) => Json(serde_json::json!({"status": "ok"})).into_response(),
        Err(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "degraded",
                "error": error.to_string(),
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use taskforce_application::{
        CarryMode, EndpointError, EndpointReply, NoTranscriptLogger, SessionStore,
    };
    use taskforce_domain::Turn;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    /// Mock endpoint client with per-identity scripted replies.
    struct MockClient {
        replies: Mutex<HashMap<AgentIdentity, Vec<Result<EndpointReply, EndpointError>>>>,
        pm_reachable: bool,
    }

    impl MockClient {
        fn new() -> Self {
            Self {
                replies: Mutex::new(HashMap::new()),
                pm_reachable: true,
            }
        }

        fn script(self, identity: AgentIdentity, reply: Result<EndpointReply, EndpointError>) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry(identity)
                .or_default()
                .push(reply);
            self
        }
    }

    #[async_trait]
    impl EndpointClient for MockClient {
        async fn send(
            &self,
            identity: AgentIdentity,
            _turns: &[Turn],
            _message: &str,
            _cancel: Option<&CancellationToken>,
        ) -> Result<EndpointReply, EndpointError> {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&identity) {
                Some(queue) if !queue.is_empty() => queue.remove(0),
                _ => Err(EndpointError::UnknownAgent(identity)),
            }
        }

        async fn probe(&self, _identity: AgentIdentity) -> Result<(), EndpointError> {
            if self.pm_reachable {
                Ok(())
            } else {
                Err(EndpointError::Transport("connection refused".into()))
            }
        }
    }

    fn app(client: MockClient, auth: Option<AuthConfig>) -> Router {
        let client: Arc<dyn EndpointClient> = Arc::new(client);
        let sessions = Arc::new(SessionStore::default());
        let transcript = Arc::new(NoTranscriptLogger);
        let state = AppState {
            run_task: Arc::new(RunTaskUseCase::new(
                client.clone(),
                sessions.clone(),
                transcript.clone(),
                CarryMode::default(),
            )),
            direct: Arc::new(DirectMessageUseCase::new(
                client.clone(),
                sessions,
                transcript,
            )),
            client,
            auth,
        };
        router(state)
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 100_000)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_ok() {
        let response = app(MockClient::new(), None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_health_degraded_when_pm_unreachable() {
        let mut client = MockClient::new();
        client.pm_reachable = false;
        let response = app(client, None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_chat_direct_worker() {
        let client = MockClient::new().script(
            AgentIdentity::WorkerA,
            Ok(EndpointReply::new("hello from A")),
        );
        let response = app(client, None)
            .oneshot(chat_request(
                serde_json::json!({"target": "A", "message": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["outputs"][0]["output"], "hello from A");
    }

    #[tokio::test]
    async fn test_chat_pm_runs_full_orchestration() {
        let plan = r#"{"subtasks": [
            {"assignee": "A", "instruction": "write a haiku"},
            {"assignee": "B", "instruction": "review the haiku"}
        ]}"#;
        let client = MockClient::new()
            .script(AgentIdentity::Pm, Ok(EndpointReply::new(plan)))
            .script(AgentIdentity::WorkerA, Ok(EndpointReply::new("a haiku")))
            .script(AgentIdentity::WorkerB, Ok(EndpointReply::new("a critique")));
        let response = app(client, None)
            .oneshot(chat_request(serde_json::json!({
                "target": "pm",
                "message": "Write and review a haiku"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["outputs"].as_array().unwrap().len(), 2);
        assert_eq!(body["outputs"][1]["output"], "a critique");
    }

    #[tokio::test]
    async fn test_chat_failed_decomposition_maps_to_bad_gateway() {
        let client = MockClient::new().script(
            AgentIdentity::Pm,
            Ok(EndpointReply::new("no plan here, just vibes")),
        );
        let response = app(client, None)
            .oneshot(chat_request(serde_json::json!({
                "target": "pm",
                "message": "do something"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["status"], "failed");
        assert_eq!(body["kind"], "decomposition_failed");
    }

    #[tokio::test]
    async fn test_chat_empty_message_rejected() {
        let response = app(MockClient::new(), None)
            .oneshot(chat_request(
                serde_json::json!({"target": "A", "message": "  "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_session_hint_mismatch_rejected() {
        let response = app(MockClient::new(), None)
            .oneshot(chat_request(serde_json::json!({
                "target": "A",
                "message": "hi",
                "session_hint": "B"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_assign_not_implemented() {
        let response = app(MockClient::new(), None)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/assign")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"description": "future work"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_auth_required_when_configured() {
        // SAFETY: test-local variable name.
        unsafe { std::env::set_var("TASKFORCE_TEST_ROUTE_TOKEN", "open-sesame") };
        let auth = Some(AuthConfig::new("TASKFORCE_TEST_ROUTE_TOKEN"));

        let client =
            MockClient::new().script(AgentIdentity::WorkerA, Ok(EndpointReply::new("ok")));
        let app = app(client, auth);

        let denied = app
            .clone()
            .oneshot(chat_request(
                serde_json::json!({"target": "A", "message": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .header("authorization", "Bearer open-sesame")
                    .body(Body::from(
                        serde_json::json!({"target": "A", "message": "hi"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_skips_auth() {
        let auth = Some(AuthConfig::new("TASKFORCE_TEST_UNSET_ROUTE_TOKEN"));
        let response = app(MockClient::new(), auth)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
