use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use shoe_core::{Agent, Runner};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{ApiError, ChatRequest, ChatResponse, HealthResponse};

// Built once in main; every request gets a cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<Runner>,
    pub agent: Arc<Agent>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- HANDLERS ---

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        agent: state.agent.name().to_string(),
    })
}

// Body: { "question": "user message" } -> { "answer": "agent reply" }
async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatResponse>, ApiError> {
    let request = ChatRequest::from_body(&body);
    let question = request.question().ok_or(ApiError::MissingQuestion)?;

    info!("Question for '{}' ({} chars)", state.agent.name(), question.len());
    let result = state.runner.run(&state.agent, question).await?;

    Ok(Json(ChatResponse {
        answer: result.final_output,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::shoe_brand_agent;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use shoe_core::test_support::{brain_for, text_completion, tool_call_completion, NoToolResults};
    use shoe_core::{Brain, BrainConfig};
    use shoe_tools::FaqLookup;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{body_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Binds a port and releases it, so nothing is listening there.
    fn dead_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    }

    fn app(brain: Brain, faq_url: &str, faq_timeout: Duration) -> Router {
        let faq = FaqLookup::new(faq_url, faq_timeout).unwrap();
        router(AppState {
            runner: Arc::new(Runner::new(Arc::new(brain))),
            agent: Arc::new(shoe_brand_agent(faq)),
        })
    }

    fn offline_app() -> Router {
        let dead = dead_url();
        let brain = Brain::new(BrainConfig {
            api_key: "test-key".to_string(),
            model: "gpt-test".to_string(),
            api_base: Some(dead.clone()),
        });
        app(brain, &format!("{dead}/lookup"), Duration::from_secs(1))
    }

    fn post_chat(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn as_json(body: &[u8]) -> Value {
        serde_json::from_slice(body).expect("response should be JSON")
    }

    async fn mount_faq_tool_call(backend: &MockServer, question: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(NoToolResults)
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_completion(
                "call_faq",
                "lookup_faq",
                json!({ "question": question }),
            )))
            .mount(backend)
            .await;
    }

    #[tokio::test]
    async fn health_reports_agent_without_touching_dependencies() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(offline_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body), json!({ "status": "ok", "agent": "Shoe Brand Agent" }));
    }

    #[tokio::test]
    async fn chat_rejects_missing_or_blank_question() {
        let bodies = [
            Body::from(r#"{}"#),
            Body::from(r#"{"question": ""}"#),
            Body::from(r#"{"question": "  \t "}"#),
            Body::from(r#"{"question": 7}"#),
            Body::from("not json"),
            Body::empty(),
        ];

        for body in bodies {
            let (status, body) = send(offline_app(), post_chat(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(as_json(&body), json!({ "error": "Missing 'question'" }));
        }
    }

    #[tokio::test]
    async fn chat_answers_directly_when_no_tool_is_needed() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains(r#""content":"Hi!""#))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_completion("Hello! How can I help with your shoes?")),
            )
            .expect(1)
            .mount(&backend)
            .await;
        let faq = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&faq)
            .await;

        let app = app(
            brain_for(&backend),
            &format!("{}/lookup", faq.uri()),
            Duration::from_secs(12),
        );
        let (status, body) = send(app, post_chat(r#"{"question": "  Hi!  "}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            as_json(&body),
            json!({ "answer": "Hello! How can I help with your shoes?" })
        );
    }

    #[tokio::test]
    async fn chat_routes_faq_answer_through_the_agent() {
        let backend = MockServer::start().await;
        mount_faq_tool_call(&backend, "return policy").await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("call_faq"))
            .and(body_string_contains("Returns accepted within 30 days."))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_completion(
                "Returns accepted within 30 days. Just keep the box!",
            )))
            .expect(1)
            .mount(&backend)
            .await;

        let faq = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .and(body_json(json!({ "question": "return policy" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "answer": "Returns accepted within 30 days." })),
            )
            .expect(1)
            .mount(&faq)
            .await;

        let app = app(
            brain_for(&backend),
            &format!("{}/lookup", faq.uri()),
            Duration::from_secs(12),
        );
        let (status, body) =
            send(app, post_chat(r#"{"question": "Can I return my sneakers?"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        let answer = as_json(&body)["answer"].as_str().unwrap().to_string();
        assert!(answer.contains("Returns accepted within 30 days."));
    }

    #[tokio::test]
    async fn chat_passes_default_answer_to_the_model() {
        let backend = MockServer::start().await;
        mount_faq_tool_call(&backend, "gift cards").await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("No matching answer found."))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_completion("I couldn't find that in our FAQ.")),
            )
            .expect(1)
            .mount(&backend)
            .await;

        let faq = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&faq)
            .await;

        let app = app(
            brain_for(&backend),
            &format!("{}/lookup", faq.uri()),
            Duration::from_secs(12),
        );
        let (status, body) = send(app, post_chat(r#"{"question": "Gift cards?"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body), json!({ "answer": "I couldn't find that in our FAQ." }));
    }

    #[tokio::test]
    async fn chat_fails_when_faq_service_errors() {
        let backend = MockServer::start().await;
        mount_faq_tool_call(&backend, "shipping").await;

        let faq = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&faq)
            .await;

        let app = app(
            brain_for(&backend),
            &format!("{}/lookup", faq.uri()),
            Duration::from_secs(12),
        );
        let (status, body) = send(app, post_chat(r#"{"question": "How long is shipping?"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(serde_json::from_slice::<Value>(&body).is_err());
    }

    #[tokio::test]
    async fn chat_fails_fast_when_faq_service_hangs() {
        let backend = MockServer::start().await;
        mount_faq_tool_call(&backend, "sizes").await;

        let faq = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "answer": "too late" }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&faq)
            .await;

        let app = app(
            brain_for(&backend),
            &format!("{}/lookup", faq.uri()),
            Duration::from_millis(200),
        );
        let started = std::time::Instant::now();
        let (status, _) = send(app, post_chat(r#"{"question": "Do you carry size 15?"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn chat_fails_when_faq_service_is_unreachable() {
        let backend = MockServer::start().await;
        mount_faq_tool_call(&backend, "stores").await;

        let app = app(
            brain_for(&backend),
            &format!("{}/lookup", dead_url()),
            Duration::from_secs(1),
        );
        let (status, _) = send(app, post_chat(r#"{"question": "Where are your stores?"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
