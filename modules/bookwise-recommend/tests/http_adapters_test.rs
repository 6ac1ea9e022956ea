//! Adapter tests against local fake servers: the books API for HttpCatalog
//! and the Messages API for ClaudeInvoker. No external network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use bookwise_common::{ModelSettings, PipelineLimits, RecommendationQuery, ResponseFormat};
use bookwise_recommend::{
    CatalogReader, ClaudeInvoker, HttpCatalog, InvokeError, RecommendationPipeline, TextModel,
};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn settings(timeout: Duration) -> ModelSettings {
    ModelSettings {
        timeout,
        ..ModelSettings::default()
    }
}

fn books_router() -> Router {
    Router::new().route(
        "/getBooks",
        get(|| async {
            Json(json!({
                "response": {
                    "Items": [
                        {"id": "4", "title": "Gone Girl", "author": "Gillian Flynn", "genre": "Mystery", "rating": 4.1}
                    ],
                    "Count": 1
                }
            }))
        }),
    )
}

fn messages_reply(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 120, "output_tokens": 40}
    })
}

// ---------------------------------------------------------------------------
// HttpCatalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_catalog_reads_scan_envelope() {
    let base = serve(books_router()).await;
    let catalog = HttpCatalog::new(&base, Duration::from_secs(5));

    let items = catalog.list_available().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Gone Girl");
    assert_eq!(items[0].genre, "Mystery");
}

#[tokio::test]
async fn http_catalog_error_status_is_a_failure() {
    let router = Router::new().route(
        "/getBooks",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let base = serve(router).await;
    let catalog = HttpCatalog::new(&base, Duration::from_secs(5));

    let err = catalog.list_available().await.unwrap_err();

    assert!(err.to_string().contains("502"));
}

// ---------------------------------------------------------------------------
// ClaudeInvoker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invoker_sends_settings_and_returns_text() {
    let received: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let router = Router::new()
        .route(
            "/v1/messages",
            post(
                |State(received): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *received.lock().unwrap() = Some(body);
                    Json(messages_reply("{\"recommendations\": []}"))
                },
            ),
        )
        .with_state(received.clone());
    let base = serve(router).await;
    let invoker = ClaudeInvoker::new("sk-ant-test", &settings(Duration::from_secs(5)))
        .with_base_url(format!("{base}/v1"));

    let text = invoker.invoke("recommend something").await.unwrap();

    assert_eq!(text, "{\"recommendations\": []}");
    let body = received.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "claude-3-haiku-20240307");
    assert_eq!(body["max_tokens"], 1000);
    assert_eq!(body["temperature"], 0.0);
    assert_eq!(body["messages"][0]["content"], "recommend something");
    assert!(body["system"].as_str().unwrap().contains("JSON"));
}

#[tokio::test]
async fn text_format_sends_no_json_instruction() {
    let received: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let router = Router::new()
        .route(
            "/v1/messages",
            post(
                |State(received): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *received.lock().unwrap() = Some(body);
                    Json(messages_reply("ok"))
                },
            ),
        )
        .with_state(received.clone());
    let base = serve(router).await;
    let settings = ModelSettings {
        response_format: ResponseFormat::Text,
        ..ModelSettings::default()
    };
    let invoker = ClaudeInvoker::new("sk-ant-test", &settings).with_base_url(format!("{base}/v1"));

    invoker.invoke("hello").await.unwrap();

    let body = received.lock().unwrap().clone().unwrap();
    assert!(body.get("system").is_none());
}

#[tokio::test]
async fn forbidden_is_access_denied() {
    let router = Router::new().route(
        "/v1/messages",
        post(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({"type": "error", "error": {"type": "permission_error", "message": "model access not enabled"}})),
            )
        }),
    );
    let base = serve(router).await;
    let invoker = ClaudeInvoker::new("sk-ant-test", &settings(Duration::from_secs(5)))
        .with_base_url(format!("{base}/v1"));

    let err = invoker.invoke("p").await.unwrap_err();

    assert_eq!(err, InvokeError::AccessDenied("model access not enabled".to_string()));
}

#[tokio::test]
async fn throttling_is_rate_limited_with_retry_after() {
    let router = Router::new().route(
        "/v1/messages",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, "17")],
                Json(json!({"type": "error", "error": {"type": "rate_limit_error", "message": "slow down"}})),
            )
                .into_response()
        }),
    );
    let base = serve(router).await;
    let invoker = ClaudeInvoker::new("sk-ant-test", &settings(Duration::from_secs(5)))
        .with_base_url(format!("{base}/v1"));

    let err = invoker.invoke("p").await.unwrap_err();

    assert_eq!(err, InvokeError::RateLimited { retry_after: Some(17) });
}

#[tokio::test]
async fn slow_model_times_out_as_upstream_error() {
    let router = Router::new().route(
        "/v1/messages",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(messages_reply("too late"))
        }),
    );
    let base = serve(router).await;
    let invoker = ClaudeInvoker::new("sk-ant-test", &settings(Duration::from_millis(200)))
        .with_base_url(format!("{base}/v1"));

    let err = invoker.invoke("p").await.unwrap_err();

    assert!(matches!(err, InvokeError::Upstream(_)));
}

// ---------------------------------------------------------------------------
// Full stack over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pipeline_over_real_adapters() {
    let books = serve(books_router()).await;
    let model = serve(Router::new().route(
        "/v1/messages",
        post(|| async {
            Json(messages_reply(
                "```json\n{\"recommendations\": [{\"title\": \"Gone Girl\", \"author\": \"Gillian Flynn\", \"reason\": \"Unreliable narrators.\", \"confidence\": 0.9}]}\n```",
            ))
        }),
    ))
    .await;

    let pipeline = RecommendationPipeline::new(
        Arc::new(HttpCatalog::new(&books, Duration::from_secs(5))),
        Arc::new(
            ClaudeInvoker::new("sk-ant-test", &settings(Duration::from_secs(5)))
                .with_base_url(format!("{model}/v1")),
        ),
        PipelineLimits::default(),
    );

    let result = pipeline
        .recommend(&RecommendationQuery::new("mystery with unreliable narrator", "user-1"))
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.recommendations[0].title, "Gone Girl");
    assert_eq!(result.recommendations[0].author, "Gillian Flynn");
}
