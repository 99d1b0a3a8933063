//! Integration tests for the RAG client and the chat session turn loop.
//! Uses a minimal in-process HTTP server (axum) that records every request. No mocks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use med_qa_client::{
    ChatSession, ClientError, Config, Consult, QueryType, RagClient, TurnOutcome,
};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    path: String,
    content_type: Option<String>,
    body: serde_json::Value,
}

type Log = Arc<Mutex<Vec<Captured>>>;

/// Spawn a server answering every request with `status` and `body`.
async fn spawn_server(status: StatusCode, body: &'static str) -> (String, Log) {
    spawn_server_with_delay(status, body, Duration::ZERO).await
}

async fn spawn_server_with_delay(
    status: StatusCode,
    body: &'static str,
    delay: Duration,
) -> (String, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = log.clone();
    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, raw: String| {
            let log = log_clone.clone();
            async move {
                log.lock().unwrap().push(Captured {
                    method,
                    path: uri.path().to_string(),
                    content_type: headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body: serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null),
                });
                tokio::time::sleep(delay).await;
                (status, [("content-type", "application/json")], body)
            }
        },
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://127.0.0.1:{}", port), log)
}

fn client(base_url: &str) -> RagClient {
    let mut cfg = Config::default();
    cfg.api.base_url = Some(base_url.into());
    cfg.api.llm_model = Some("test-llm".into());
    cfg.api.embedding_model = Some("test-embed".into());
    RagClient::new(cfg.resolved()).unwrap()
}

const OK_BODY: &str = r#"{"response":"X","background_knowledge":"Y"}"#;

#[tokio::test]
async fn agent_turn_posts_to_agent_endpoint_with_empty_history() {
    let (url, log) = spawn_server(StatusCode::OK, OK_BODY).await;
    let client = client(&url);

    let mut session = ChatSession::default();
    session.select_query_type(QueryType::Agent).unwrap();
    session.set_input("我想知道我是否有心力衰竭？");
    let outcome = session.run_turn(&client).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Answered);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].method, Method::POST);
    assert_eq!(log[0].path, "/rag_agent/test-llm/test-embed");
    assert_eq!(log[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        log[0].body,
        serde_json::json!({"input": "我想知道我是否有心力衰竭？", "history": []})
    );
}

#[tokio::test]
async fn second_turn_sends_prior_texts_in_order() {
    let (url, log) = spawn_server(StatusCode::OK, OK_BODY).await;
    let client = client(&url);

    let mut session = ChatSession::default();
    session.set_input("请问高血压应该注意吃什么？");
    session.run_turn(&client).await.unwrap();
    session.set_input("还有呢？");
    session.run_turn(&client).await.unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].path, "/rag_qa/test-llm/test-embed");
    assert_eq!(
        log[1].body,
        serde_json::json!({"input": "还有呢？", "history": ["请问高血压应该注意吃什么？", "X"]})
    );

    let texts = session.conversation().history();
    assert_eq!(texts, vec!["请问高血压应该注意吃什么？", "X", "还有呢？", "X"]);
    assert_eq!(session.conversation().knowledge(), "Y");
}

#[tokio::test]
async fn server_error_surfaces_alert_and_no_reply() {
    let (url, _log) = spawn_server(StatusCode::INTERNAL_SERVER_ERROR, "{}").await;
    let client = client(&url);

    let err = client.consult("q", &[], QueryType::Qa).await.unwrap_err();
    assert!(matches!(err, ClientError::Status(s) if s.as_u16() == 500));

    let mut session = ChatSession::default();
    session.set_input("q");
    let outcome = session.run_turn(&client).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(session.conversation().len(), 1);
    assert!(!session.is_thinking());
    assert!(session.alert().is_some());
}

#[tokio::test]
async fn risk_mode_never_reaches_the_server() {
    let (url, log) = spawn_server(StatusCode::OK, OK_BODY).await;
    let client = client(&url);

    let err = client.consult("q", &[], QueryType::Risk).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidMode(QueryType::Risk)));

    let mut session = ChatSession::default();
    session.apply_template(2).unwrap();
    assert!(session.run_turn(&client).await.is_err());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn reply_without_response_field_is_malformed() {
    let (url, _log) = spawn_server(StatusCode::OK, r#"{"background_knowledge":"k"}"#).await;
    let err = client(&url)
        .consult("q", &[], QueryType::Qa)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let (url, _log) = spawn_server(StatusCode::OK, "<html>oops</html>").await;
    let err = client(&url)
        .consult("q", &[], QueryType::Qa)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[tokio::test]
async fn stalled_backend_times_out() {
    let (url, _log) =
        spawn_server_with_delay(StatusCode::OK, OK_BODY, Duration::from_secs(5)).await;
    let mut cfg = Config::default();
    cfg.api.base_url = Some(url);
    cfg.api.timeout_secs = Some(1);
    let client = RagClient::new(cfg.resolved()).unwrap();

    let err = client.consult("q", &[], QueryType::Qa).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(d) if d == Duration::from_secs(1)));
}
