//! Integration tests for the Ollama client using wiremock.

use futures::StreamExt;
use olla_core::catalog::ModelCatalog;
use olla_core::connectivity::{self, Gate};
use olla_core::llm::{ChatDelta, ChatError, ChatOpts, Message, ModelClient};
use olla_core::diag::Diagnostic;
use olla_core::session::{ChatSession, TurnSink};
use olla_providers::{OllamaClient, OllamaConfig};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OllamaClient {
    let cfg = OllamaConfig::default()
        .with_overrides(Some(server.uri()), None)
        .expect("mock uri is a valid base url");
    OllamaClient::new(cfg).expect("client builds")
}

fn ndjson(lines: &[&str]) -> String {
    let mut s = lines.join("\n");
    s.push('\n');
    s
}

#[derive(Default)]
struct Recorder {
    partials: Vec<String>,
    diags: Vec<Diagnostic>,
}

impl TurnSink for Recorder {
    fn on_partial(&mut self, accumulated: &str) {
        self.partials.push(accumulated.to_string());
    }
    fn on_diagnostic(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }
}

#[tokio::test]
async fn probe_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Ollama is running"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let st = client.probe().await.expect("probe ok");
    assert_eq!(st.status, 200);
    assert!(!connectivity::check(&client).await.is_halt());
}

#[tokio::test]
async fn probe_non_200_still_proceeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gate = connectivity::check(&client_for(&server)).await;
    match gate {
        Gate::Proceed(d) => assert!(d[0].text.contains("500")),
        Gate::Halt(_) => panic!("a reachable server must not halt startup"),
    }
}

#[tokio::test]
async fn probe_refused_halts() {
    // Grab a free port and release it so nothing is listening there.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let cfg = OllamaConfig::default().with_overrides(Some(uri), None).unwrap();
    let client = OllamaClient::new(cfg).unwrap();

    let err = client.probe().await.unwrap_err();
    assert!(matches!(err, ChatError::Connection { .. }), "got {err:?}");
    assert!(connectivity::check(&client).await.is_halt());
}

#[tokio::test]
async fn list_models_single_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"models": [{"name": "llama3:latest"}]})),
        )
        .mount(&server)
        .await;

    let models = client_for(&server).list_models().await.unwrap();
    assert_eq!(models, vec!["llama3:latest".to_string()]);
}

#[tokio::test]
async fn list_models_preserves_order_and_ignores_extra_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [
                {"name": "qwen2:7b", "size": 4431400262_u64, "digest": "abc"},
                {"name": "llama3:latest", "modified_at": "2024-05-01T10:00:00Z"},
                {"name": "codellama:13b"}
            ]
        })))
        .mount(&server)
        .await;

    let models = client_for(&server).list_models().await.unwrap();
    assert_eq!(models, vec!["qwen2:7b", "llama3:latest", "codellama:13b"]);
}

#[tokio::test]
async fn list_models_missing_key_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    assert!(client_for(&server).list_models().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_models_invalid_json_is_malformed_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.list_models().await.unwrap_err();
    assert_eq!(
        err,
        ChatError::MalformedResponse {
            body: "<html>proxy error</html>".into()
        }
    );

    let mut diags = Vec::new();
    let cat = ModelCatalog::load(&client, &mut diags).await;
    assert!(cat.is_empty());
    assert!(diags.iter().any(|d| d.text == "<html>proxy error</html>"));
}

#[tokio::test]
async fn list_models_http_error_is_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503).set_body_string("loading"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_models().await.unwrap_err();
    assert_eq!(
        err,
        ChatError::Status {
            status: 503,
            body: "loading".into()
        }
    );
}

#[tokio::test]
async fn generate_sends_streaming_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({
            "model": "llama3:latest",
            "prompt": "hello",
            "stream": true
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(ndjson(&[r#"{"response":"Hi","done":false}"#, r#"{"done":true}"#])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let deltas: Vec<_> = client
        .stream_generate(
            ChatOpts {
                model: "llama3:latest".into(),
            },
            "hello".into(),
        )
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(
        deltas,
        vec![Ok(ChatDelta::Text("Hi".into())), Ok(ChatDelta::Finish)]
    );
}

#[tokio::test]
async fn hello_turn_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(&[
            r#"{"model":"llama3:latest","response":"Hi","done":false}"#,
            r#"{"model":"llama3:latest","response":" there","done":false}"#,
            r#"{"model":"llama3:latest","response":"","done":true,"eval_count":2}"#,
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = ChatSession::new(Some("llama3:latest".into()));
    let mut rec = Recorder::default();
    session.exchange(&client, "hello", &mut rec).await.unwrap();

    assert_eq!(
        session.transcript().messages(),
        &[Message::user("hello"), Message::assistant("Hi there")]
    );
    assert_eq!(rec.partials, vec!["Hi", "Hi there"]);
    assert!(rec.diags.is_empty());
}

#[tokio::test]
async fn malformed_fragment_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(&[
            r#"{"response":"a"}"#,
            r#"{"response": tru"#,
            r#"{"response":"b"}"#,
            r#"{"done":true}"#,
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = ChatSession::new(Some("m".into()));
    let mut rec = Recorder::default();
    let reply = session.exchange(&client, "x", &mut rec).await.unwrap();
    assert_eq!(reply.unwrap().content, "ab");
    assert_eq!(rec.diags.len(), 1);
    assert!(rec.diags[0].text.contains("Skipping invalid JSON line"));
}

#[tokio::test]
async fn unknown_model_fails_turn_without_assistant_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"error": "model 'ghost' not found"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = ChatSession::new(Some("ghost".into()));
    let mut rec = Recorder::default();
    let reply = session.exchange(&client, "boo", &mut rec).await.unwrap();
    assert_eq!(reply, None);
    assert_eq!(session.transcript().messages(), &[Message::user("boo")]);
    assert!(rec.diags.iter().any(|d| d.text.contains("404")));
}

#[tokio::test]
async fn only_done_marker_yields_no_assistant_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(&[r#"{"done":true}"#])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = ChatSession::new(Some("m".into()));
    let mut rec = Recorder::default();
    assert_eq!(session.exchange(&client, "x", &mut rec).await, Ok(None));
    assert_eq!(session.transcript().len(), 1);
}
