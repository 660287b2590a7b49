//! Everything that happens before the first prompt: connectivity gate, catalog and
//! initial model selection. Shared by the full-screen interface and line mode.

use olla_core::catalog::ModelCatalog;
use olla_core::connectivity::{self, Gate};
use olla_core::diag::Diagnostic;
use olla_core::llm::ModelClient;
use tracing::{info, warn};

use crate::strings::model_fallback;

#[derive(Debug)]
pub struct Startup {
    pub notices: Vec<Diagnostic>,
    pub catalog: ModelCatalog,
    pub selected: Option<String>,
}

/// Probe the server and load the catalog. `Err` carries the diagnostics of a halted gate.
pub async fn run<C: ModelClient>(
    client: &C,
    preferred: Option<&str>,
) -> Result<Startup, Vec<Diagnostic>> {
    let mut notices = match connectivity::check(client).await {
        Gate::Halt(d) => {
            warn!(target: "tui", "startup halted: server unreachable");
            return Err(d);
        }
        Gate::Proceed(d) => d,
    };
    let catalog = ModelCatalog::load(client, &mut notices).await;
    let selected = catalog.choose(preferred);
    if let (Some(wanted), Some(using)) = (preferred, selected.as_deref()) {
        if wanted != using {
            notices.push(Diagnostic::warning(model_fallback(wanted, using)));
        }
    }
    info!(target: "tui", "startup: {} models, selected={:?}", catalog.len(), selected);
    Ok(Startup {
        notices,
        catalog,
        selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use olla_core::diag::Level;
    use olla_providers::{OllamaClient, OllamaConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with(models: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Ollama is running"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(models))
            .mount(&server)
            .await;
        server
    }

    fn client(uri: String) -> OllamaClient {
        let cfg = OllamaConfig::default().with_overrides(Some(uri), None).unwrap();
        OllamaClient::new(cfg).unwrap()
    }

    #[tokio::test]
    async fn preferred_model_is_used_when_installed() {
        let server = server_with(serde_json::json!({
            "models": [{"name": "llama3:latest"}, {"name": "qwen2:7b"}]
        }))
        .await;
        let s = run(&client(server.uri()), Some("qwen2:7b")).await.unwrap();
        assert_eq!(s.selected.as_deref(), Some("qwen2:7b"));
        assert_eq!(s.notices.len(), 1);
        assert_eq!(s.notices[0].level, Level::Success);
    }

    #[tokio::test]
    async fn missing_preference_falls_back_to_first() {
        let server = server_with(serde_json::json!({
            "models": [{"name": "llama3:latest"}]
        }))
        .await;
        let s = run(&client(server.uri()), Some("mistral")).await.unwrap();
        assert_eq!(s.selected.as_deref(), Some("llama3:latest"));
        let last = s.notices.last().unwrap();
        assert_eq!(last.level, Level::Warning);
        assert!(last.text.contains("mistral"));
    }

    #[tokio::test]
    async fn empty_catalog_selects_nothing() {
        let server = server_with(serde_json::json!({"models": []})).await;
        let s = run(&client(server.uri()), None).await.unwrap();
        assert_eq!(s.selected, None);
        assert!(s.notices.iter().any(|d| d.text.contains("No models found")));
    }

    #[tokio::test]
    async fn unreachable_server_halts() {
        let uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };
        let diags = run(&client(uri.clone()), None).await.unwrap_err();
        assert!(diags[0].text.contains(&uri));
        assert_eq!(diags[0].level, Level::Error);
    }
}
