use tracing::{info, warn};

use crate::diag::Diagnostic;
use crate::llm::{ChatError, ModelClient};

/// Models installed on the server, in the order the server listed them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    models: Vec<String>,
}

impl ModelCatalog {
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }

    /// Query the server. Never fails: problems become diagnostics and an empty catalog.
    pub async fn load<C: ModelClient>(client: &C, diags: &mut Vec<Diagnostic>) -> Self {
        match client.list_models().await {
            Ok(models) => {
                info!(target: "core::catalog", "{} models available", models.len());
                let cat = Self { models };
                if cat.is_empty() {
                    diags.push(Self::empty_warning());
                }
                cat
            }
            Err(ChatError::MalformedResponse { body }) => {
                warn!(target: "core::catalog", "undecodable tags body ({} bytes)", body.len());
                diags.push(Diagnostic::error(
                    "Error decoding the response from Ollama API. Response was:",
                ));
                diags.push(Diagnostic::error(body));
                diags.push(Self::empty_warning());
                Self::default()
            }
            Err(e) => {
                warn!(target: "core::catalog", "listing models failed: {}", e);
                diags.push(Diagnostic::error(format!(
                    "Error connecting to Ollama API: {}",
                    e
                )));
                diags.push(Diagnostic::error(format!(
                    "Is the Ollama server running at {}?",
                    client.base_url()
                )));
                diags.push(Self::empty_warning());
                Self::default()
            }
        }
    }

    pub fn empty_warning() -> Diagnostic {
        Diagnostic::warning(
            "No models found from Ollama API. Have you pulled any models? (e.g., `ollama pull llama3`)",
        )
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.iter().any(|m| m == name)
    }

    /// Pick the model to select: `preferred` when installed, otherwise the first entry.
    pub fn choose(&self, preferred: Option<&str>) -> Option<String> {
        match preferred {
            Some(p) if self.contains(p) => Some(p.to_string()),
            _ => self.models.first().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Level;
    use crate::testing::FakeClient;

    #[tokio::test]
    async fn keeps_server_order() {
        let client = FakeClient::with_models(&["zephyr:latest", "llama3:latest", "codellama:7b"]);
        let mut diags = Vec::new();
        let cat = ModelCatalog::load(&client, &mut diags).await;
        assert_eq!(
            cat.models(),
            &["zephyr:latest", "llama3:latest", "codellama:7b"]
        );
        assert!(diags.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_yields_empty_and_shows_body() {
        let client = FakeClient {
            models: Err(ChatError::MalformedResponse {
                body: "<html>oops</html>".into(),
            }),
            ..Default::default()
        };
        let mut diags = Vec::new();
        let cat = ModelCatalog::load(&client, &mut diags).await;
        assert!(cat.is_empty());
        assert!(diags.iter().any(|d| d.text == "<html>oops</html>"));
        assert_eq!(diags.last(), Some(&ModelCatalog::empty_warning()));
    }

    #[tokio::test]
    async fn connection_failure_names_base_url() {
        let client = FakeClient {
            models: Err(ChatError::Connection {
                base_url: "http://fake.invalid".into(),
                reason: "refused".into(),
            }),
            ..Default::default()
        };
        let mut diags = Vec::new();
        let cat = ModelCatalog::load(&client, &mut diags).await;
        assert!(cat.is_empty());
        assert!(diags
            .iter()
            .any(|d| d.text == "Is the Ollama server running at http://fake.invalid?"));
        assert_eq!(diags.last(), Some(&ModelCatalog::empty_warning()));
    }

    #[tokio::test]
    async fn empty_list_warns() {
        let client = FakeClient::with_models(&[]);
        let mut diags = Vec::new();
        let cat = ModelCatalog::load(&client, &mut diags).await;
        assert!(cat.is_empty());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].level, Level::Warning);
    }

    #[test]
    fn choose_prefers_installed_model() {
        let cat = ModelCatalog::new(vec!["a".into(), "b".into()]);
        assert_eq!(cat.choose(Some("b")).as_deref(), Some("b"));
        assert_eq!(cat.choose(Some("missing")).as_deref(), Some("a"));
        assert_eq!(cat.choose(None).as_deref(), Some("a"));
        assert_eq!(ModelCatalog::default().choose(Some("a")), None);
    }
}
