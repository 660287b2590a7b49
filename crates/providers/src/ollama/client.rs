use crate::ollama::config::OllamaConfig;
use crate::ollama::stream::decode_generate_stream;
use olla_core::llm::{ChatError, ChatOpts, ChatStream, ModelClient, ProbeStatus};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelRecord>,
}

#[derive(Deserialize)]
struct ModelRecord {
    name: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    http: Client,
    cfg: OllamaConfig,
}

impl OllamaClient {
    pub fn new(cfg: OllamaConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2);
        if let Some(t) = cfg.timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build()?;
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.cfg
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    fn wrap_err(&self, e: reqwest::Error) -> ChatError {
        map_reqwest_err(&self.cfg.base_url, e)
    }
}

impl ModelClient for OllamaClient {
    fn base_url(&self) -> &str {
        &self.cfg.base_url
    }

    async fn probe(&self) -> Result<ProbeStatus, ChatError> {
        let url = self.url("");
        debug!(target: "providers::ollama", "probe url={}", url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.wrap_err(e))?;
        Ok(ProbeStatus {
            status: resp.status().as_u16(),
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let url = self.url("/api/tags");
        debug!(target: "providers::ollama", "list models url={}", url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.wrap_err(e))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.ok();
            error!(target: "providers::ollama", "tags non-200 status={} body={:?}", status, body);
            return Err(map_status_err(status, body));
        }
        let body = resp.text().await.map_err(|e| self.wrap_err(e))?;
        let tags: TagsResponse = serde_json::from_str(&body)
            .map_err(|_| ChatError::MalformedResponse { body: body.clone() })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn stream_generate<'a>(
        &'a self,
        opts: ChatOpts,
        prompt: String,
    ) -> Result<ChatStream<'a>, ChatError> {
        let url = self.url("/api/generate");
        info!(target: "providers::ollama", "start generate stream model={} url={}", opts.model, url);
        let body = GenerateBody {
            model: &opts.model,
            prompt: &prompt,
            stream: true,
        };
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.wrap_err(e))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.ok();
            error!(target: "providers::ollama", "generate non-200 status={} body={:?}", status, body);
            return Err(map_status_err(status, body));
        }
        Ok(Box::pin(decode_generate_stream(resp.bytes_stream())))
    }
}

fn map_reqwest_err(base_url: &str, e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout(e.to_string())
    } else if e.is_connect() {
        ChatError::Connection {
            base_url: base_url.to_string(),
            reason: e.to_string(),
        }
    } else if e.is_request() || e.is_body() {
        ChatError::Network(e.to_string())
    } else {
        ChatError::Other(e.to_string())
    }
}

fn map_status_err(status: StatusCode, body: Option<String>) -> ChatError {
    ChatError::Status {
        status: status.as_u16(),
        body: body.unwrap_or_default().trim().to_string(),
    }
}
