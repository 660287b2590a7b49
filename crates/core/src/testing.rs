use crate::diag::Diagnostic;
use crate::llm::{ChatDelta, ChatError, ChatOpts, ChatStream, ModelClient, ProbeStatus};
use crate::session::TurnSink;

/// Scripted in-memory server.
pub struct FakeClient {
    pub probe: Result<u16, ChatError>,
    pub models: Result<Vec<String>, ChatError>,
    pub generate_err: Option<ChatError>,
    pub script: Vec<Result<ChatDelta, ChatError>>,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self {
            probe: Ok(200),
            models: Ok(Vec::new()),
            generate_err: None,
            script: Vec::new(),
        }
    }
}

impl FakeClient {
    pub fn with_models(names: &[&str]) -> Self {
        Self {
            models: Ok(names.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn streaming(script: Vec<Result<ChatDelta, ChatError>>) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }
}

impl ModelClient for FakeClient {
    fn base_url(&self) -> &str {
        "http://fake.invalid"
    }

    async fn probe(&self) -> Result<ProbeStatus, ChatError> {
        self.probe.clone().map(|status| ProbeStatus { status })
    }

    async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        self.models.clone()
    }

    async fn stream_generate<'a>(
        &'a self,
        _opts: ChatOpts,
        _prompt: String,
    ) -> Result<ChatStream<'a>, ChatError> {
        if let Some(e) = &self.generate_err {
            return Err(e.clone());
        }
        Ok(Box::pin(futures::stream::iter(self.script.clone())))
    }
}

#[derive(Default)]
pub struct Recorder {
    pub partials: Vec<String>,
    pub diags: Vec<Diagnostic>,
}

impl TurnSink for Recorder {
    fn on_partial(&mut self, accumulated: &str) {
        self.partials.push(accumulated.to_string());
    }
    fn on_diagnostic(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }
}
