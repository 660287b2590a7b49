use tracing::{info, warn};

use crate::diag::Diagnostic;
use crate::llm::ModelClient;

/// Result of the startup liveness probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    Proceed(Vec<Diagnostic>),
    /// The server could not be reached; the front-end must stop before showing anything
    /// that depends on it.
    Halt(Vec<Diagnostic>),
}

impl Gate {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Gate::Proceed(d) | Gate::Halt(d) => d,
        }
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, Gate::Halt(_))
    }
}

/// Probe the server once. Any HTTP response lets startup continue; a transport failure
/// halts it. There is no retry.
pub async fn check<C: ModelClient>(client: &C) -> Gate {
    let base = client.base_url();
    match client.probe().await {
        Ok(st) if st.is_ok() => {
            info!(target: "core::connectivity", "server up at {}", base);
            Gate::Proceed(vec![Diagnostic::success(format!(
                "Successfully connected to Ollama server at {}",
                base
            ))])
        }
        Ok(st) => {
            warn!(target: "core::connectivity", "server at {} answered {}", base, st.status);
            Gate::Proceed(vec![Diagnostic::warning(format!(
                "Ollama server responded with status {}. Ensure it's running correctly.",
                st.status
            ))])
        }
        Err(e) => {
            warn!(target: "core::connectivity", "probe failed: {}", e);
            Gate::Halt(vec![
                Diagnostic::error(format!(
                    "Connection Error: Could not connect to Ollama server at {}.",
                    base
                )),
                Diagnostic::info(
                    "Please ensure the 'ollama serve' command is running in a separate terminal.",
                ),
            ])
        }
    }
}
