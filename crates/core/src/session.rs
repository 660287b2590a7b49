//! Chat session: the in-memory transcript and the per-turn streaming state machine.
//!
//! A turn goes Idle -> Submitted ([`ChatSession::begin_turn`]) -> Streaming/Accumulating
//! ([`Accumulator::apply`] per delta) -> Completed ([`ChatSession::finish_turn`]).
//! [`ChatSession::exchange`] drives all of it for async callers; event-driven front-ends
//! call the steps themselves.

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::diag::Diagnostic;
use crate::llm::{ChatDelta, ChatError, ChatOpts, Message, ModelClient};

pub const FAILED_RESPONSE: &str = "Failed to get a response from the model.";

/// Append-only list of messages for one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn push(&mut self, m: Message) {
        self.messages.push(m);
    }
}

/// Observer of a running turn.
pub trait TurnSink {
    /// Called after every text piece with the whole accumulator so far.
    fn on_partial(&mut self, accumulated: &str);
    fn on_diagnostic(&mut self, diag: Diagnostic);
}

impl TurnSink for Vec<Diagnostic> {
    fn on_partial(&mut self, _accumulated: &str) {}
    fn on_diagnostic(&mut self, diag: Diagnostic) {
        self.push(diag);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Running concatenation of the text pieces of one turn.
#[derive(Clone, Debug, Default)]
pub struct Accumulator {
    text: String,
}

impl Accumulator {
    pub fn apply(&mut self, delta: ChatDelta, sink: &mut dyn TurnSink) -> Flow {
        match delta {
            ChatDelta::Text(t) => {
                if !t.is_empty() {
                    self.text.push_str(&t);
                    sink.on_partial(&self.text);
                }
                Flow::Continue
            }
            ChatDelta::Skipped(line) => {
                sink.on_diagnostic(Diagnostic::warning(format!(
                    "Skipping invalid JSON line from stream: {}",
                    line
                )));
                Flow::Continue
            }
            ChatDelta::Finish => Flow::Stop,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// How a turn ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The stream finished (by `done` or by running out); carries the accumulator.
    Completed(String),
    Failed(ChatError),
}

/// A submitted turn whose user message is already in the transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTurn {
    model: String,
    prompt: String,
}

impl PendingTurn {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn opts(&self) -> ChatOpts {
        ChatOpts {
            model: self.model.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Transcript,
    selected_model: Option<String>,
    in_flight: bool,
}

impl ChatSession {
    pub fn new(selected_model: Option<String>) -> Self {
        Self {
            selected_model,
            ..Default::default()
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.selected_model.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Change the selected model. Refused while a generation is in flight.
    pub fn select_model(&mut self, model: Option<String>) -> Result<(), ChatError> {
        if self.in_flight {
            return Err(ChatError::Busy);
        }
        info!(target: "core::session", "model selected: {:?}", model);
        self.selected_model = model;
        Ok(())
    }

    /// Record the user's prompt and start a turn.
    ///
    /// Without a selected model, or while another turn is running, nothing is recorded.
    pub fn begin_turn(&mut self, prompt: &str) -> Result<PendingTurn, ChatError> {
        if self.in_flight {
            return Err(ChatError::Busy);
        }
        let model = self
            .selected_model
            .clone()
            .ok_or(ChatError::NoModelSelected)?;
        self.transcript.push(Message::user(prompt));
        self.in_flight = true;
        debug!(target: "core::session", "turn started model={} prompt_len={}", model, prompt.len());
        Ok(PendingTurn {
            model,
            prompt: prompt.to_string(),
        })
    }

    /// Close a turn. Returns the assistant message when one was appended.
    pub fn finish_turn(
        &mut self,
        _turn: PendingTurn,
        outcome: TurnOutcome,
        sink: &mut dyn TurnSink,
    ) -> Option<Message> {
        self.in_flight = false;
        match outcome {
            TurnOutcome::Completed(text) if !text.is_empty() => {
                let msg = Message::assistant(text);
                self.transcript.push(msg.clone());
                info!(target: "core::session", "turn completed, {} bytes", msg.content.len());
                Some(msg)
            }
            TurnOutcome::Completed(_) => {
                warn!(target: "core::session", "turn produced no text");
                sink.on_diagnostic(Diagnostic::error(FAILED_RESPONSE));
                None
            }
            TurnOutcome::Failed(e) => {
                warn!(target: "core::session", "turn failed: {}", e);
                sink.on_diagnostic(Diagnostic::error(format!(
                    "Error during Ollama generation request: {}",
                    e
                )));
                sink.on_diagnostic(Diagnostic::error(FAILED_RESPONSE));
                None
            }
        }
    }

    /// Run one full exchange against `client`.
    ///
    /// Rejected submissions produce a warning on `sink` and return the error; every other
    /// path returns `Ok` with the assistant message if one was appended.
    pub async fn exchange<C: ModelClient>(
        &mut self,
        client: &C,
        prompt: &str,
        sink: &mut dyn TurnSink,
    ) -> Result<Option<Message>, ChatError> {
        let turn = match self.begin_turn(prompt) {
            Ok(t) => t,
            Err(e) => {
                sink.on_diagnostic(rejection_notice(&e));
                return Err(e);
            }
        };
        let outcome = drive(client, &turn, sink).await;
        Ok(self.finish_turn(turn, outcome, sink))
    }
}

async fn drive<C: ModelClient>(
    client: &C,
    turn: &PendingTurn,
    sink: &mut dyn TurnSink,
) -> TurnOutcome {
    let mut stream = match client
        .stream_generate(turn.opts(), turn.prompt().to_string())
        .await
    {
        Ok(s) => s,
        Err(e) => return TurnOutcome::Failed(e),
    };
    let mut acc = Accumulator::default();
    while let Some(item) = stream.next().await {
        match item {
            Ok(delta) => {
                if acc.apply(delta, sink) == Flow::Stop {
                    break;
                }
            }
            Err(e) => return TurnOutcome::Failed(e),
        }
    }
    TurnOutcome::Completed(acc.into_text())
}

/// The warning shown when a submission is refused before anything is recorded.
pub fn rejection_notice(err: &ChatError) -> Diagnostic {
    match err {
        ChatError::NoModelSelected => {
            Diagnostic::warning("Please select a model before sending a message.")
        }
        ChatError::Busy => Diagnostic::warning("Wait for the current response to finish."),
        other => Diagnostic::warning(other.to_string()),
    }
}
