//! One-shot line mode: a single exchange written to plain stdout/stderr.

use std::io::Write;

use olla_core::diag::{Diagnostic, Level};
use olla_core::llm::ModelClient;
use olla_core::session::{ChatSession, TurnSink};
use tracing::info;

use crate::startup::Startup;

/// Prints the accumulator growth to `out` and diagnostics to `err`.
pub struct LineSink<O: Write, E: Write> {
    out: O,
    err: E,
    printed: usize,
}

impl<O: Write, E: Write> LineSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            printed: 0,
        }
    }

    pub fn notice(&mut self, d: &Diagnostic) {
        let _ = writeln!(self.err, "{}", d);
    }

    fn end(&mut self) {
        if self.printed > 0 {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
    }
}

impl<O: Write, E: Write> TurnSink for LineSink<O, E> {
    fn on_partial(&mut self, accumulated: &str) {
        if let Some(tail) = accumulated.get(self.printed..) {
            let _ = self.out.write_all(tail.as_bytes());
            let _ = self.out.flush();
        }
        self.printed = accumulated.len();
    }

    fn on_diagnostic(&mut self, diag: Diagnostic) {
        self.notice(&diag);
    }
}

/// Run one exchange. Returns true when an assistant message was produced.
pub async fn run<C: ModelClient, O: Write, E: Write>(
    client: &C,
    startup: Startup,
    prompt: &str,
    sink: &mut LineSink<O, E>,
) -> bool {
    for d in &startup.notices {
        sink.notice(d);
    }
    let mut session = ChatSession::new(startup.selected);
    let reply = session.exchange(client, prompt, sink).await;
    sink.end();
    let produced = matches!(reply, Ok(Some(_)));
    info!(target: "tui", "line mode finished, reply produced={}", produced);
    produced
}

/// Print the catalog one model per line. Returns false when loading it reported an error.
pub fn list_models<O: Write, E: Write>(startup: &Startup, sink: &mut LineSink<O, E>) -> bool {
    for d in &startup.notices {
        sink.notice(d);
    }
    for m in startup.catalog.models() {
        let _ = writeln!(sink.out, "{}", m);
    }
    let _ = sink.out.flush();
    !startup.notices.iter().any(|d| d.level == Level::Error)
}
