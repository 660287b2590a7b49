//! NDJSON decoding for streamed `/api/generate` responses.
//!
//! Ollama writes one JSON object per line:
//! ```text
//! {"model":"llama3","response":"Hi","done":false}
//! {"model":"llama3","response":" there","done":false}
//! {"model":"llama3","response":"","done":true,"eval_count":2}
//! ```
//! Lines that do not decode are reported as [`ChatDelta::Skipped`] and decoding goes on.
//! The first `done: true` ends the stream; anything after it is never read.

use bytes::{Buf, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use olla_core::llm::{ChatDelta, ChatError, StreamChunk};
use tracing::{debug, warn};

/// Splits a byte stream into lines across chunk boundaries.
#[derive(Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete line without its terminator (`\n` or `\r\n`).
    pub fn next_line(&mut self) -> Option<Bytes> {
        let pos = twoway::find_bytes(&self.buf, b"\n")?;
        let mut line = self.buf.split_to(pos).freeze();
        self.buf.advance(1);
        if line.ends_with(b"\r") {
            line.truncate(line.len() - 1);
        }
        Some(line)
    }

    /// Whatever is left once the input has ended.
    pub fn finish(&mut self) -> Option<Bytes> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }
}

enum Decoded {
    Nothing,
    Deltas(Vec<ChatDelta>),
    Done(Vec<ChatDelta>),
}

fn decode_line(line: &[u8]) -> Decoded {
    if line.trim_ascii().is_empty() {
        return Decoded::Nothing;
    }
    match StreamChunk::parse(line) {
        Ok(chunk) => {
            let mut out = Vec::with_capacity(2);
            if let Some(t) = chunk.text() {
                out.push(ChatDelta::Text(t.to_string()));
            }
            if chunk.done {
                out.push(ChatDelta::Finish);
                Decoded::Done(out)
            } else {
                Decoded::Deltas(out)
            }
        }
        Err(e) => {
            let raw = String::from_utf8_lossy(line).into_owned();
            warn!(target: "providers::ollama", "skipping undecodable fragment: {} ({})", raw, e);
            Decoded::Deltas(vec![ChatDelta::Skipped(raw)])
        }
    }
}

/// Turn a response body into deltas.
pub fn decode_generate_stream<S, E>(body: S) -> impl Stream<Item = Result<ChatDelta, ChatError>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    async_stream::stream! {
        let mut body = std::pin::pin!(body);
        let mut lines = LineBuffer::default();
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(b) => {
                    lines.push(&b);
                    while let Some(line) = lines.next_line() {
                        match decode_line(&line) {
                            Decoded::Nothing => {}
                            Decoded::Deltas(ds) => {
                                for d in ds { yield Ok(d); }
                            }
                            Decoded::Done(ds) => {
                                for d in ds { yield Ok(d); }
                                debug!(target: "providers::ollama", "generate stream done");
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(target: "providers::ollama", "stream read error: {}", e);
                    yield Err(ChatError::Network(e.to_string()));
                    return;
                }
            }
        }
        if let Some(rest) = lines.finish() {
            match decode_line(&rest) {
                Decoded::Nothing => {}
                Decoded::Deltas(ds) | Decoded::Done(ds) => {
                    for d in ds { yield Ok(d); }
                }
            }
        }
        debug!(target: "providers::ollama", "generate stream ended without done");
    }
}
