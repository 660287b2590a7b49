pub mod catalog;
pub mod connectivity;
pub mod diag;
pub mod session;

#[cfg(test)]
mod testing;

pub mod llm {
    use futures::Stream;
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Assistant,
    }

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
    pub struct Message {
        pub role: Role,
        pub content: String,
    }

    impl Message {
        pub fn user<S: Into<String>>(s: S) -> Self {
            Self {
                role: Role::User,
                content: s.into(),
            }
        }
        pub fn assistant<S: Into<String>>(s: S) -> Self {
            Self {
                role: Role::Assistant,
                content: s.into(),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct ChatOpts {
        pub model: String,
    }

    /// One NDJSON object of a streamed `/api/generate` response.
    ///
    /// Ollama sends more fields (timings, context, model); only the text piece and the
    /// completion flag matter here, so everything else is ignored.
    #[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
    pub struct StreamChunk {
        #[serde(default)]
        pub response: Option<String>,
        #[serde(default)]
        pub done: bool,
    }

    impl StreamChunk {
        /// Decode one fragment line. Surrounding whitespace is ignored.
        pub fn parse(line: &[u8]) -> Result<Self, ChatError> {
            serde_json::from_slice(line.trim_ascii())
                .map_err(|e| ChatError::MalformedFragment(e.to_string()))
        }

        /// The text piece, if any. Empty pieces count as absent.
        pub fn text(&self) -> Option<&str> {
            self.response.as_deref().filter(|s| !s.is_empty())
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum ChatDelta {
        Text(String),
        /// A fragment that could not be decoded; carries the raw line.
        Skipped(String),
        Finish,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ProbeStatus {
        pub status: u16,
    }

    impl ProbeStatus {
        pub fn is_ok(&self) -> bool {
            self.status == 200
        }
    }

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum ChatError {
        #[error("could not connect to {base_url}: {reason}")]
        Connection { base_url: String, reason: String },
        #[error("timeout: {0}")]
        Timeout(String),
        #[error("HTTP {status}: {body}")]
        Status { status: u16, body: String },
        #[error("malformed response: {body}")]
        MalformedResponse { body: String },
        #[error("malformed stream fragment: {0}")]
        MalformedFragment(String),
        #[error("network: {0}")]
        Network(String),
        #[error("no model selected")]
        NoModelSelected,
        #[error("a generation is already in flight")]
        Busy,
        #[error("other: {0}")]
        Other(String),
    }

    pub type ChatStream<'a> =
        Pin<Box<dyn Stream<Item = Result<ChatDelta, ChatError>> + Send + 'a>>;

    use std::pin::Pin;

    #[allow(async_fn_in_trait)]
    pub trait ModelClient: Send + Sync {
        fn base_url(&self) -> &str;
        async fn probe(&self) -> Result<ProbeStatus, ChatError>;
        async fn list_models(&self) -> Result<Vec<String>, ChatError>;
        async fn stream_generate<'a>(
            &'a self,
            opts: ChatOpts,
            prompt: String,
        ) -> Result<ChatStream<'a>, ChatError>;
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn chunk_with_text_and_extra_fields() {
            let c = StreamChunk::parse(
                br#"{"model":"llama3","created_at":"2024-01-01T00:00:00Z","response":"Hi","done":false}"#,
            )
            .unwrap();
            assert_eq!(c.text(), Some("Hi"));
            assert!(!c.done);
        }

        #[test]
        fn done_chunk_without_response() {
            let c = StreamChunk::parse(b"{\"done\":true}\r\n").unwrap();
            assert_eq!(c.text(), None);
            assert!(c.done);
        }

        #[test]
        fn empty_response_counts_as_absent() {
            let c = StreamChunk::parse(br#"{"response":""}"#).unwrap();
            assert_eq!(c.text(), None);
        }

        #[test]
        fn garbage_is_malformed() {
            let err = StreamChunk::parse(b"{not json").unwrap_err();
            assert!(matches!(err, ChatError::MalformedFragment(_)));
        }

        #[test]
        fn roles_serialize_lowercase() {
            let v = serde_json::to_value(Message::assistant("x")).unwrap();
            assert_eq!(v["role"], "assistant");
        }
    }
}
