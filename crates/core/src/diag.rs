//! User-facing diagnostics.
//!
//! Every failure is reported to the person at the keyboard at the point where it
//! happens. Front-ends decide how to draw a [`Diagnostic`]; this crate only produces them.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "ok",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub text: String,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(level: Level, text: S) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
    pub fn info<S: Into<String>>(s: S) -> Self {
        Self::new(Level::Info, s)
    }
    pub fn success<S: Into<String>>(s: S) -> Self {
        Self::new(Level::Success, s)
    }
    pub fn warning<S: Into<String>>(s: S) -> Self {
        Self::new(Level::Warning, s)
    }
    pub fn error<S: Into<String>>(s: S) -> Self {
        Self::new(Level::Error, s)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.label(), self.text)
    }
}
