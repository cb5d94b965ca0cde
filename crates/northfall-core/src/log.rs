use crate::job::{JobCompletionPayload, SocketDataKind};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// LineKind
// ---------------------------------------------------------------------------

/// Styling tag for a terminal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Echo of recognized input.
    Command,
    /// Static response produced locally.
    Client,
    /// Echo of unrecognized input, or the not-found message.
    Error,
    Unknown,
    /// Line delivered by the job server.
    #[serde(untagged)]
    Socket(SocketDataKind),
}

impl LineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LineKind::Command => "command",
            LineKind::Client => "client",
            LineKind::Error => "error",
            LineKind::Unknown => "unknown",
            LineKind::Socket(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LogLine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(rename = "type")]
    pub kind: LineKind,
    pub text: String,
}

impl LogLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn command(text: impl Into<String>) -> Self {
        Self::new(LineKind::Command, text)
    }

    pub fn client(text: impl Into<String>) -> Self {
        Self::new(LineKind::Client, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(LineKind::Error, text)
    }
}

impl From<&JobCompletionPayload> for LogLine {
    fn from(payload: &JobCompletionPayload) -> Self {
        Self::new(LineKind::Socket(payload.kind), payload.lines.clone())
    }
}

// ---------------------------------------------------------------------------
// TerminalLog
// ---------------------------------------------------------------------------

/// The lines rendered in one terminal, in display order.
///
/// `replace_all` is the only way to shrink the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminalLog {
    lines: Vec<LogLine>,
}

impl TerminalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: LogLine) {
        self.lines.push(line);
    }

    pub fn replace_all(&mut self, lines: Vec<LogLine>) {
        self.lines = lines;
    }

    pub fn all(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines appended since the log held `mark` lines. Yields everything if
    /// the log was truncated below `mark` in between.
    pub fn since(&self, mark: usize) -> &[LogLine] {
        if mark > self.lines.len() {
            return &self.lines;
        }
        &self.lines[mark..]
    }
}
