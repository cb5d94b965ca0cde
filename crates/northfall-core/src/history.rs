/// Every non-empty line the user submitted, valid or not, in order.
///
/// Append-only: nothing here evicts, deduplicates, or deletes. `clear`
/// empties the log, never the history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandHistory {
    entries: Vec<String>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
    }

    pub fn all(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// HistoryCursor
// ---------------------------------------------------------------------------

/// Up/down-arrow recall over a [`CommandHistory`].
///
/// The cursor only holds a position; the history it walks is borrowed per
/// call so new submissions are visible immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryCursor {
    /// Steps back from the live input line. `0` means no recall is active.
    offset: usize,
}

impl HistoryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move one entry further into the past. Stops at the oldest entry.
    pub fn previous<'h>(&mut self, history: &'h CommandHistory) -> Option<&'h str> {
        if history.is_empty() {
            return None;
        }
        if self.offset < history.len() {
            self.offset += 1;
        }
        self.current(history)
    }

    /// Move one entry toward the present. Returns `None` once back at the
    /// live input line.
    pub fn next<'h>(&mut self, history: &'h CommandHistory) -> Option<&'h str> {
        self.offset = self.offset.saturating_sub(1);
        self.current(history)
    }

    pub fn current<'h>(&self, history: &'h CommandHistory) -> Option<&'h str> {
        if self.offset == 0 {
            return None;
        }
        let len = history.len();
        let offset = self.offset.min(len);
        history.all().get(len - offset).map(String::as_str)
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }
}
