use crate::dispatch::JobDispatcher;
use crate::history::{CommandHistory, HistoryCursor};
use crate::interpreter::{Interpreter, Outcome};
use crate::job::JobCompletionPayload;
use crate::log::{LogLine, TerminalLog};
use crate::tabs::TabSet;
use tracing::debug;

/// State owned by one terminal: a history shared across tabs, and the tabs.
///
/// Everything here is mutated from a single event loop, so no locking.
#[derive(Debug, Clone, Default)]
pub struct TerminalSession {
    history: CommandHistory,
    cursor: HistoryCursor,
    tabs: TabSet,
}

impl TerminalSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one submitted line against the active tab.
    pub fn submit<D: JobDispatcher>(&mut self, raw: &str, interpreter: &Interpreter<D>) -> Outcome {
        self.cursor.reset();
        let tab = self.tabs.active_mut();
        tab.input.clear();
        interpreter.handle_command(raw, &mut self.history, &mut tab.log)
    }

    /// Socket listener: record a completion frame in the active tab.
    pub fn apply_completion(&mut self, payload: &JobCompletionPayload) {
        debug!(
            job_id = %payload.job_id,
            kind = %payload.kind,
            "completion received"
        );
        self.tabs.active_mut().log.append(LogLine::from(payload));
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn log(&self) -> &TerminalLog {
        &self.tabs.active().log
    }

    pub fn tabs(&self) -> &TabSet {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut TabSet {
        &mut self.tabs
    }

    /// Up-arrow: load an older history entry into the active tab's input.
    pub fn recall_previous(&mut self) -> Option<&str> {
        let entry = self.cursor.previous(&self.history)?.to_string();
        let tab = self.tabs.active_mut();
        tab.input = entry;
        Some(&tab.input)
    }

    /// Down-arrow: load a newer entry, or clear the input at the live line.
    pub fn recall_next(&mut self) -> Option<&str> {
        let entry = self.cursor.next(&self.history).map(str::to_string);
        let tab = self.tabs.active_mut();
        match entry {
            Some(line) => {
                tab.input = line;
                Some(&tab.input)
            }
            None => {
                tab.input.clear();
                None
            }
        }
    }
}
