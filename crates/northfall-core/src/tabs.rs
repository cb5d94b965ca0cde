use crate::error::{NorthfallError, Result};
use crate::log::TerminalLog;

pub const DEFAULT_TAB_NAME: &str = "winter";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalTab {
    pub id: String,
    pub name: String,
    pub log: TerminalLog,
    /// Unsubmitted text in the tab's prompt.
    pub input: String,
}

impl TerminalTab {
    fn new(id: String, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            log: TerminalLog::new(),
            input: String::new(),
        }
    }
}

/// Ordered terminal tabs with exactly one active. Never empty.
#[derive(Debug, Clone)]
pub struct TabSet {
    tabs: Vec<TerminalTab>,
    active: usize,
    next_id: u64,
}

impl Default for TabSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TabSet {
    pub fn new() -> Self {
        let mut set = Self {
            tabs: Vec::new(),
            active: 0,
            next_id: 1,
        };
        set.open(DEFAULT_TAB_NAME);
        set
    }

    /// Open a tab after the last one and make it active.
    pub fn open(&mut self, name: impl Into<String>) -> String {
        let id = format!("tab-{}", self.next_id);
        self.next_id += 1;
        self.tabs.push(TerminalTab::new(id.clone(), name));
        self.active = self.tabs.len() - 1;
        id
    }

    pub fn close(&mut self, id: &str) -> Result<TerminalTab> {
        let index = self.position(id)?;
        if self.tabs.len() == 1 {
            return Err(NorthfallError::LastTab);
        }
        let removed = self.tabs.remove(index);
        if self.active > index || self.active == self.tabs.len() {
            self.active -= 1;
        }
        Ok(removed)
    }

    pub fn activate(&mut self, id: &str) -> Result<()> {
        self.active = self.position(id)?;
        Ok(())
    }

    /// Move to the next tab, wrapping around after the last.
    pub fn cycle(&mut self) -> &TerminalTab {
        self.active = (self.active + 1) % self.tabs.len();
        &self.tabs[self.active]
    }

    pub fn active(&self) -> &TerminalTab {
        &self.tabs[self.active]
    }

    pub fn active_mut(&mut self) -> &mut TerminalTab {
        &mut self.tabs[self.active]
    }

    pub fn get(&self, id: &str) -> Option<&TerminalTab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn tabs(&self) -> &[TerminalTab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| NorthfallError::TabNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogLine;

    #[test]
    fn starts_with_one_default_tab() {
        let set = TabSet::new();
        assert_eq!(set.len(), 1);
        assert_eq!(set.active().name, DEFAULT_TAB_NAME);
    }

    #[test]
    fn open_activates_new_tab() {
        let mut set = TabSet::new();
        let id = set.open("tests");
        assert_eq!(set.active().id, id);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn cycle_wraps() {
        let mut set = TabSet::new();
        let first = set.active().id.clone();
        let second = set.open("second");
        assert_eq!(set.cycle().id, first);
        assert_eq!(set.cycle().id, second);
    }

    #[test]
    fn close_last_tab_is_rejected() {
        let mut set = TabSet::new();
        let id = set.active().id.clone();
        assert!(matches!(set.close(&id), Err(NorthfallError::LastTab)));
    }

    #[test]
    fn close_unknown_tab_is_rejected() {
        let mut set = TabSet::new();
        assert!(matches!(
            set.close("tab-99"),
            Err(NorthfallError::TabNotFound(_))
        ));
    }

    #[test]
    fn closing_keeps_active_tab_stable() {
        let mut set = TabSet::new();
        let first = set.active().id.clone();
        let second = set.open("second");
        let third = set.open("third");
        set.activate(&third).unwrap();
        set.close(&first).unwrap();
        assert_eq!(set.active().id, third);

        set.close(&third).unwrap();
        assert_eq!(set.active().id, second);
    }

    #[test]
    fn tabs_keep_separate_logs() {
        let mut set = TabSet::new();
        set.active_mut().log.append(LogLine::command("--help"));
        set.open("other");
        assert!(set.active().log.is_empty());
        assert_eq!(set.tabs()[0].log.len(), 1);
    }
}
