use std::fmt;

use super::conversation_state::{ConversationId, ConversationStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

/// The whole mutable state of a chat session.
///
/// The store owns every conversation and message. The pending query is the
/// text that has been typed or dictated but not yet submitted.
#[derive(Debug)]
pub struct AppState {
    pub store: ConversationStore,
    pending_query: String,
    loading: bool,
    theme: Theme,
    sidebar_open: bool,
}

impl AppState {
    pub fn new(theme: Theme) -> Self {
        Self {
            store: ConversationStore::new(),
            pending_query: String::new(),
            loading: false,
            theme,
            sidebar_open: true,
        }
    }

    pub fn pending_query(&self) -> &str {
        &self.pending_query
    }

    pub fn set_pending_query(&mut self, query: impl Into<String>) {
        self.pending_query = query.into();
    }

    pub fn clear_pending_query(&mut self) {
        self.pending_query.clear();
    }

    pub(crate) fn pending_query_mut(&mut self) -> &mut String {
        &mut self.pending_query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Drops the selection so the next submission starts a fresh conversation.
    pub fn start_new(&mut self) {
        self.store.clear_selection();
        self.pending_query.clear();
    }

    pub fn select_conversation(&mut self, id: ConversationId) {
        self.store.select_conversation(id);
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.sidebar_open
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Theme::Dark)
    }
}
