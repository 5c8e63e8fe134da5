//! Boundary to the UI shell that actually draws popups and hints.

use crate::presentation::PopupView;
use async_trait::async_trait;
use usagescope_api::{SearchHandler, SearchOptions, SearchRequest, SearchTarget, Usage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Information,
    Error,
}

/// Small inline message shown next to the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub text: String,
    /// Smaller follow-up line, e.g. "Press ... again to search in ...".
    pub secondary: Option<String>,
    pub kind: HintKind,
}

impl Hint {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            secondary: None,
            kind: HintKind::Information,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            secondary: None,
            kind: HintKind::Error,
        }
    }

    pub fn with_secondary(mut self, secondary: Option<String>) -> Self {
        self.secondary = secondary;
        self
    }
}

/// The UI shell. Every method is invoked from the session's UI task only.
#[async_trait]
pub trait PopupHost: Send + Sync {
    fn show_popup(&self, view: &PopupView);

    fn update_popup(&self, view: &PopupView);

    fn close_popup(&self);

    /// Open the usage's location. Returns `false` if it cannot be opened.
    fn navigate(&self, usage: &Usage) -> bool;

    fn show_hint(&self, hint: &Hint);

    fn hide_hints(&self);

    /// Blocking message, used when nothing could be searched at all.
    fn show_message(&self, text: &str);

    /// Hand the search over to the full results view.
    fn open_full_view(&self, request: &SearchRequest);

    /// Let the user edit the search options. `None` means declined.
    fn edit_options(
        &self,
        handler: &dyn SearchHandler,
        options: &SearchOptions,
    ) -> Option<SearchOptions>;

    /// Disambiguate between several candidate targets.
    fn choose_target(&self, candidates: &[SearchTarget]) -> Option<SearchTarget>;

    /// Rows the host can fit on screen at the popup position.
    fn available_rows(&self) -> Option<usize> {
        None
    }

    /// Resolves once focus and scrolling settled after a navigation.
    async fn wait_until_settled(&self) {}
}
