use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;
use usagescope_api::{
    SearchHandler, SearchOptions, SearchRequest, SearchScope, SearchTarget, Usage,
};
use usagescope_core::{Hint, PopupHost, PopupView};

/// Everything the session asked the terminal to do, in order.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Shown(PopupView),
    Updated(PopupView),
    Closed,
    Navigated(Usage),
    Hint(Hint),
    HintsHidden,
    Message(String),
    FullView(SearchRequest),
}

/// Answer to the "edit options" dialog: fields left `None` keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsEdit {
    pub scope: Option<SearchScope>,
    pub text_occurrences: Option<bool>,
}

impl OptionsEdit {
    pub fn apply(&self, options: &SearchOptions) -> SearchOptions {
        let mut edited = options.clone();
        if let Some(scope) = &self.scope {
            edited.scope = scope.clone();
        }
        if let Some(text) = self.text_occurrences {
            edited.search_text_occurrences = text;
        }
        edited
    }
}

/// Terminal stand-in for the editor UI.
///
/// Calls arrive on the session's UI task and are queued for the shell to
/// print. Dialog answers (edited options, target choice) are staged by the
/// shell before it triggers the action that asks for them.
pub struct TerminalHost {
    events: mpsc::UnboundedSender<HostEvent>,
    staged_edit: Mutex<Option<OptionsEdit>>,
    staged_pick: Mutex<Option<usize>>,
    rows: Option<usize>,
}

impl TerminalHost {
    pub fn new(rows: Option<usize>) -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let host = Self {
            events,
            staged_edit: Mutex::new(None),
            staged_pick: Mutex::new(None),
            rows,
        };
        (host, rx)
    }

    /// Answer for the next "edit options" dialog.
    pub fn stage_edit(&self, edit: OptionsEdit) {
        *self
            .staged_edit
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(edit);
    }

    /// Answer for the next "choose target" dialog.
    pub fn stage_pick(&self, index: Option<usize>) {
        *self
            .staged_pick
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = index;
    }

    fn emit(&self, event: HostEvent) {
        // the shell may already be gone
        let _ = self.events.send(event);
    }
}

impl PopupHost for TerminalHost {
    fn show_popup(&self, view: &PopupView) {
        self.emit(HostEvent::Shown(view.clone()));
    }

    fn update_popup(&self, view: &PopupView) {
        self.emit(HostEvent::Updated(view.clone()));
    }

    fn close_popup(&self) {
        self.emit(HostEvent::Closed);
    }

    fn navigate(&self, usage: &Usage) -> bool {
        if !usage.is_navigable() {
            return false;
        }
        self.emit(HostEvent::Navigated(usage.clone()));
        true
    }

    fn show_hint(&self, hint: &Hint) {
        self.emit(HostEvent::Hint(hint.clone()));
    }

    fn hide_hints(&self) {
        self.emit(HostEvent::HintsHidden);
    }

    fn show_message(&self, text: &str) {
        self.emit(HostEvent::Message(text.to_string()));
    }

    fn open_full_view(&self, request: &SearchRequest) {
        self.emit(HostEvent::FullView(request.clone()));
    }

    fn edit_options(
        &self,
        handler: &dyn SearchHandler,
        options: &SearchOptions,
    ) -> Option<SearchOptions> {
        let staged = self
            .staged_edit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!(target = %handler.presentable_name(), confirmed = staged.is_some(), "options dialog");
        staged.map(|edit| edit.apply(options))
    }

    fn choose_target(&self, candidates: &[SearchTarget]) -> Option<SearchTarget> {
        let pick = self
            .staged_pick
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pick {
            Some(index) => candidates.get(index).cloned(),
            None => {
                self.emit(HostEvent::Message(crate::view::render_candidates(candidates)));
                None
            }
        }
    }

    fn available_rows(&self) -> Option<usize> {
        self.rows
    }
}
