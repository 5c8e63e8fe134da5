use std::fmt;
use std::sync::Arc;
use usagescope_api::{SearchOptions, Usage};

/// Where a session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Initializing,
    /// Producer running, popup hidden.
    Searching,
    PopupVisible,
    NavigatedSingle,
    Navigated,
    Cancelled,
    ShowingMore,
    SearchEverywhere,
    Reconfigured,
    HandedOff,
    Completed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            SessionState::Initializing | SessionState::Searching | SessionState::PopupVisible
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a session ended, with what the launcher needs to continue.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The only usage was opened without showing the popup.
    NavigatedSingle { usage: Arc<Usage> },
    /// The user picked a row.
    Navigated { usage: Arc<Usage> },
    /// Nothing found. Carries the wider options to use if the user invokes
    /// the action again while the hint is showing.
    NoUsages { escalation: Option<SearchOptions> },
    Cancelled,
    /// Relaunch with a bigger cap.
    ShowMore { max_usages: usize },
    /// Relaunch in the maximal scope.
    SearchEverywhere { options: SearchOptions },
    /// Relaunch with options edited by the user.
    Reconfigured { options: SearchOptions },
    /// The full results view took over.
    HandedOff,
}

impl SessionOutcome {
    pub fn state(&self) -> SessionState {
        match self {
            SessionOutcome::NavigatedSingle { .. } => SessionState::NavigatedSingle,
            SessionOutcome::Navigated { .. } => SessionState::Navigated,
            SessionOutcome::NoUsages { .. } => SessionState::Completed,
            SessionOutcome::Cancelled => SessionState::Cancelled,
            SessionOutcome::ShowMore { .. } => SessionState::ShowingMore,
            SessionOutcome::SearchEverywhere { .. } => SessionState::SearchEverywhere,
            SessionOutcome::Reconfigured { .. } => SessionState::Reconfigured,
            SessionOutcome::HandedOff => SessionState::HandedOff,
        }
    }

    /// Whether the launcher starts a fresh session after this outcome.
    pub fn relaunches(&self) -> bool {
        matches!(
            self,
            SessionOutcome::ShowMore { .. }
                | SessionOutcome::SearchEverywhere { .. }
                | SessionOutcome::Reconfigured { .. }
        )
    }
}
