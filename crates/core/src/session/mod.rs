//! One producer run and the UI task that presents it.

mod state;
mod ui;

use crate::actions::ActionId;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use usagescope_api::{SearchHandler, SearchOptions};

pub use state::{SessionOutcome, SessionState};
pub(crate) use ui::{SessionDeps, UsagesSession};

/// Input from the user while a popup session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Move the selection.
    Select(usize),
    /// Activate a row (the selected one when `None`).
    Choose(Option<usize>),
    SpeedSearch(String),
    Invoke(ActionId),
    Close,
}

#[derive(Debug, Clone)]
pub(crate) enum UiEvent {
    Refresh,
    User(UserAction),
}

/// Fixed inputs of one session.
#[derive(Clone)]
pub struct SessionParams {
    pub handler: Arc<dyn SearchHandler>,
    pub options: SearchOptions,
    pub max_usages: usize,
}

impl SessionParams {
    pub fn new(handler: Arc<dyn SearchHandler>, options: SearchOptions, max_usages: usize) -> Self {
        Self {
            handler,
            options,
            max_usages,
        }
    }
}

impl std::fmt::Debug for SessionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionParams")
            .field("target", &self.handler.presentable_name())
            .field("options", &self.options)
            .field("max_usages", &self.max_usages)
            .finish()
    }
}

/// Sending side of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<UiEvent>,
    cancel: CancellationToken,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub(crate) fn new(
        tx: mpsc::Sender<UiEvent>,
        cancel: CancellationToken,
        state: watch::Receiver<SessionState>,
    ) -> Self {
        Self { tx, cancel, state }
    }

    /// Queue a user action. Returns `false` if the session is gone or its
    /// queue is full.
    pub fn send(&self, action: UserAction) -> bool {
        self.tx.try_send(UiEvent::User(action)).is_ok()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Wait until the session reached a terminal state or was dropped.
    pub async fn finished(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(SessionState::is_terminal).await;
    }

    pub fn is_same(&self, other: &SessionHandle) -> bool {
        self.tx.same_channel(&other.tx)
    }
}
