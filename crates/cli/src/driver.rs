use crate::host::{HostEvent, TerminalHost};
use crate::view;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use usagescope_core::{
    Invocation, PopupView, SessionOutcome, ShowUsages, ShowUsagesError, UserAction,
};

/// With no host event for this long, a visible popup counts as settled.
const QUIET_PERIOD: Duration = Duration::from_millis(50);

type InvokeTask = JoinHandle<usagescope_core::Result<SessionOutcome>>;

/// Runs Show Usages in the background and prints what the host is asked
/// to show, one settled state at a time.
pub struct Driver {
    usages: Arc<ShowUsages>,
    host: Arc<TerminalHost>,
    events: mpsc::UnboundedReceiver<HostEvent>,
    task: Option<InvokeTask>,
    popup: Option<PopupView>,
    dirty: bool,
    json: bool,
}

impl Driver {
    pub fn new(root: PathBuf, rows: Option<usize>, json: bool) -> Self {
        let (host, events) = TerminalHost::new(rows);
        let host = Arc::new(host);
        let usages = usagescope_runtime::build_default(root, host.clone());
        Self {
            usages: Arc::new(usages),
            host,
            events,
            task: None,
            popup: None,
            dirty: false,
            json,
        }
    }

    pub fn host(&self) -> &TerminalHost {
        &self.host
    }

    pub fn usages(&self) -> &ShowUsages {
        &self.usages
    }

    pub fn popup(&self) -> Option<&PopupView> {
        self.popup.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start Show Usages, closing the popup of a previous run first.
    pub async fn start(&mut self, invocation: Invocation) {
        if self.is_running() {
            self.usages.close();
            self.settle().await;
        }
        let usages = Arc::clone(&self.usages);
        self.task = Some(tokio::spawn(async move { usages.invoke(invocation).await }));
        self.settle().await;
    }

    /// Forward an action to the running popup and wait for its effect.
    pub async fn dispatch(&mut self, action: UserAction) -> bool {
        if !self.usages.dispatch(action) {
            return false;
        }
        self.settle().await;
        true
    }

    /// Row index of the "more usages" marker in the visible popup.
    pub fn more_row(&self) -> Option<usize> {
        self.popup
            .as_ref()?
            .rows
            .iter()
            .position(|row| row.node.is_more_usages())
    }

    /// Drain host events until the popup shows final results or the run
    /// is over, then print the popup.
    pub async fn settle(&mut self) {
        loop {
            match tokio::time::timeout(QUIET_PERIOD, self.events.recv()).await {
                Ok(Some(event)) => self.apply(event),
                Ok(None) => break,
                Err(_) => {
                    let finished = self.task.as_ref().is_none_or(JoinHandle::is_finished);
                    let complete = self.popup.as_ref().is_some_and(|v| !v.in_progress);
                    if finished || complete {
                        break;
                    }
                }
            }
        }
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }

        if self.dirty {
            self.dirty = false;
            self.print_popup();
        }
        if let Some(task) = self.task.take_if(|task| task.is_finished()) {
            self.report(task.await);
        }
    }

    pub fn print_popup(&self) {
        let Some(popup) = &self.popup else {
            println!("No popup is showing.");
            return;
        };
        if self.json {
            println!("{}", view::popup_json(popup));
        } else {
            println!("{}", view::render_popup(popup));
        }
    }

    fn apply(&mut self, event: HostEvent) {
        match event {
            HostEvent::Shown(popup) | HostEvent::Updated(popup) => {
                self.popup = Some(popup);
                self.dirty = true;
            }
            HostEvent::Closed => {
                self.popup = None;
                self.dirty = false;
            }
            HostEvent::Navigated(usage) => println!("{}", view::render_navigation(&usage)),
            HostEvent::Hint(hint) => println!("{}", view::render_hint(&hint)),
            HostEvent::HintsHidden => debug!("hints hidden"),
            HostEvent::Message(text) => println!("{text}"),
            HostEvent::FullView(request) => println!("{}", view::render_full_view(&request)),
        }
    }

    fn report(
        &self,
        joined: Result<usagescope_core::Result<SessionOutcome>, tokio::task::JoinError>,
    ) {
        match joined {
            Ok(Ok(outcome)) => {
                if let Some(text) = view::render_outcome(&outcome) {
                    println!("{text}");
                }
            }
            // already reported through the host
            Ok(Err(
                ShowUsagesError::NoTargetResolved | ShowUsagesError::AmbiguousTargetUnresolved,
            )) => {}
            Ok(Err(err)) => eprintln!("Error: {err}"),
            Err(err) => warn!("Show Usages task failed: {}", err),
        }
    }
}
