#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use usagescope_api::{
    Range, SearchError, SearchHandler, SearchOptions, SearchRequest, SearchScope, SearchSummary,
    SearchTarget, TargetHandler, Usage, UsageKind, UsageLocation, UsageSearchEngine, UsageSink,
};
use usagescope_core::{Hint, PopupHost, PopupView, ShowUsages, ShowUsagesConfig};

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

/// Host that records every call and streams it to the test.
pub struct RecordingHost {
    tx: mpsc::UnboundedSender<HostEvent>,
    events: Mutex<Vec<HostEvent>>,
    pub edited_options: Mutex<Option<SearchOptions>>,
    pub chosen_target: Mutex<Option<usize>>,
}

impl RecordingHost {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Arc::new(Self {
            tx,
            events: Mutex::new(Vec::new()),
            edited_options: Mutex::new(None),
            chosen_target: Mutex::new(None),
        });
        (host, rx)
    }

    fn record(&self, event: HostEvent) {
        self.events.lock().unwrap().push(event.clone());
        let _ = self.tx.send(event);
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn popup_shown(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, HostEvent::Shown(_)))
    }

    pub fn hints(&self) -> Vec<Hint> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Hint(hint) => Some(hint),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<Usage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Navigated(usage) => Some(usage),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PopupHost for RecordingHost {
    fn show_popup(&self, view: &PopupView) {
        self.record(HostEvent::Shown(view.clone()));
    }

    fn update_popup(&self, view: &PopupView) {
        self.record(HostEvent::Updated(view.clone()));
    }

    fn close_popup(&self) {
        self.record(HostEvent::Closed);
    }

    fn navigate(&self, usage: &Usage) -> bool {
        self.record(HostEvent::Navigated(usage.clone()));
        true
    }

    fn show_hint(&self, hint: &Hint) {
        self.record(HostEvent::Hint(hint.clone()));
    }

    fn hide_hints(&self) {
        self.record(HostEvent::HintsHidden);
    }

    fn show_message(&self, text: &str) {
        self.record(HostEvent::Message(text.to_string()));
    }

    fn open_full_view(&self, request: &SearchRequest) {
        self.record(HostEvent::FullView(request.clone()));
    }

    fn edit_options(
        &self,
        _handler: &dyn SearchHandler,
        _options: &SearchOptions,
    ) -> Option<SearchOptions> {
        self.edited_options.lock().unwrap().clone()
    }

    fn choose_target(&self, candidates: &[SearchTarget]) -> Option<SearchTarget> {
        let choice = *self.chosen_target.lock().unwrap();
        choice.and_then(|i| candidates.get(i).cloned())
    }
}

/// Wait for the next popup rendering made after the search finished.
pub async fn next_final_view(rx: &mut mpsc::UnboundedReceiver<HostEvent>) -> PopupView {
    loop {
        match rx.recv().await.expect("host dropped") {
            HostEvent::Shown(view) | HostEvent::Updated(view) if !view.in_progress => return view,
            _ => {}
        }
    }
}

/// Wait for the next popup rendering of any kind.
pub async fn next_view(rx: &mut mpsc::UnboundedReceiver<HostEvent>) -> PopupView {
    loop {
        match rx.recv().await.expect("host dropped") {
            HostEvent::Shown(view) | HostEvent::Updated(view) => return view,
            _ => {}
        }
    }
}

/// Wait for a popup rendering matching `pred`, skipping older ones.
pub async fn wait_view<F>(rx: &mut mpsc::UnboundedReceiver<HostEvent>, pred: F) -> PopupView
where
    F: Fn(&PopupView) -> bool,
{
    loop {
        let view = next_view(rx).await;
        if pred(&view) {
            return view;
        }
    }
}

pub async fn wait_closed(rx: &mut mpsc::UnboundedReceiver<HostEvent>) {
    loop {
        if let HostEvent::Closed = rx.recv().await.expect("host dropped") {
            return;
        }
    }
}

pub fn declaration() -> UsageLocation {
    UsageLocation::new("/project/src/lib.rs", Range::on_line(0, 7, 3))
}

pub fn usage_at(path: &str, line: usize) -> Usage {
    Usage::at(
        UsageLocation::new(path, Range::on_line(line, 4, 3)),
        format!("foo() // {line}"),
    )
    .with_kind(UsageKind::Read)
}

pub fn usages(count: usize) -> Vec<Usage> {
    (0..count)
        .map(|i| usage_at(&format!("/project/src/m{:03}.rs", i / 10), i % 10 + 1))
        .collect()
}

pub fn target() -> SearchTarget {
    SearchTarget::new("foo").declared_at(declaration())
}

/// Producer replaying a fixed list of usages.
#[derive(Default)]
pub struct ScriptedEngine {
    pub project: Vec<Usage>,
    /// Extra usages only found when searching everywhere.
    pub everywhere: Vec<Usage>,
    pub delay: Option<Duration>,
    /// Keep the search running after the last usage until notified.
    pub hold: Option<Arc<Notify>>,
    /// Fail after delivering everything.
    pub fail: bool,
    pub requests: Mutex<Vec<SearchRequest>>,
    pub offered: AtomicUsize,
}

impl ScriptedEngine {
    pub fn with_usages(project: Vec<Usage>) -> Self {
        Self {
            project,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn offered(&self) -> usize {
        self.offered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageSearchEngine for ScriptedEngine {
    fn create_handler(&self, target: &SearchTarget) -> Option<Arc<dyn SearchHandler>> {
        if target.name.is_empty() {
            return None;
        }
        Some(Arc::new(TargetHandler::new(
            target.clone(),
            SearchOptions::new(SearchScope::Project),
            SearchScope::Everywhere,
        )))
    }

    async fn search(
        &self,
        request: SearchRequest,
        sink: Arc<dyn UsageSink>,
        cancel: CancellationToken,
    ) -> Result<SearchSummary, SearchError> {
        let everywhere = request.options.scope == SearchScope::Everywhere;
        self.requests.lock().unwrap().push(request);

        let mut summary = SearchSummary::default();
        let extra: &[Usage] = if everywhere { &self.everywhere[..] } else { &[] };
        for usage in self.project.iter().chain(extra) {
            if cancel.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.offered.fetch_add(1, Ordering::SeqCst);
            summary.offered += 1;
            if !sink.accept(usage.clone()) {
                summary.stopped_early = true;
                break;
            }
        }
        if let Some(hold) = &self.hold {
            tokio::select! {
                _ = hold.notified() => {}
                _ = cancel.cancelled() => return Err(SearchError::Cancelled),
            }
        }
        if self.fail {
            return Err(SearchError::Failed("index is corrupted".to_string()));
        }
        Ok(summary)
    }
}

pub fn build(engine: Arc<ScriptedEngine>, host: Arc<RecordingHost>) -> Arc<ShowUsages> {
    Arc::new(
        ShowUsages::builder(engine, host)
            .config(ShowUsagesConfig::default())
            .build(),
    )
}
