use super::{SessionHandle, SessionOutcome, SessionParams, SessionState, UiEvent, UserAction};
use crate::actions::{ActionContext, ActionRegistry, ActionResult};
use crate::collector::{ResultSnapshot, UsageCollector, UsagePredicate, UsageTransform};
use crate::config::ShowUsagesConfig;
use crate::error::ShowUsagesError;
use crate::host::{Hint, PopupHost};
use crate::presentation::{self, PopupModel, PopupView, RebuildContext};
use crate::refresh::ThrottledRefresher;
use crate::settings::{DisplaySettingsStore, SettingsOverride};
use crate::view::ViewFactory;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use usagescope_api::{
    SearchError, SearchSummary, UsageNode, UsageSearchEngine, UsageSink, UsageView,
};

/// Collaborators shared by every session a launcher starts.
#[derive(Clone)]
pub(crate) struct SessionDeps {
    pub engine: Arc<dyn UsageSearchEngine>,
    pub host: Arc<dyn PopupHost>,
    pub config: Arc<ShowUsagesConfig>,
    pub actions: Arc<ActionRegistry>,
    pub settings: Arc<DisplaySettingsStore>,
    pub view_factory: ViewFactory,
    pub filter: Option<UsagePredicate>,
    pub transform: Option<UsageTransform>,
}

/// State owned by the UI task of one session.
pub(crate) struct UsagesSession {
    deps: SessionDeps,
    params: SessionParams,
    settings: SettingsOverride,
    view: Arc<dyn UsageView>,
    tx: mpsc::Sender<UiEvent>,
    cancel: CancellationToken,
    state: watch::Sender<SessionState>,
    model: PopupModel,
    popup_shown: bool,
    search_done: bool,
    title: String,
    name: String,
    scope: String,
    ad_text: Option<String>,
}

impl UsagesSession {
    pub(crate) fn new(
        deps: &SessionDeps,
        params: SessionParams,
    ) -> (Self, SessionHandle, mpsc::Receiver<UiEvent>) {
        let (tx, rx) = mpsc::channel(deps.config.ui_channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let (state, state_rx) = watch::channel(SessionState::Initializing);
        let handle = SessionHandle::new(tx.clone(), cancel.clone(), state_rx);

        let settings = SettingsOverride::apply(Arc::clone(&deps.settings));
        let view = (deps.view_factory)(&settings.active());
        let name = params.handler.presentable_name();
        let ad_text = presentation::second_invocation_text(
            &deps.config.keymap,
            params.handler.as_ref(),
            &params.options,
        );

        let session = Self {
            deps: deps.clone(),
            title: presentation::usages_title(&name),
            scope: params.options.scope.display_name(),
            name,
            ad_text,
            params,
            settings,
            view,
            tx,
            cancel,
            state,
            model: PopupModel::new(),
            popup_shown: false,
            search_done: false,
        };
        (session, handle, rx)
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Drive the session to a terminal outcome.
    pub(crate) async fn run(mut self, mut rx: mpsc::Receiver<UiEvent>) -> SessionOutcome {
        let refresher = ThrottledRefresher::spawn(
            self.deps.config.refresh_interval(),
            self.tx.clone(),
            UiEvent::Refresh,
            self.cancel.child_token(),
        );
        let collector = Arc::new(
            UsageCollector::new(
                Arc::clone(&self.params.handler),
                Arc::clone(&self.view),
                self.params.max_usages,
                refresher.trigger(),
                self.cancel.clone(),
            )
            .with_filter(self.deps.filter.clone())
            .with_transform(self.deps.transform.clone()),
        );

        let engine = Arc::clone(&self.deps.engine);
        let request = self.params.handler.request(&self.params.options);
        let sink: Arc<dyn UsageSink> = collector.clone();
        let token = self.cancel.clone();
        let mut search = tokio::spawn(async move { engine.search(request, sink, token).await });

        info!(
            target_name = %self.name,
            scope = %self.scope,
            max_usages = self.params.max_usages,
            "usage search started"
        );
        self.set_state(SessionState::Searching);

        let show_delay = tokio::time::sleep(self.deps.config.show_delay());
        tokio::pin!(show_delay);
        let cancel = self.cancel.clone();

        let outcome = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break SessionOutcome::Cancelled,
                result = &mut search, if !self.search_done => {
                    self.search_done = true;
                    log_search_result(result);
                    if let Some(outcome) = self.on_search_finished(&collector).await {
                        break outcome;
                    }
                }
                event = rx.recv() => match event {
                    Some(UiEvent::Refresh) => self.on_refresh(&collector),
                    Some(UiEvent::User(action)) => {
                        if let Some(outcome) = self.on_user_action(action, &collector) {
                            break outcome;
                        }
                    }
                    None => break SessionOutcome::Cancelled,
                },
                _ = &mut show_delay, if !self.popup_shown && !self.search_done => {
                    debug!("show delay elapsed");
                    self.show_popup(&collector.snapshot());
                }
            }
        };

        self.cancel.cancel();
        drop(refresher);
        self.close_popup();
        // before the terminal state, so a waiting successor sees restored settings
        self.settings.restore();
        self.set_state(outcome.state());
        info!(
            outcome = %outcome.state(),
            usages = collector.usage_count(),
            "usage session finished"
        );
        outcome
    }

    /// The row model, the view and the rebuild inputs, borrowed disjointly.
    fn parts(&mut self) -> (&mut PopupModel, &dyn UsageView, RebuildContext<'_>) {
        let ctx = RebuildContext {
            title: &self.title,
            name: &self.name,
            scope: &self.scope,
            ad_text: self.ad_text.as_deref(),
            in_progress: !self.search_done,
            max_visible_rows: self.deps.config.max_visible_rows,
            available_rows: self.deps.host.available_rows(),
        };
        (&mut self.model, self.view.as_ref(), ctx)
    }

    fn rebuild(&mut self, snapshot: &ResultSnapshot) -> PopupView {
        let (model, view, ctx) = self.parts();
        model.rebuild(snapshot, view, &ctx)
    }

    fn show_popup(&mut self, snapshot: &ResultSnapshot) {
        let view = self.rebuild(snapshot);
        self.deps.host.show_popup(&view);
        self.popup_shown = true;
        self.set_state(SessionState::PopupVisible);
    }

    fn close_popup(&mut self) {
        if self.popup_shown {
            self.deps.host.close_popup();
            self.popup_shown = false;
        }
    }

    /// Re-collect rows and push them to the popup if it is showing.
    fn refresh_rows(&mut self, collector: &UsageCollector) {
        let snapshot = collector.snapshot();
        let view = self.rebuild(&snapshot);
        if self.popup_shown {
            self.deps.host.update_popup(&view);
        }
    }

    /// Re-render after a selection change without touching the rows.
    fn repaint(&mut self, collector: &UsageCollector) {
        if !self.popup_shown {
            return;
        }
        let snapshot = collector.snapshot();
        let (model, view, ctx) = self.parts();
        let view = model.render(&snapshot, view, &ctx);
        self.deps.host.update_popup(&view);
    }

    fn on_refresh(&mut self, collector: &UsageCollector) {
        if self.popup_shown {
            self.refresh_rows(collector);
            return;
        }
        let snapshot = collector.snapshot();
        // several results are worth showing right away
        if snapshot.node_count() > 1 {
            self.show_popup(&snapshot);
        }
    }

    async fn on_search_finished(&mut self, collector: &UsageCollector) -> Option<SessionOutcome> {
        let snapshot = collector.snapshot();
        let usages = snapshot.usage_count();
        let host = Arc::clone(&self.deps.host);

        if snapshot.node_count() == 0 && usages == 0 {
            let hint = Hint::info(format!("No usages found in {}", self.scope))
                .with_secondary(self.ad_text.clone());
            host.show_hint(&hint);
            let maximal = self.params.handler.maximal_scope();
            let escalation = (self.params.options.scope != maximal)
                .then(|| self.params.options.with_scope(maximal));
            return Some(SessionOutcome::NoUsages { escalation });
        }

        if let Some(usage) = snapshot.single_node().cloned() {
            if usages == 1 {
                if !host.navigate(&usage) {
                    warn!(usage = %usage.text, "cannot navigate to the only usage");
                }
                return Some(SessionOutcome::NavigatedSingle { usage });
            }
            if snapshot.all_on_line_of(&usage) {
                if !host.navigate(&usage) {
                    warn!(usage = %usage.text, "cannot navigate to the usage line");
                }
                self.close_popup();
                host.wait_until_settled().await;
                let hint = Hint::info(format!("All {usages} usages are in this line"))
                    .with_secondary(self.ad_text.clone());
                host.show_hint(&hint);
                return Some(SessionOutcome::NavigatedSingle { usage });
            }
        }

        if self.popup_shown {
            self.refresh_rows(collector);
        } else {
            self.show_popup(&snapshot);
        }
        debug!(
            usages,
            nodes = snapshot.node_count(),
            truncated = snapshot.has_more,
            "search finished with popup open"
        );
        None
    }

    fn on_user_action(
        &mut self,
        action: UserAction,
        collector: &UsageCollector,
    ) -> Option<SessionOutcome> {
        match action {
            UserAction::Select(row) => {
                if self.model.select(row) {
                    self.repaint(collector);
                } else {
                    warn!(row, "selection out of range");
                }
                None
            }
            UserAction::Choose(row) => {
                let row = row.or(self.model.selected())?;
                match self.model.rows().get(row).cloned() {
                    Some(UsageNode::MoreUsages) => Some(SessionOutcome::ShowMore {
                        max_usages: self.params.max_usages + self.deps.config.page_size,
                    }),
                    Some(UsageNode::Usage(node)) => {
                        if !self.deps.host.navigate(&node.usage) {
                            warn!(usage = %node.usage.text, "cannot navigate to usage");
                        }
                        Some(SessionOutcome::Navigated { usage: node.usage })
                    }
                    Some(UsageNode::Text(_)) | None => None,
                }
            }
            UserAction::SpeedSearch(query) => {
                if self.model.speed_search(&query, self.view.as_ref()).is_some() {
                    self.repaint(collector);
                }
                None
            }
            UserAction::Invoke(id) => {
                let result = {
                    let ctx = ActionContext {
                        handler: self.params.handler.as_ref(),
                        options: &self.params.options,
                        host: self.deps.host.as_ref(),
                        view: self.view.as_ref(),
                        settings: self.settings.store().as_ref(),
                        keymap: &self.deps.config.keymap,
                    };
                    self.deps.actions.invoke(id, &ctx)
                };
                match result {
                    None => {
                        warn!(action = %id, "action is not available");
                        None
                    }
                    Some(ActionResult::Handled) => None,
                    Some(ActionResult::Refresh) => {
                        self.refresh_rows(collector);
                        None
                    }
                    Some(ActionResult::Finish(outcome)) => Some(outcome),
                }
            }
            UserAction::Close => Some(SessionOutcome::Cancelled),
        }
    }
}

fn log_search_result(result: Result<Result<SearchSummary, SearchError>, JoinError>) {
    let failure = match result {
        Ok(Ok(summary)) => {
            debug!(
                offered = summary.offered,
                stopped_early = summary.stopped_early,
                "usage search finished"
            );
            return;
        }
        Ok(Err(SearchError::Cancelled)) => {
            debug!("usage search cancelled");
            return;
        }
        Ok(Err(err)) => ShowUsagesError::SearchProducerFailure(err.to_string()),
        Err(err) => ShowUsagesError::SearchProducerFailure(err.to_string()),
    };
    error!("{}", failure);
}
