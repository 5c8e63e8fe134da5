//! Entry point: resolves what to search for and runs popup sessions,
//! relaunching them for "show more", "search everywhere" and settings.

use crate::actions::ActionRegistry;
use crate::collector::{UsagePredicate, UsageTransform};
use crate::config::ShowUsagesConfig;
use crate::error::{Result, ShowUsagesError};
use crate::host::{Hint, PopupHost};
use crate::session::{
    SessionDeps, SessionHandle, SessionOutcome, SessionParams, SessionState, UserAction,
    UsagesSession,
};
use crate::settings::DisplaySettingsStore;
use crate::view::{ViewFactory, grouped_view_factory};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};
use usagescope_api::{
    ApiError, PositionContext, ResolveResult, SearchTarget, TargetResolver, UsageSearchEngine,
};

/// What the user invoked Show Usages on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// A caret position; the target is resolved from it.
    At(PositionContext),
    /// An already resolved element.
    Target(SearchTarget),
}

pub struct ShowUsagesBuilder {
    engine: Arc<dyn UsageSearchEngine>,
    host: Arc<dyn PopupHost>,
    resolver: Option<Arc<dyn TargetResolver>>,
    config: ShowUsagesConfig,
    settings: Option<Arc<DisplaySettingsStore>>,
    actions: Option<ActionRegistry>,
    view_factory: Option<ViewFactory>,
    filter: Option<UsagePredicate>,
    transform: Option<UsageTransform>,
}

impl ShowUsagesBuilder {
    pub fn new(engine: Arc<dyn UsageSearchEngine>, host: Arc<dyn PopupHost>) -> Self {
        Self {
            engine,
            host,
            resolver: None,
            config: ShowUsagesConfig::default(),
            settings: None,
            actions: None,
            view_factory: None,
            filter: None,
            transform: None,
        }
    }

    pub fn resolver(mut self, resolver: Arc<dyn TargetResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(mut self, config: ShowUsagesConfig) -> Self {
        self.config = config;
        self
    }

    pub fn settings(mut self, settings: Arc<DisplaySettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn view_factory(mut self, factory: ViewFactory) -> Self {
        self.view_factory = Some(factory);
        self
    }

    /// Only usages passing `filter` are collected.
    pub fn filter(mut self, filter: UsagePredicate) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Substitute or veto usages before they are collected.
    pub fn transform(mut self, transform: UsageTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn build(self) -> ShowUsages {
        let settings = self.settings.unwrap_or_else(|| {
            Arc::new(DisplaySettingsStore::new(
                Default::default(),
                self.config.popup_settings.clone(),
            ))
        });
        ShowUsages {
            deps: SessionDeps {
                engine: self.engine,
                host: self.host,
                config: Arc::new(self.config),
                actions: Arc::new(self.actions.unwrap_or_default()),
                settings,
                view_factory: self.view_factory.unwrap_or_else(grouped_view_factory),
                filter: self.filter,
                transform: self.transform,
            },
            resolver: self.resolver,
            pending_escalation: Mutex::new(None),
            current: Mutex::new(None),
            epoch: AtomicU64::new(0),
        }
    }
}

/// The Show Usages action.
pub struct ShowUsages {
    deps: SessionDeps,
    resolver: Option<Arc<dyn TargetResolver>>,
    /// Wider search offered by the last "no usages" hint.
    pending_escalation: Mutex<Option<SessionParams>>,
    current: Mutex<Option<SessionHandle>>,
    /// Bumped per invocation; an outdated relaunch loop stops.
    epoch: AtomicU64,
}

impl ShowUsages {
    pub fn builder(engine: Arc<dyn UsageSearchEngine>, host: Arc<dyn PopupHost>) -> ShowUsagesBuilder {
        ShowUsagesBuilder::new(engine, host)
    }

    pub fn config(&self) -> &ShowUsagesConfig {
        &self.deps.config
    }

    pub fn settings(&self) -> &Arc<DisplaySettingsStore> {
        &self.deps.settings
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.deps.actions
    }

    /// Run Show Usages until the popup is gone for good. Relaunches for
    /// "show more", "search everywhere" and edited settings happen inside.
    pub async fn invoke(&self, invocation: Invocation) -> Result<SessionOutcome> {
        if let Some(params) = self.take_pending_escalation() {
            info!(scope = %params.options.scope, "repeated invocation widens the search");
            self.deps.host.hide_hints();
            return Ok(self.run_sessions(params).await);
        }

        let target = match invocation {
            Invocation::Target(target) => target,
            Invocation::At(position) => self.resolve(&position).await?,
        };
        let params = self.params_for(&target)?;
        Ok(self.run_sessions(params).await)
    }

    /// Start from explicit parameters, skipping resolution.
    pub async fn show(&self, params: SessionParams) -> SessionOutcome {
        self.run_sessions(params).await
    }

    pub fn params_for(&self, target: &SearchTarget) -> Result<SessionParams> {
        let handler = self
            .deps
            .engine
            .create_handler(target)
            .ok_or_else(|| ShowUsagesError::UnsupportedTarget(target.name.clone()))?;
        let options = handler.default_options();
        Ok(SessionParams::new(handler, options, self.deps.config.page_size))
    }

    async fn resolve(&self, position: &PositionContext) -> Result<SearchTarget> {
        let resolved = match &self.resolver {
            Some(resolver) => match resolver.resolve_at(position).await {
                Ok(resolved) => resolved,
                Err(ApiError::NotFound(_)) => ResolveResult::NotFound,
                Err(err) => return Err(err.into()),
            },
            None => ResolveResult::NotFound,
        };
        match resolved {
            ResolveResult::Found(target) => Ok(target),
            ResolveResult::Ambiguous(candidates) => {
                match self.deps.host.choose_target(&candidates) {
                    Some(target) => Ok(target),
                    None => {
                        let err = ShowUsagesError::AmbiguousTargetUnresolved;
                        self.deps.host.show_hint(&Hint::error(err.to_string()));
                        Err(err)
                    }
                }
            }
            ResolveResult::NotFound => {
                let err = ShowUsagesError::NoTargetResolved;
                self.deps.host.show_message(&err.to_string());
                Err(err)
            }
        }
    }

    async fn run_sessions(&self, mut params: SessionParams) -> SessionOutcome {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        loop {
            let outcome = self.run_session(params.clone()).await;
            match &outcome {
                SessionOutcome::ShowMore { max_usages } => {
                    params.max_usages = *max_usages;
                }
                SessionOutcome::SearchEverywhere { options }
                | SessionOutcome::Reconfigured { options } => {
                    params.options = options.clone();
                }
                SessionOutcome::NoUsages {
                    escalation: Some(options),
                } => {
                    let escalated = SessionParams {
                        options: options.clone(),
                        ..params
                    };
                    *self.lock_pending() = Some(escalated);
                    return outcome;
                }
                _ => return outcome,
            }
            if self.epoch.load(Ordering::SeqCst) != epoch {
                info!(outcome = %outcome.state(), "newer invocation took over");
                return SessionOutcome::Cancelled;
            }
            info!(?params, outcome = %outcome.state(), "relaunching usage session");
        }
    }

    async fn run_session(&self, params: SessionParams) -> SessionOutcome {
        // the previous session must restore its display settings first
        let (session, handle, rx) = loop {
            let previous = {
                let mut current = self.lock_current();
                match current.take() {
                    Some(previous) => previous,
                    None => {
                        let (session, handle, rx) = UsagesSession::new(&self.deps, params.clone());
                        *current = Some(handle.clone());
                        break (session, handle, rx);
                    }
                }
            };
            previous.cancel();
            previous.finished().await;
        };
        let outcome = session.run(rx).await;

        let mut current = self.lock_current();
        if current.as_ref().is_some_and(|h| h.is_same(&handle)) {
            *current = None;
        }
        outcome
    }

    /// Forward a user action to the running session.
    pub fn dispatch(&self, action: UserAction) -> bool {
        match self.lock_current().as_ref() {
            Some(handle) => handle.send(action),
            None => {
                warn!(?action, "no usage session to receive the action");
                false
            }
        }
    }

    /// Close the popup of the running session, if any.
    pub fn close(&self) {
        if let Some(handle) = self.lock_current().as_ref() {
            handle.cancel();
        }
    }

    pub fn state(&self) -> Option<SessionState> {
        self.lock_current().as_ref().map(SessionHandle::state)
    }

    pub fn has_pending_escalation(&self) -> bool {
        self.lock_pending().is_some()
    }

    /// Hints went away; a repeated invocation starts over.
    pub fn hide_hints(&self) {
        self.lock_pending().take();
        self.deps.host.hide_hints();
    }

    fn take_pending_escalation(&self) -> Option<SessionParams> {
        self.lock_pending().take()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<SessionParams>> {
        self.pending_escalation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<SessionHandle>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
