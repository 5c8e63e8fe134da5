//! Popup toolbar actions, composed into a registry.

use crate::config::Keymap;
use crate::host::PopupHost;
use crate::session::SessionOutcome;
use crate::settings::DisplaySettingsStore;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use usagescope_api::{FilterRule, SearchHandler, SearchOptions, UsageView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    SearchEverywhere,
    OpenFullView,
    OpenSettings,
    ToggleFilter(FilterRule),
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::SearchEverywhere => f.write_str("search-everywhere"),
            ActionId::OpenFullView => f.write_str("open-full-view"),
            ActionId::OpenSettings => f.write_str("open-settings"),
            ActionId::ToggleFilter(rule) => write!(f, "toggle-filter({rule:?})"),
        }
    }
}

/// What a session knows when an action runs.
pub struct ActionContext<'a> {
    pub handler: &'a dyn SearchHandler,
    pub options: &'a SearchOptions,
    pub host: &'a dyn PopupHost,
    pub view: &'a dyn UsageView,
    pub settings: &'a DisplaySettingsStore,
    pub keymap: &'a Keymap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    Handled,
    /// Display rules changed; rebuild the rows.
    Refresh,
    /// End the session.
    Finish(SessionOutcome),
}

pub trait PopupAction: Send + Sync {
    fn id(&self) -> ActionId;

    fn label(&self) -> String;

    fn shortcut(&self, _keymap: &Keymap) -> Option<String> {
        None
    }

    fn is_enabled(&self, _ctx: &ActionContext<'_>) -> bool {
        true
    }

    fn invoke(&self, ctx: &ActionContext<'_>) -> ActionResult;
}

pub struct SearchEverywhereAction;

impl PopupAction for SearchEverywhereAction {
    fn id(&self) -> ActionId {
        ActionId::SearchEverywhere
    }

    fn label(&self) -> String {
        "Search everywhere".to_string()
    }

    fn shortcut(&self, keymap: &Keymap) -> Option<String> {
        keymap.show_usages.clone()
    }

    fn is_enabled(&self, ctx: &ActionContext<'_>) -> bool {
        ctx.options.scope != ctx.handler.maximal_scope()
    }

    fn invoke(&self, ctx: &ActionContext<'_>) -> ActionResult {
        let options = ctx.options.with_scope(ctx.handler.maximal_scope());
        ActionResult::Finish(SessionOutcome::SearchEverywhere { options })
    }
}

pub struct OpenFullViewAction;

impl PopupAction for OpenFullViewAction {
    fn id(&self) -> ActionId {
        ActionId::OpenFullView
    }

    fn label(&self) -> String {
        "Open Find Usages".to_string()
    }

    fn shortcut(&self, keymap: &Keymap) -> Option<String> {
        keymap.find_usages.clone()
    }

    fn invoke(&self, ctx: &ActionContext<'_>) -> ActionResult {
        ctx.host.hide_hints();
        ctx.host.open_full_view(&ctx.handler.request(ctx.options));
        ActionResult::Finish(SessionOutcome::HandedOff)
    }
}

pub struct OpenSettingsAction;

impl PopupAction for OpenSettingsAction {
    fn id(&self) -> ActionId {
        ActionId::OpenSettings
    }

    fn label(&self) -> String {
        "Settings...".to_string()
    }

    fn shortcut(&self, keymap: &Keymap) -> Option<String> {
        keymap.show_usages_with_settings.clone()
    }

    fn invoke(&self, ctx: &ActionContext<'_>) -> ActionResult {
        match ctx.host.edit_options(ctx.handler, ctx.options) {
            Some(options) => ActionResult::Finish(SessionOutcome::Reconfigured { options }),
            None => ActionResult::Finish(SessionOutcome::Cancelled),
        }
    }
}

pub struct ToggleFilterAction {
    pub rule: FilterRule,
}

impl PopupAction for ToggleFilterAction {
    fn id(&self) -> ActionId {
        ActionId::ToggleFilter(self.rule)
    }

    fn label(&self) -> String {
        self.rule.label().to_string()
    }

    fn invoke(&self, ctx: &ActionContext<'_>) -> ActionResult {
        let hidden = ctx.view.toggle_rule(self.rule);
        ctx.settings.toggle_filter(self.rule);
        debug!(rule = ?self.rule, hidden, "display filter toggled");
        ActionResult::Refresh
    }
}

/// Ordered set of actions offered by the popup.
pub struct ActionRegistry {
    actions: Vec<Arc<dyn PopupAction>>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActionRegistry {
    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(SearchEverywhereAction));
        registry.register(Arc::new(OpenFullViewAction));
        registry.register(Arc::new(OpenSettingsAction));
        for rule in FilterRule::ALL {
            registry.register(Arc::new(ToggleFilterAction { rule }));
        }
        registry
    }

    /// Add an action, replacing any action with the same id.
    pub fn register(&mut self, action: Arc<dyn PopupAction>) {
        self.actions.retain(|a| a.id() != action.id());
        self.actions.push(action);
    }

    pub fn get(&self, id: ActionId) -> Option<&Arc<dyn PopupAction>> {
        self.actions.iter().find(|a| a.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn PopupAction>> {
        self.actions.iter()
    }

    /// Run `id` if it is registered and enabled.
    pub fn invoke(&self, id: ActionId, ctx: &ActionContext<'_>) -> Option<ActionResult> {
        let action = self.get(id)?;
        if !action.is_enabled(ctx) {
            return None;
        }
        Some(action.invoke(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Hint;
    use crate::presentation::PopupView;
    use crate::settings::DisplaySettings;
    use crate::view::GroupedUsageView;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use usagescope_api::{
        SearchRequest, SearchScope, SearchTarget, TargetHandler, Usage,
    };

    #[derive(Default)]
    struct StubHost {
        full_views: Mutex<Vec<SearchRequest>>,
        edited: Option<SearchOptions>,
    }

    #[async_trait]
    impl PopupHost for StubHost {
        fn show_popup(&self, _view: &PopupView) {}
        fn update_popup(&self, _view: &PopupView) {}
        fn close_popup(&self) {}
        fn navigate(&self, _usage: &Usage) -> bool {
            true
        }
        fn show_hint(&self, _hint: &Hint) {}
        fn hide_hints(&self) {}
        fn show_message(&self, _text: &str) {}
        fn open_full_view(&self, request: &SearchRequest) {
            self.full_views.lock().unwrap().push(request.clone());
        }
        fn edit_options(
            &self,
            _handler: &dyn SearchHandler,
            _options: &SearchOptions,
        ) -> Option<SearchOptions> {
            self.edited.clone()
        }
        fn choose_target(&self, _candidates: &[SearchTarget]) -> Option<SearchTarget> {
            None
        }
    }

    struct Fixture {
        handler: TargetHandler,
        host: StubHost,
        view: GroupedUsageView,
        settings: DisplaySettingsStore,
        keymap: Keymap,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                handler: TargetHandler::new(
                    SearchTarget::new("foo"),
                    SearchOptions::new(SearchScope::Project),
                    SearchScope::Everywhere,
                ),
                host: StubHost::default(),
                view: GroupedUsageView::new(&DisplaySettings::popup()),
                settings: DisplaySettingsStore::default(),
                keymap: Keymap::default(),
            }
        }

        fn ctx<'a>(&'a self, options: &'a SearchOptions) -> ActionContext<'a> {
            ActionContext {
                handler: &self.handler,
                options,
                host: &self.host,
                view: &self.view,
                settings: &self.settings,
                keymap: &self.keymap,
            }
        }
    }

    #[test]
    fn search_everywhere_only_below_maximal_scope() {
        let fixture = Fixture::new();
        let registry = ActionRegistry::standard();

        let project = SearchOptions::new(SearchScope::Project);
        let result = registry.invoke(ActionId::SearchEverywhere, &fixture.ctx(&project));
        assert_eq!(
            result,
            Some(ActionResult::Finish(SessionOutcome::SearchEverywhere {
                options: project.with_scope(SearchScope::Everywhere)
            }))
        );

        let everywhere = SearchOptions::new(SearchScope::Everywhere);
        assert_eq!(registry.invoke(ActionId::SearchEverywhere, &fixture.ctx(&everywhere)), None);
    }

    #[test]
    fn open_full_view_hands_off_same_request() {
        let fixture = Fixture::new();
        let options = SearchOptions::new(SearchScope::Project);
        let result = ActionRegistry::standard().invoke(ActionId::OpenFullView, &fixture.ctx(&options));
        assert_eq!(result, Some(ActionResult::Finish(SessionOutcome::HandedOff)));

        let views = fixture.host.full_views.lock().unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].options, options);
        assert_eq!(views[0].primary[0].name, "foo");
    }

    #[test]
    fn settings_dialog_outcome_depends_on_confirmation() {
        let mut fixture = Fixture::new();
        let options = SearchOptions::new(SearchScope::Project);
        let registry = ActionRegistry::standard();
        assert_eq!(
            registry.invoke(ActionId::OpenSettings, &fixture.ctx(&options)),
            Some(ActionResult::Finish(SessionOutcome::Cancelled))
        );

        let edited = options.with_scope(SearchScope::Directory("/src".into()));
        fixture.host.edited = Some(edited.clone());
        assert_eq!(
            registry.invoke(ActionId::OpenSettings, &fixture.ctx(&options)),
            Some(ActionResult::Finish(SessionOutcome::Reconfigured { options: edited }))
        );
    }

    #[test]
    fn toggling_a_filter_updates_view_and_settings() {
        let fixture = Fixture::new();
        let options = SearchOptions::new(SearchScope::Project);
        let result = ActionRegistry::standard()
            .invoke(ActionId::ToggleFilter(FilterRule::Comments), &fixture.ctx(&options));
        assert_eq!(result, Some(ActionResult::Refresh));
        assert!(fixture.view.filter_rules().is_hidden(FilterRule::Comments));
        assert!(fixture.settings.global().filters.is_hidden(FilterRule::Comments));
    }
}
