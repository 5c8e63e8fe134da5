use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;
use usagescope_api::{FilterRule, UsageFilterRules};

/// How usage views group and filter their nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub group_by_usage_type: bool,
    /// Group by containing directory.
    pub group_by_package: bool,
    /// Group by file.
    pub group_by_file_structure: bool,
    /// Separate test code from production code.
    pub group_by_scope: bool,
    /// Collapse usages on the same file line into one node.
    pub merge_same_line: bool,
    pub filters: UsageFilterRules,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            group_by_usage_type: true,
            group_by_package: true,
            group_by_file_structure: false,
            group_by_scope: false,
            merge_same_line: true,
            filters: UsageFilterRules::default(),
        }
    }
}

impl DisplaySettings {
    /// Profile used while the usages popup is open: flat list grouped by
    /// usage type only.
    pub fn popup() -> Self {
        Self {
            group_by_usage_type: true,
            group_by_package: false,
            group_by_file_structure: false,
            group_by_scope: false,
            ..Self::default()
        }
    }
}

/// The global display settings plus the saved popup profile.
#[derive(Debug)]
pub struct DisplaySettingsStore {
    global: RwLock<DisplaySettings>,
    popup: RwLock<DisplaySettings>,
}

impl Default for DisplaySettingsStore {
    fn default() -> Self {
        Self::new(DisplaySettings::default(), DisplaySettings::popup())
    }
}

impl DisplaySettingsStore {
    pub fn new(global: DisplaySettings, popup: DisplaySettings) -> Self {
        Self {
            global: RwLock::new(global),
            popup: RwLock::new(popup),
        }
    }

    pub fn global(&self) -> DisplaySettings {
        self.global
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn popup(&self) -> DisplaySettings {
        self.popup
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_global(&self, settings: DisplaySettings) {
        *self.global.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    fn set_popup(&self, settings: DisplaySettings) {
        *self.popup.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Record a filter toggle in the active settings.
    pub fn toggle_filter(&self, rule: FilterRule) -> bool {
        let mut global = self.global.write().unwrap_or_else(PoisonError::into_inner);
        global.filters.toggle(rule)
    }
}

/// Swaps the popup profile in as the global settings for the lifetime of a
/// session. On restore (or drop) the active settings are saved back as the
/// popup profile and the previous global settings come back.
///
/// Overrides must not overlap: the launcher waits for the previous session
/// to restore before applying the next one.
pub struct SettingsOverride {
    store: Arc<DisplaySettingsStore>,
    saved: DisplaySettings,
    restored: bool,
}

impl SettingsOverride {
    pub fn apply(store: Arc<DisplaySettingsStore>) -> Self {
        let saved = store.global();
        store.set_global(store.popup());
        Self {
            store,
            saved,
            restored: false,
        }
    }

    /// Put the saved global settings back. Later calls do nothing.
    pub fn restore(&mut self) {
        if std::mem::replace(&mut self.restored, true) {
            return;
        }
        let active = self.store.global();
        self.store.set_popup(active);
        self.store.set_global(self.saved.clone());
        debug!("restored global display settings");
    }

    pub fn active(&self) -> DisplaySettings {
        self.store.global()
    }

    pub fn store(&self) -> &Arc<DisplaySettingsStore> {
        &self.store
    }
}

impl Drop for SettingsOverride {
    fn drop(&mut self) {
        self.restore();
    }
}
