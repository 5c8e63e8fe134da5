use crate::models::{GroupId, NodeId, Usage, UsageKind, UsageNodeRef};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A display filter the user can toggle from the popup toolbar.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FilterRule {
    Imports,
    Comments,
    Reads,
    Writes,
}

impl FilterRule {
    pub const ALL: [FilterRule; 4] = [
        FilterRule::Imports,
        FilterRule::Comments,
        FilterRule::Reads,
        FilterRule::Writes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterRule::Imports => "Show import statements",
            FilterRule::Comments => "Show usages in comments",
            FilterRule::Reads => "Show read access",
            FilterRule::Writes => "Show write access",
        }
    }

    fn matches(&self, kind: UsageKind) -> bool {
        matches!(
            (self, kind),
            (FilterRule::Imports, UsageKind::Import)
                | (FilterRule::Comments, UsageKind::Comment)
                | (FilterRule::Reads, UsageKind::Read)
                | (FilterRule::Writes, UsageKind::Write)
        )
    }
}

/// Set of active "hide" rules. Empty means everything is visible.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageFilterRules {
    #[serde(default)]
    pub hidden: Vec<FilterRule>,
}

impl UsageFilterRules {
    pub fn is_hidden(&self, rule: FilterRule) -> bool {
        self.hidden.contains(&rule)
    }

    pub fn allows(&self, usage: &Usage) -> bool {
        !self.hidden.iter().any(|rule| rule.matches(usage.kind))
    }

    /// Flip a rule; returns `true` if the rule now hides usages.
    pub fn toggle(&mut self, rule: FilterRule) -> bool {
        if let Some(pos) = self.hidden.iter().position(|r| *r == rule) {
            self.hidden.remove(pos);
            false
        } else {
            self.hidden.push(rule);
            self.hidden.sort();
            true
        }
    }
}

/// Grouping and de-duplication collaborator.
///
/// All methods are called with the collector lock held, so implementations
/// must not call back into the collector.
pub trait UsageView: Send + Sync {
    /// Register an accepted usage. Returns the node created for it, or
    /// `None` if the usage collapsed into an existing node or is hidden by
    /// the active filters.
    fn register_usage(&self, usage: &Arc<Usage>) -> Option<UsageNodeRef>;

    /// Whether the usage passes the currently active display filters.
    fn is_visible(&self, usage: &Usage) -> bool;

    /// Depth-first enumeration of nodes passing the display filters: a
    /// group's own nodes first, then its subgroups.
    fn visible_nodes(&self) -> Vec<UsageNodeRef>;

    /// Label of the group a node belongs to (root has none).
    fn group_label(&self, group: GroupId) -> Option<String>;

    /// Number of raw usages merged into `node`, including its own.
    fn merged_count(&self, node: NodeId) -> usize;

    fn filter_rules(&self) -> UsageFilterRules {
        UsageFilterRules::default()
    }

    /// Toggle a display filter. Views without filtering return `false`.
    fn toggle_rule(&self, _rule: FilterRule) -> bool {
        false
    }
}
