//! Default grouping/de-duplication view used by popup sessions.

mod tree;

use crate::settings::DisplaySettings;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tree::{MergeKey, UsageTree};
use usagescope_api::{
    FilterRule, GroupId, NodeId, Usage, UsageFilterRules, UsageNodeRef, UsageView,
};

/// Builds the view for a new session from the active display settings.
pub type ViewFactory = Arc<dyn Fn(&DisplaySettings) -> Arc<dyn UsageView> + Send + Sync>;

pub fn grouped_view_factory() -> ViewFactory {
    Arc::new(|settings: &DisplaySettings| -> Arc<dyn UsageView> {
        Arc::new(GroupedUsageView::new(settings))
    })
}

/// Test code lives under a `test`/`tests` directory or in a `*_test` file.
fn is_test_path(path: &Path) -> bool {
    let in_test_dir = path.parent().is_some_and(|dir| {
        dir.components()
            .any(|c| matches!(c.as_os_str().to_str(), Some("test" | "tests")))
    });
    let test_file = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with("_test") || stem.ends_with("_tests"));
    in_test_dir || test_file
}

/// Groups usages by the enabled rules (scope, usage kind, directory, file),
/// merges usages sharing a file line and applies the display filter rules.
pub struct GroupedUsageView {
    tree: Mutex<UsageTree>,
    rules: RwLock<UsageFilterRules>,
    group_by_scope: bool,
    group_by_usage_type: bool,
    group_by_package: bool,
    group_by_file_structure: bool,
    merge_same_line: bool,
}

impl GroupedUsageView {
    pub fn new(settings: &DisplaySettings) -> Self {
        Self {
            tree: Mutex::new(UsageTree::new()),
            rules: RwLock::new(settings.filters.clone()),
            group_by_scope: settings.group_by_scope,
            group_by_usage_type: settings.group_by_usage_type,
            group_by_package: settings.group_by_package,
            group_by_file_structure: settings.group_by_file_structure,
            merge_same_line: settings.merge_same_line,
        }
    }

    pub fn node_count(&self) -> usize {
        self.tree
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .nodes
            .len()
    }

    /// Group names for `usage`, outermost first.
    fn group_names(&self, usage: &Usage) -> Vec<String> {
        let location = usage.location.as_ref();
        let mut names = Vec::new();
        if self.group_by_scope {
            let test = location.is_some_and(|loc| is_test_path(&loc.path));
            names.push(if test { "Test" } else { "Production" }.to_string());
        }
        if self.group_by_usage_type {
            names.push(usage.kind.group_name().to_string());
        }
        if self.group_by_package {
            if let Some(dir) = location.and_then(|loc| loc.path.parent()) {
                names.push(dir.display().to_string());
            }
        }
        if self.group_by_file_structure {
            if let Some(file) = location.and_then(|loc| loc.file_name()) {
                names.push(file.to_string());
            }
        }
        names
    }

    fn merge_key(&self, usage: &Usage) -> Option<MergeKey> {
        if !self.merge_same_line {
            return None;
        }
        usage.location.as_ref().map(|loc| MergeKey {
            path: loc.path.clone(),
            line: loc.line(),
        })
    }
}

impl UsageView for GroupedUsageView {
    fn register_usage(&self, usage: &Arc<Usage>) -> Option<UsageNodeRef> {
        let mut tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        let key = self.merge_key(usage);
        if let Some(key) = &key {
            if tree.merge_into_existing(key).is_some() {
                return None;
            }
        }
        let group = self
            .group_names(usage)
            .into_iter()
            .fold(GroupId::ROOT, |parent, name| tree.child_group(parent, name));
        let id = tree.add_node(group, Arc::clone(usage), key);
        // kept in the tree so a later rule change can reveal it
        if !self.is_visible(usage) {
            return None;
        }
        Some(UsageNodeRef {
            id,
            group,
            usage: Arc::clone(usage),
        })
    }

    fn is_visible(&self, usage: &Usage) -> bool {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .allows(usage)
    }

    fn visible_nodes(&self) -> Vec<UsageNodeRef> {
        let rules = self.filter_rules();
        let tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out = Vec::new();
        tree.walk(GroupId::ROOT, &mut |id, entry| {
            if rules.allows(&entry.usage) {
                out.push(UsageNodeRef {
                    id,
                    group: entry.group,
                    usage: Arc::clone(&entry.usage),
                });
            }
        });
        out
    }

    fn group_label(&self, group: GroupId) -> Option<String> {
        if group == GroupId::ROOT {
            return None;
        }
        let tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        let path = tree.group_path(group);
        (!path.is_empty()).then(|| path.join(" > "))
    }

    fn merged_count(&self, node: NodeId) -> usize {
        let tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        tree.node(node).map(|n| n.merged).unwrap_or(0)
    }

    fn filter_rules(&self) -> UsageFilterRules {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn toggle_rule(&self, rule: FilterRule) -> bool {
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .toggle(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usagescope_api::{Range, UsageKind, UsageLocation};

    fn usage(line: usize, col: usize, kind: UsageKind) -> Arc<Usage> {
        Arc::new(
            Usage::at(
                UsageLocation::new("/src/main.rs", Range::on_line(line, col, 3)),
                format!("line {line}"),
            )
            .with_kind(kind),
        )
    }

    #[test]
    fn usages_on_one_line_collapse_into_one_node() {
        let view = GroupedUsageView::new(&DisplaySettings::popup());
        let first = view.register_usage(&usage(4, 0, UsageKind::Read));
        let second = view.register_usage(&usage(4, 10, UsageKind::Read));

        let first = first.expect("first usage creates a node");
        assert!(second.is_none());
        assert_eq!(view.merged_count(first.id), 2);
        assert_eq!(view.visible_nodes().len(), 1);
    }

    #[test]
    fn merging_can_be_disabled() {
        let settings = DisplaySettings {
            merge_same_line: false,
            ..DisplaySettings::popup()
        };
        let view = GroupedUsageView::new(&settings);
        assert!(view.register_usage(&usage(4, 0, UsageKind::Read)).is_some());
        assert!(view.register_usage(&usage(4, 10, UsageKind::Read)).is_some());
        assert_eq!(view.node_count(), 2);
    }

    #[test]
    fn groups_by_kind_and_walks_depth_first() {
        let view = GroupedUsageView::new(&DisplaySettings::popup());
        let write = view.register_usage(&usage(1, 0, UsageKind::Write)).unwrap();
        let read = view.register_usage(&usage(2, 0, UsageKind::Read)).unwrap();
        view.register_usage(&usage(3, 0, UsageKind::Write)).unwrap();

        assert_eq!(view.group_label(write.group).as_deref(), Some("Value write"));
        assert_eq!(view.group_label(read.group).as_deref(), Some("Value read"));
        let lines: Vec<usize> = view
            .visible_nodes()
            .iter()
            .filter_map(|n| n.usage.line())
            .collect();
        assert_eq!(lines, vec![1, 3, 2]);
    }

    #[test]
    fn flat_view_keeps_nodes_under_root() {
        let settings = DisplaySettings {
            group_by_usage_type: false,
            ..DisplaySettings::popup()
        };
        let view = GroupedUsageView::new(&settings);
        let node = view.register_usage(&usage(1, 0, UsageKind::Import)).unwrap();
        assert_eq!(node.group, GroupId::ROOT);
        assert_eq!(view.group_label(node.group), None);
    }

    #[test]
    fn enabled_rules_nest_groups_outermost_first() {
        let settings = DisplaySettings {
            group_by_scope: true,
            group_by_package: true,
            group_by_file_structure: true,
            ..DisplaySettings::popup()
        };
        let view = GroupedUsageView::new(&settings);
        let main = view.register_usage(&usage(1, 0, UsageKind::Read)).unwrap();
        let test = Arc::new(
            Usage::at(
                UsageLocation::new("/tests/lookup.rs", Range::on_line(2, 0, 3)),
                "foo()",
            )
            .with_kind(UsageKind::Read),
        );
        let test = view.register_usage(&test).unwrap();

        assert_eq!(
            view.group_label(main.group).as_deref(),
            Some("Production > Value read > /src > main.rs")
        );
        assert_eq!(
            view.group_label(test.group).as_deref(),
            Some("Test > Value read > /tests > lookup.rs")
        );
        assert!(is_test_path(Path::new("/src/parser_test.rs")));
        assert!(!is_test_path(Path::new("/src/contest.rs")));
    }

    #[test]
    fn filter_rules_hide_nodes_without_unregistering_them() {
        let view = GroupedUsageView::new(&DisplaySettings::popup());
        view.register_usage(&usage(1, 0, UsageKind::Import)).unwrap();
        view.register_usage(&usage(2, 0, UsageKind::Read)).unwrap();

        assert!(view.toggle_rule(FilterRule::Imports));
        assert_eq!(view.visible_nodes().len(), 1);
        assert_eq!(view.node_count(), 2);
        assert!(!view.is_visible(&usage(9, 0, UsageKind::Import)));

        assert!(!view.toggle_rule(FilterRule::Imports));
        assert_eq!(view.visible_nodes().len(), 2);
    }

    #[test]
    fn hidden_usage_gets_no_node_until_its_rule_is_lifted() {
        let mut settings = DisplaySettings::popup();
        settings.filters.toggle(FilterRule::Imports);
        let view = GroupedUsageView::new(&settings);

        assert!(view.register_usage(&usage(1, 0, UsageKind::Import)).is_none());
        assert!(view.register_usage(&usage(2, 0, UsageKind::Read)).is_some());
        assert_eq!(view.visible_nodes().len(), 1);
        assert_eq!(view.node_count(), 2);

        view.toggle_rule(FilterRule::Imports);
        let lines: Vec<usize> = view
            .visible_nodes()
            .iter()
            .filter_map(|n| n.usage.line())
            .collect();
        assert_eq!(lines, vec![2, 1]);
    }
}
