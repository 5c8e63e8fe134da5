//! Thread-safe sink between the search producer and the popup.

use crate::refresh::RefreshTrigger;
use indexmap::IndexSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use usagescope_api::{SearchHandler, Usage, UsageNode, UsageNodeRef, UsageSink, UsageView};

/// Caller-supplied predicate; usages failing it are skipped silently.
pub type UsagePredicate = Arc<dyn Fn(&Usage) -> bool + Send + Sync>;

/// Substitutes or vetoes a usage before it is registered. `None` skips it.
pub type UsageTransform = Arc<dyn Fn(Usage) -> Option<Usage> + Send + Sync>;

/// One entry of the accepted-usage list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageEntry {
    Usage(Arc<Usage>),
    /// Marker recorded once the page cap was hit.
    MoreUsages,
}

impl UsageEntry {
    pub fn usage(&self) -> Option<&Arc<Usage>> {
        match self {
            UsageEntry::Usage(usage) => Some(usage),
            UsageEntry::MoreUsages => None,
        }
    }
}

#[derive(Debug, Default)]
struct ResultSet {
    usages: Vec<UsageEntry>,
    visible: IndexSet<UsageNode>,
}

impl ResultSet {
    fn has_more(&self) -> bool {
        self.visible.contains(&UsageNode::MoreUsages)
    }

    fn node_count(&self) -> usize {
        self.visible.len() - usize::from(self.has_more())
    }
}

/// Consistent copy of the result set taken under the collector lock.
#[derive(Debug, Clone, Default)]
pub struct ResultSnapshot {
    pub usages: Vec<UsageEntry>,
    /// Nodes counted against the cap: the ones visible when registered.
    pub nodes: Vec<UsageNode>,
    /// Nodes passing the display filters now, in tree order.
    pub shown: Vec<UsageNodeRef>,
    pub has_more: bool,
}

impl ResultSnapshot {
    /// Accepted usages, not counting the "more" marker.
    pub fn usage_count(&self) -> usize {
        self.usages.len() - usize::from(self.has_more)
    }

    /// Registered nodes, not counting the "more" marker.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - usize::from(self.has_more)
    }

    pub fn accepted(&self) -> impl Iterator<Item = &Arc<Usage>> {
        self.usages.iter().filter_map(UsageEntry::usage)
    }

    /// The only registered node's usage, if exactly one node exists.
    pub fn single_node(&self) -> Option<&Arc<Usage>> {
        if self.node_count() != 1 {
            return None;
        }
        self.nodes.iter().find_map(UsageNode::usage)
    }

    /// `true` if every accepted usage sits on the same file line as `usage`.
    pub fn all_on_line_of(&self, usage: &Usage) -> bool {
        let Some(location) = usage.location.as_ref() else {
            return false;
        };
        self.accepted().all(|other| {
            other.location.as_ref().is_some_and(|loc| {
                loc.path == location.path && loc.line() == location.line()
            })
        })
    }
}

/// Receives usages from any producer thread. Every mutation of the
/// accepted list and the node set happens under one lock.
pub struct UsageCollector {
    state: Mutex<ResultSet>,
    handler: Arc<dyn SearchHandler>,
    view: Arc<dyn UsageView>,
    filter: Option<UsagePredicate>,
    transform: Option<UsageTransform>,
    max_usages: usize,
    refresh: RefreshTrigger,
    cancel: CancellationToken,
}

impl UsageCollector {
    pub fn new(
        handler: Arc<dyn SearchHandler>,
        view: Arc<dyn UsageView>,
        max_usages: usize,
        refresh: RefreshTrigger,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            state: Mutex::new(ResultSet::default()),
            handler,
            view,
            filter: None,
            transform: None,
            max_usages,
            refresh,
            cancel,
        }
    }

    pub fn with_filter(mut self, filter: Option<UsagePredicate>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_transform(mut self, transform: Option<UsageTransform>) -> Self {
        self.transform = transform;
        self
    }

    pub fn max_usages(&self) -> usize {
        self.max_usages
    }

    pub fn view(&self) -> &Arc<dyn UsageView> {
        &self.view
    }

    /// Handle one candidate. Returns `false` when the producer should stop.
    pub fn accept(&self, usage: Usage) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.has_more() {
            return false;
        }
        if let Some(filter) = &self.filter {
            if !filter(&usage) {
                return true;
            }
        }
        if self.handler.is_self_usage(&usage) {
            return true;
        }
        let usage = match &self.transform {
            Some(transform) => match transform(usage) {
                Some(usage) => usage,
                None => return true,
            },
            None => usage,
        };

        if state.node_count() >= self.max_usages {
            state.usages.push(UsageEntry::MoreUsages);
            state.visible.insert(UsageNode::MoreUsages);
            drop(state);
            self.refresh.ping();
            return false;
        }

        let usage = Arc::new(usage);
        let node = self.view.register_usage(&usage);
        state.usages.push(UsageEntry::Usage(usage));
        if let Some(node) = node {
            state.visible.insert(UsageNode::Usage(node));
        }
        drop(state);
        self.refresh.ping();
        true
    }

    pub fn snapshot(&self) -> ResultSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        ResultSnapshot {
            usages: state.usages.clone(),
            nodes: state.visible.iter().cloned().collect(),
            shown: self.view.visible_nodes(),
            has_more: state.has_more(),
        }
    }

    pub fn usage_count(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.usages.len() - usize::from(state.has_more())
    }
}

impl UsageSink for UsageCollector {
    fn accept(&self, usage: Usage) -> bool {
        UsageCollector::accept(self, usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DisplaySettings;
    use crate::view::GroupedUsageView;
    use std::sync::Arc;
    use std::thread;
    use tokio::sync::Notify;
    use usagescope_api::{
        FilterRule, Range, SearchOptions, SearchScope, SearchTarget, TargetHandler, UsageKind,
        UsageLocation,
    };

    fn declaration() -> UsageLocation {
        UsageLocation::new("/src/lib.rs", Range::on_line(0, 3, 3))
    }

    fn collector(max_usages: usize) -> UsageCollector {
        collector_with(max_usages, &DisplaySettings::popup())
    }

    fn collector_with(max_usages: usize, settings: &DisplaySettings) -> UsageCollector {
        let handler = TargetHandler::new(
            SearchTarget::new("foo").declared_at(declaration()),
            SearchOptions::new(SearchScope::Project),
            SearchScope::Everywhere,
        );
        let view = GroupedUsageView::new(settings);
        UsageCollector::new(
            Arc::new(handler),
            Arc::new(view),
            max_usages,
            RefreshTrigger::new(Arc::new(Notify::new())),
            CancellationToken::new(),
        )
    }

    fn usage_at(path: &str, line: usize) -> Usage {
        Usage::at(UsageLocation::new(path, Range::on_line(line, 0, 3)), "foo()")
    }

    #[test]
    fn sentinel_appears_only_when_more_than_cap_offered() {
        let collector = collector(3);
        for line in 1..=3 {
            assert!(collector.accept(usage_at("/src/a.rs", line)));
        }
        let snapshot = collector.snapshot();
        assert!(!snapshot.has_more);
        assert_eq!(snapshot.node_count(), 3);

        assert!(!collector.accept(usage_at("/src/a.rs", 4)));
        let snapshot = collector.snapshot();
        assert!(snapshot.has_more);
        assert_eq!(snapshot.nodes.len(), 4);
        assert_eq!(snapshot.nodes.last(), Some(&UsageNode::MoreUsages));
        assert_eq!(snapshot.usage_count(), 3);

        assert!(!collector.accept(usage_at("/src/a.rs", 5)));
        assert_eq!(collector.snapshot().nodes.len(), 4);
    }

    #[test]
    fn hidden_usages_do_not_count_against_the_cap() {
        let mut settings = DisplaySettings::popup();
        settings.filters.toggle(FilterRule::Imports);
        let collector = collector_with(2, &settings);
        let import = |line| usage_at("/src/a.rs", line).with_kind(UsageKind::Import);

        for line in 1..=5 {
            assert!(collector.accept(import(line)));
        }
        assert!(collector.accept(usage_at("/src/b.rs", 1)));
        let snapshot = collector.snapshot();
        assert_eq!(snapshot.usage_count(), 6);
        assert_eq!(snapshot.node_count(), 1);
        assert_eq!(snapshot.shown.len(), 1);
        assert_eq!(snapshot.single_node().and_then(|u| u.line()), Some(1));

        assert!(collector.accept(usage_at("/src/b.rs", 2)));
        assert!(!collector.accept(usage_at("/src/b.rs", 3)));
        let snapshot = collector.snapshot();
        assert!(snapshot.has_more);
        assert_eq!(snapshot.node_count(), 2);
        assert_eq!(snapshot.usage_count(), 7);
    }

    #[test]
    fn self_usage_keeps_search_running_without_counting() {
        let collector = collector(1);
        assert!(collector.accept(Usage::at(declaration(), "fn foo()")));
        assert!(collector.accept(Usage::at(declaration(), "fn foo()")));
        assert_eq!(collector.usage_count(), 0);
        assert!(collector.accept(usage_at("/src/a.rs", 2)));
        assert_eq!(collector.snapshot().node_count(), 1);
    }

    #[test]
    fn filter_and_transform_skip_without_stopping() {
        let collector = collector(10)
            .with_filter(Some(Arc::new(|u: &Usage| u.line() != Some(7))))
            .with_transform(Some(Arc::new(|u: Usage| {
                (u.line() != Some(8)).then_some(u)
            })));
        assert!(collector.accept(usage_at("/src/a.rs", 7)));
        assert!(collector.accept(usage_at("/src/a.rs", 8)));
        assert!(collector.accept(usage_at("/src/a.rs", 9)));
        assert_eq!(collector.usage_count(), 1);
    }

    #[test]
    fn merged_usages_are_counted_but_not_displayed() {
        let collector = collector(10);
        let mut second = usage_at("/src/a.rs", 3);
        second.location.as_mut().unwrap().range = Range::on_line(3, 12, 3);
        assert!(collector.accept(usage_at("/src/a.rs", 3)));
        assert!(collector.accept(second.clone()));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.usage_count(), 2);
        assert_eq!(snapshot.node_count(), 1);
        let single = snapshot.single_node().expect("one node").clone();
        assert!(snapshot.all_on_line_of(&single));
    }

    #[test]
    fn late_callbacks_after_cancel_are_inert() {
        let cancel = CancellationToken::new();
        let mut collector = collector(10);
        collector.cancel = cancel.clone();
        assert!(collector.accept(usage_at("/src/a.rs", 1)));
        cancel.cancel();
        assert!(!collector.accept(usage_at("/src/a.rs", 2)));
        assert_eq!(collector.usage_count(), 1);
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;
        let collector = Arc::new(collector(THREADS * PER_THREAD));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let collector = Arc::clone(&collector);
                thread::spawn(move || {
                    for line in 0..PER_THREAD {
                        let path = format!("/src/t{t}.rs");
                        assert!(collector.accept(usage_at(&path, line + 1)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.usage_count(), THREADS * PER_THREAD);
        assert_eq!(snapshot.node_count(), THREADS * PER_THREAD);
        assert!(!snapshot.has_more);
    }

    #[test]
    fn concurrent_producers_respect_the_cap() {
        let collector = Arc::new(collector(100));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let collector = Arc::clone(&collector);
                thread::spawn(move || {
                    for line in 0..100 {
                        if !collector.accept(usage_at(&format!("/src/c{t}.rs"), line + 1)) {
                            break;
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = collector.snapshot();
        assert!(snapshot.has_more);
        assert_eq!(snapshot.node_count(), 100);
        assert_eq!(
            snapshot.nodes.iter().filter(|n| n.is_more_usages()).count(),
            1
        );
    }
}
