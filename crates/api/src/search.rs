use crate::error::SearchError;
use crate::models::{SearchOptions, SearchScope, SearchTarget, Usage};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Receiver of search results.
///
/// Called concurrently from any producer thread. Returning `false` asks the
/// producer to stop; it must honor that promptly.
pub trait UsageSink: Send + Sync {
    fn accept(&self, usage: Usage) -> bool;
}

impl<F> UsageSink for F
where
    F: Fn(Usage) -> bool + Send + Sync,
{
    fn accept(&self, usage: Usage) -> bool {
        self(usage)
    }
}

/// Everything a producer needs to run one search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub primary: Vec<SearchTarget>,
    pub secondary: Vec<SearchTarget>,
    pub options: SearchOptions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Number of candidates handed to the sink.
    pub offered: usize,
    /// The sink asked the producer to stop before it ran out of candidates.
    pub stopped_early: bool,
}

/// Capability object for one search target: which elements to search for,
/// with which default options, and what the widest scope is.
pub trait SearchHandler: Send + Sync {
    fn primary_targets(&self) -> &[SearchTarget];

    fn secondary_targets(&self) -> &[SearchTarget] {
        &[]
    }

    fn default_options(&self) -> SearchOptions;

    fn maximal_scope(&self) -> SearchScope;

    fn presentable_name(&self) -> String {
        self.primary_targets()
            .first()
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }

    /// `true` if the usage is the declaration of a searched element itself.
    fn is_self_usage(&self, usage: &Usage) -> bool {
        let Some(location) = usage.location.as_ref() else {
            return false;
        };
        self.primary_targets()
            .iter()
            .chain(self.secondary_targets())
            .any(|t| t.declaration.as_ref() == Some(location))
    }

    fn request(&self, options: &SearchOptions) -> SearchRequest {
        SearchRequest {
            primary: self.primary_targets().to_vec(),
            secondary: self.secondary_targets().to_vec(),
            options: options.clone(),
        }
    }
}

/// Plain data implementation of [`SearchHandler`].
#[derive(Debug, Clone)]
pub struct TargetHandler {
    pub primary: Vec<SearchTarget>,
    pub secondary: Vec<SearchTarget>,
    pub default_options: SearchOptions,
    pub maximal_scope: SearchScope,
}

impl TargetHandler {
    pub fn new(target: SearchTarget, default_options: SearchOptions, maximal_scope: SearchScope) -> Self {
        Self {
            primary: vec![target],
            secondary: Vec::new(),
            default_options,
            maximal_scope,
        }
    }

    pub fn with_secondary(mut self, target: SearchTarget) -> Self {
        self.secondary.push(target);
        self
    }
}

impl SearchHandler for TargetHandler {
    fn primary_targets(&self) -> &[SearchTarget] {
        &self.primary
    }

    fn secondary_targets(&self) -> &[SearchTarget] {
        &self.secondary
    }

    fn default_options(&self) -> SearchOptions {
        self.default_options.clone()
    }

    fn maximal_scope(&self) -> SearchScope {
        self.maximal_scope.clone()
    }
}

/// The reference-search engine.
#[async_trait]
pub trait UsageSearchEngine: Send + Sync {
    /// Build the handler for a resolved target, or `None` if this engine
    /// cannot search for it.
    fn create_handler(&self, target: &SearchTarget) -> Option<Arc<dyn SearchHandler>>;

    /// Run a search, feeding every candidate to `sink` until it returns
    /// `false`, the candidates run out or `cancel` fires.
    async fn search(
        &self,
        request: SearchRequest,
        sink: Arc<dyn UsageSink>,
        cancel: CancellationToken,
    ) -> Result<SearchSummary, SearchError>;
}
