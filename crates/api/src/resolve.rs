use crate::error::ApiResult;
use crate::models::SearchTarget;
use async_trait::async_trait;
use std::path::PathBuf;

/// Caret position the user invoked the action at. Zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionContext {
    pub path: PathBuf,
    pub line: usize,
    pub col: usize,
}

impl PositionContext {
    pub fn new(path: impl Into<PathBuf>, line: usize, col: usize) -> Self {
        Self {
            path: path.into(),
            line,
            col,
        }
    }
}

/// Result of resolving a caret position to search targets.
#[derive(Debug, Clone)]
pub enum ResolveResult {
    /// Exactly one element found
    Found(SearchTarget),
    /// Several elements match (the user has to choose)
    Ambiguous(Vec<SearchTarget>),
    /// Nothing usable under the caret
    NotFound,
}

impl From<Vec<SearchTarget>> for ResolveResult {
    fn from(mut candidates: Vec<SearchTarget>) -> Self {
        match candidates.len() {
            0 => ResolveResult::NotFound,
            1 => ResolveResult::Found(candidates.remove(0)),
            _ => ResolveResult::Ambiguous(candidates),
        }
    }
}

/// Symbol resolution collaborator.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn resolve_at(&self, position: &PositionContext) -> ApiResult<ResolveResult>;
}
