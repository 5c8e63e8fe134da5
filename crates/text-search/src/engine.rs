use crate::classify::classify;
use crate::scanner::collect_files;
use async_trait::async_trait;
use dashmap::DashMap;
use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use usagescope_api::{
    Range, SearchError, SearchHandler, SearchOptions, SearchRequest, SearchScope, SearchSummary,
    SearchTarget, TargetHandler, Usage, UsageKind, UsageLocation, UsageSearchEngine, UsageSink,
};

#[derive(Clone)]
struct CachedFile {
    modified: Option<SystemTime>,
    content: Arc<str>,
}

/// File contents keyed by path, refreshed when the modification time moves.
#[derive(Default)]
pub struct ContentCache {
    files: DashMap<PathBuf, CachedFile>,
}

impl ContentCache {
    pub fn read(&self, path: &Path) -> Option<Arc<str>> {
        let modified = std::fs::metadata(path).ok()?.modified().ok();
        if let Some(cached) = self.files.get(path) {
            if cached.modified.is_some() && cached.modified == modified {
                return Some(Arc::clone(&cached.content));
            }
        }
        let content: Arc<str> = std::fs::read_to_string(path).ok()?.into();
        self.files.insert(
            path.to_path_buf(),
            CachedFile {
                modified,
                content: Arc::clone(&content),
            },
        );
        Some(content)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&self) {
        self.files.clear();
    }
}

/// Searches identifiers on word boundaries below a project root.
pub struct TextSearchEngine {
    root: PathBuf,
    cache: Arc<ContentCache>,
}

impl TextSearchEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Arc::new(ContentCache::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn names_pattern(request: &SearchRequest) -> Result<Regex, SearchError> {
    let mut names: Vec<&str> = request
        .primary
        .iter()
        .chain(&request.secondary)
        .map(|t| t.name.as_str())
        .collect();
    names.sort_unstable();
    names.dedup();
    if names.is_empty() {
        return Err(SearchError::Failed("nothing to search for".to_string()));
    }
    let alternatives: Vec<String> = names.into_iter().map(regex::escape).collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
        .map_err(|e| SearchError::Failed(e.to_string()))
}

struct Scan {
    regex: Regex,
    sink: Arc<dyn UsageSink>,
    cancel: CancellationToken,
    cache: Arc<ContentCache>,
    text_occurrences: bool,
    stop: AtomicBool,
    offered: AtomicUsize,
}

impl Scan {
    fn halted(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.cancel.is_cancelled()
    }

    fn file(&self, path: &Path) {
        if self.halted() {
            return;
        }
        let Some(content) = self.cache.read(path) else {
            return;
        };
        for (line_no, line) in content.lines().enumerate() {
            for found in self.regex.find_iter(line) {
                if self.halted() {
                    return;
                }
                let kind = classify(line, found.start(), found.end());
                if kind == UsageKind::Comment && !self.text_occurrences {
                    continue;
                }
                let col = line[..found.start()].chars().count();
                let len = found.as_str().chars().count();
                let usage = Usage::at(
                    UsageLocation::new(path, Range::on_line(line_no, col, len)),
                    line.trim(),
                )
                .with_kind(kind);
                self.offered.fetch_add(1, Ordering::Relaxed);
                if !self.sink.accept(usage) {
                    self.stop.store(true, Ordering::Relaxed);
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl UsageSearchEngine for TextSearchEngine {
    fn create_handler(&self, target: &SearchTarget) -> Option<Arc<dyn SearchHandler>> {
        if !is_identifier(&target.name) {
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
        let regex = names_pattern(&request)?;
        let root = self.root.clone();
        let scope = request.options.scope.clone();
        let scan = Scan {
            regex,
            sink,
            cancel,
            cache: Arc::clone(&self.cache),
            text_occurrences: request.options.search_text_occurrences,
            stop: AtomicBool::new(false),
            offered: AtomicUsize::new(0),
        };

        tokio::task::spawn_blocking(move || {
            let files = collect_files(&root, &scope);
            info!(files = files.len(), scope = %scope, "scanning for usages");
            files.par_iter().for_each(|path| scan.file(path));

            if scan.cancel.is_cancelled() {
                debug!("text search cancelled");
                return Err(SearchError::Cancelled);
            }
            Ok(SearchSummary {
                offered: scan.offered.load(Ordering::Relaxed),
                stopped_early: scan.stop.load(Ordering::Relaxed),
            })
        })
        .await
        .map_err(|e| SearchError::Failed(e.to_string()))?
    }
}
