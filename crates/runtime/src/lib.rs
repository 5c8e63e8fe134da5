use std::path::PathBuf;
use std::sync::Arc;
use usagescope_core::{PopupHost, ShowUsages, ShowUsagesConfig};
use usagescope_text::{TextResolver, TextSearchEngine};

/// Bootstraps `ShowUsages` over the text search engine rooted at `root`.
///
/// The engine and the resolver share one file cache. Configuration comes
/// from `~/.usagescope/config.json` plus environment overrides; a broken
/// config is logged and replaced by the defaults.
pub fn build_default(root: PathBuf, host: Arc<dyn PopupHost>) -> ShowUsages {
    let config = ShowUsagesConfig::load_default().unwrap_or_else(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        ShowUsagesConfig::default()
    });
    build_with_config(root, host, config)
}

pub fn build_with_config(
    root: PathBuf,
    host: Arc<dyn PopupHost>,
    config: ShowUsagesConfig,
) -> ShowUsages {
    let engine = TextSearchEngine::new(root.clone());
    let resolver = TextResolver::new(root).with_cache(Arc::clone(engine.cache()));

    ShowUsages::builder(Arc::new(engine), host)
        .resolver(Arc::new(resolver))
        .config(config)
        .build()
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> tracing_appender::non_blocking::WorkerGuard {
    usagescope_core::logging::init_logging(component, to_stderr)
}
