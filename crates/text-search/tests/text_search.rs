use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use usagescope_api::{
    PositionContext, ResolveResult, SearchError, SearchHandler, SearchOptions, SearchRequest, SearchScope, SearchTarget,
    TargetResolver, Usage, UsageKind, UsageSearchEngine, UsageSink,
};
use usagescope_text::{TextResolver, TextSearchEngine};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, ".gitignore", "target/\n");
    write(
        root,
        "src/lib.rs",
        "pub fn answer() -> u32 {\n    42\n}\n\n// answer is cached\npub static mut LAST: u32 = 0;\n",
    );
    write(
        root,
        "src/main.rs",
        "use crate::answer;\n\nfn main() {\n    let a = answer();\n    unsafe { LAST = answer(); }\n    println!(\"{}\", a);\n}\n",
    );
    write(root, "target/generated.rs", "fn gen() { answer(); }\n");
    // ignore rules only apply inside a repository
    fs::create_dir_all(root.join(".git")).unwrap();
    dir
}

fn collecting_sink() -> (Arc<dyn UsageSink>, Arc<Mutex<Vec<Usage>>>) {
    let found = Arc::new(Mutex::new(Vec::new()));
    let sink_found = Arc::clone(&found);
    let sink: Arc<dyn UsageSink> = Arc::new(move |usage: Usage| {
        sink_found.lock().unwrap().push(usage);
        true
    });
    (sink, found)
}

fn request(engine: &TextSearchEngine, name: &str, scope: SearchScope) -> SearchRequest {
    let handler = engine.create_handler(&SearchTarget::new(name)).unwrap();
    handler.request(&handler.default_options().with_scope(scope))
}

#[tokio::test]
async fn project_scope_respects_ignore_rules() {
    let dir = fixture();
    let engine = TextSearchEngine::new(dir.path());
    let (sink, found) = collecting_sink();

    let summary = engine
        .search(request(&engine, "answer", SearchScope::Project), sink, CancellationToken::new())
        .await
        .unwrap();

    let found = found.lock().unwrap();
    assert_eq!(summary.offered, found.len());
    assert!(!summary.stopped_early);
    assert_eq!(found.len(), 5);
    assert!(found.iter().all(|u| u.file_name() != Some("generated.rs")));

    let kinds = |name: &str| -> Vec<UsageKind> {
        let mut kinds: Vec<_> = found
            .iter()
            .filter(|u| u.file_name() == Some(name))
            .map(|u| u.kind)
            .collect();
        kinds.sort();
        kinds
    };
    assert_eq!(kinds("lib.rs"), vec![UsageKind::Read, UsageKind::Comment]);
    assert_eq!(kinds("main.rs"), vec![UsageKind::Read, UsageKind::Read, UsageKind::Import]);
}

#[tokio::test]
async fn everywhere_includes_ignored_files() {
    let dir = fixture();
    let engine = TextSearchEngine::new(dir.path());
    let (sink, found) = collecting_sink();

    engine
        .search(request(&engine, "answer", SearchScope::Everywhere), sink, CancellationToken::new())
        .await
        .unwrap();

    let found = found.lock().unwrap();
    assert_eq!(found.len(), 6);
    assert!(found.iter().any(|u| u.file_name() == Some("generated.rs")));
}

#[tokio::test]
async fn writes_and_text_occurrences() {
    let dir = fixture();
    let engine = TextSearchEngine::new(dir.path());
    let (sink, found) = collecting_sink();
    let handler = engine.create_handler(&SearchTarget::new("LAST")).unwrap();
    let mut options = handler.default_options();
    options.search_text_occurrences = false;

    engine
        .search(handler.request(&options), sink, CancellationToken::new())
        .await
        .unwrap();

    let found = found.lock().unwrap();
    let write = found.iter().find(|u| u.file_name() == Some("main.rs")).unwrap();
    assert_eq!(write.kind, UsageKind::Write);
    assert_eq!(write.location.as_ref().unwrap().range.start_col, 13);
}

#[tokio::test]
async fn file_scope_and_early_stop() {
    let dir = fixture();
    let engine = TextSearchEngine::new(dir.path());
    let seen = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&seen);
    let sink: Arc<dyn UsageSink> = Arc::new(move |_usage: Usage| {
        let mut seen = counter.lock().unwrap();
        *seen += 1;
        *seen < 2
    });

    let summary = engine
        .search(
            request(&engine, "answer", SearchScope::File("src/main.rs".into())),
            sink,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(summary.stopped_early);
    assert_eq!(*seen.lock().unwrap(), 2);
}

#[tokio::test]
async fn cancelled_search_reports_cancellation() {
    let dir = fixture();
    let engine = TextSearchEngine::new(dir.path());
    let (sink, found) = collecting_sink();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = engine
        .search(request(&engine, "answer", SearchScope::Project), sink, cancel)
        .await;

    assert!(matches!(result, Err(SearchError::Cancelled)));
    assert!(found.lock().unwrap().is_empty());
}

#[tokio::test]
async fn resolver_finds_declaration_and_handler_skips_it() {
    let dir = fixture();
    let resolver = TextResolver::new(dir.path());
    let engine = TextSearchEngine::new(dir.path());

    let resolved = resolver
        .resolve_at(&PositionContext::new("src/main.rs", 3, 14))
        .await
        .unwrap();
    let ResolveResult::Found(target) = resolved else {
        panic!("expected a single declaration, got {resolved:?}");
    };
    assert_eq!(target.name, "answer");
    let declaration = target.declaration.clone().unwrap();
    assert_eq!(declaration.file_name(), Some("lib.rs"));
    assert_eq!(declaration.range.start_line, 0);

    let handler = engine.create_handler(&target).unwrap();
    let (sink, found) = collecting_sink();
    engine
        .search(handler.request(&handler.default_options()), sink, CancellationToken::new())
        .await
        .unwrap();
    let self_usages = found
        .lock()
        .unwrap()
        .iter()
        .filter(|u| handler.is_self_usage(u))
        .count();
    assert_eq!(self_usages, 1);
}

#[tokio::test]
async fn resolver_reports_ambiguity_and_blank_positions() {
    let dir = fixture();
    write(dir.path(), "src/other.rs", "fn answer() -> i64 { 7 }\n");
    let resolver = TextResolver::new(dir.path());

    let resolved = resolver
        .resolve_at(&PositionContext::new("src/main.rs", 3, 14))
        .await
        .unwrap();
    assert!(matches!(resolved, ResolveResult::Ambiguous(ref c) if c.len() == 2));

    let blank = resolver
        .resolve_at(&PositionContext::new("src/main.rs", 1, 0))
        .await
        .unwrap();
    assert!(matches!(blank, ResolveResult::NotFound));

    let missing = resolver
        .resolve_at(&PositionContext::new("src/nope.rs", 0, 0))
        .await;
    assert!(missing.is_err());
}

#[test]
fn unsupported_names_get_no_handler() {
    let engine = TextSearchEngine::new(".");
    assert!(engine.create_handler(&SearchTarget::new("a b")).is_none());
    let options = SearchOptions::new(SearchScope::Project);
    let handler = engine.create_handler(&SearchTarget::new("ok")).unwrap();
    assert_eq!(handler.default_options(), options);
    assert_eq!(handler.maximal_scope(), SearchScope::Everywhere);
}
