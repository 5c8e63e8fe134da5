use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use usagescope_api::SearchScope;

/// Files a search in `scope` looks at, relative scopes resolved against `root`.
pub fn collect_files(root: &Path, scope: &SearchScope) -> Vec<PathBuf> {
    match scope {
        SearchScope::File(path) => {
            let path = resolve(root, path);
            if path.is_file() { vec![path] } else { Vec::new() }
        }
        SearchScope::Directory(dir) => walk(&resolve(root, dir), true),
        SearchScope::Project => walk(root, true),
        SearchScope::Everywhere => walk(root, false),
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Walk `dir`; `standard_filters` honors ignore files and skips hidden files.
fn walk(dir: &Path, standard_filters: bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(dir)
        .standard_filters(standard_filters)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            path.is_file().then(|| path.to_path_buf())
        })
        .collect();
    files.sort();
    files
}
