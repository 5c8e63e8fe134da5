use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Where a usage search looks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    File(PathBuf),
    Directory(PathBuf),
    /// Project sources, honoring ignore rules.
    Project,
    /// Everything reachable, including ignored and hidden files.
    Everywhere,
}

impl SearchScope {
    pub fn display_name(&self) -> String {
        match self {
            SearchScope::File(path) => format!(
                "File {}",
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("<unnamed>")
            ),
            SearchScope::Directory(path) => format!("Directory {}", path.display()),
            SearchScope::Project => "Project Files".to_string(),
            SearchScope::Everywhere => "All Places".to_string(),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Scope plus handler-specific search parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub scope: SearchScope,
    /// Also report occurrences in comments and plain text.
    #[serde(default)]
    pub search_text_occurrences: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl SearchOptions {
    pub fn new(scope: SearchScope) -> Self {
        Self {
            scope,
            search_text_occurrences: true,
            parameters: BTreeMap::new(),
        }
    }

    /// Clone of these options searching `scope` instead.
    pub fn with_scope(&self, scope: SearchScope) -> Self {
        let mut cloned = self.clone();
        cloned.scope = scope;
        cloned
    }
}
