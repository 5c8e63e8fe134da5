use crate::engine::{ContentCache, is_identifier};
use crate::scanner::collect_files;
use async_trait::async_trait;
use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use usagescope_api::{
    ApiError, ApiResult, PositionContext, Range, ResolveResult, SearchScope, SearchTarget,
    TargetResolver, UsageLocation,
};

const DECLARATION_KEYWORDS: &str =
    "fn|struct|enum|trait|union|mod|type|const|static|let|class|interface|def|val|var|func";

/// Resolves the identifier under the caret to its declarations in the project.
pub struct TextResolver {
    root: PathBuf,
    cache: Arc<ContentCache>,
}

impl TextResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Arc::new(ContentCache::default()),
        }
    }

    /// Share the file cache with a search engine.
    pub fn with_cache(mut self, cache: Arc<ContentCache>) -> Self {
        self.cache = cache;
        self
    }

    fn declarations(&self, name: &str) -> ApiResult<Vec<SearchTarget>> {
        let pattern = format!(
            r"\b(?:{DECLARATION_KEYWORDS})\s+(?:mut\s+)?({})\b",
            regex::escape(name)
        );
        let regex = Regex::new(&pattern).map_err(|e| ApiError::Internal(e.to_string()))?;
        let files = collect_files(&self.root, &SearchScope::Project);

        let mut found: Vec<SearchTarget> = files
            .par_iter()
            .flat_map_iter(|path| {
                self.cache
                    .read(path)
                    .map(|content| declarations_in(path, &content, &regex, name))
                    .unwrap_or_default()
            })
            .collect();
        found.sort_by(|a, b| a.declaration.cmp(&b.declaration));
        Ok(found)
    }
}

fn declarations_in(path: &Path, content: &str, regex: &Regex, name: &str) -> Vec<SearchTarget> {
    let mut out = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        for caps in regex.captures_iter(line) {
            let Some(m) = caps.get(1) else { continue };
            let col = line[..m.start()].chars().count();
            let range = Range::on_line(line_no, col, name.chars().count());
            out.push(SearchTarget::new(name).declared_at(UsageLocation::new(path, range)));
        }
    }
    out
}

/// Identifier covering char column `col` (or ending right before it).
pub fn identifier_at(line: &str, col: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let is_ident = |c: char| c == '_' || c.is_alphanumeric();
    let mut at = col.min(chars.len());
    if at == chars.len() || !is_ident(chars[at]) {
        at = at.checked_sub(1)?;
        if !is_ident(chars[at]) {
            return None;
        }
    }
    let start = (0..=at).rev().take_while(|i| is_ident(chars[*i])).last()?;
    let end = (at..chars.len()).take_while(|i| is_ident(chars[*i])).last()? + 1;
    let word: String = chars[start..end].iter().collect();
    is_identifier(&word).then_some(word)
}

#[async_trait]
impl TargetResolver for TextResolver {
    async fn resolve_at(&self, position: &PositionContext) -> ApiResult<ResolveResult> {
        let path = if position.path.is_absolute() {
            position.path.clone()
        } else {
            self.root.join(&position.path)
        };
        let content = self
            .cache
            .read(&path)
            .ok_or_else(|| ApiError::NotFound(path.display().to_string()))?;
        let Some(line) = content.lines().nth(position.line) else {
            return Ok(ResolveResult::NotFound);
        };
        let Some(name) = identifier_at(line, position.col) else {
            return Ok(ResolveResult::NotFound);
        };

        let declarations = self.declarations(&name)?;
        debug!(name = %name, candidates = declarations.len(), "resolved caret");
        if declarations.is_empty() {
            // undeclared in the project: still searchable as a word
            return Ok(ResolveResult::Found(SearchTarget::new(name)));
        }
        Ok(declarations.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_under_or_before_caret() {
        assert_eq!(identifier_at("let foo_bar = 1;", 5).as_deref(), Some("foo_bar"));
        assert_eq!(identifier_at("let foo_bar = 1;", 11).as_deref(), Some("foo_bar"));
        assert_eq!(identifier_at("foo", 3).as_deref(), Some("foo"));
        assert_eq!(identifier_at("a + b", 2), None);
        assert_eq!(identifier_at("x = 42;", 5), None);
        assert_eq!(identifier_at("", 0), None);
    }

    #[test]
    fn finds_declarations_with_name_ranges() {
        let regex = Regex::new(&format!(
            r"\b(?:{DECLARATION_KEYWORDS})\s+(?:mut\s+)?(foo)\b"
        ))
        .unwrap();
        let content = "fn foo() {}\nlet mut foo = 1;\nfoo();\n";
        let found = declarations_in(Path::new("/p/a.rs"), content, &regex, "foo");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].declaration.as_ref().unwrap().range, Range::on_line(0, 3, 3));
        assert_eq!(found[1].declaration.as_ref().unwrap().range, Range::on_line(1, 8, 3));
    }
}
