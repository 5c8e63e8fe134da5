use super::location::UsageLocation;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Classification of a usage, used for grouping and display filters.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Read,
    Write,
    Import,
    Comment,
    #[default]
    Other,
}

impl UsageKind {
    pub fn group_name(&self) -> &'static str {
        match self {
            UsageKind::Read => "Value read",
            UsageKind::Write => "Value write",
            UsageKind::Import => "Usage in import",
            UsageKind::Comment => "Usage in comments",
            UsageKind::Other => "Unclassified usage",
        }
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_name())
    }
}

/// One found reference to the searched symbol.
///
/// Usages are shared as `Arc<Usage>` once accepted and never mutated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Usage {
    pub location: Option<UsageLocation>,
    pub text: String,
    pub kind: UsageKind,
}

impl Usage {
    pub fn new(location: Option<UsageLocation>, text: impl Into<String>) -> Self {
        Self {
            location,
            text: text.into(),
            kind: UsageKind::default(),
        }
    }

    pub fn at(location: UsageLocation, text: impl Into<String>) -> Self {
        Self::new(Some(location), text)
    }

    pub fn with_kind(mut self, kind: UsageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_navigable(&self) -> bool {
        self.location.is_some()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.file_name())
    }

    pub fn line(&self) -> Option<usize> {
        self.location.as_ref().map(|l| l.line())
    }
}

impl Ord for Usage {
    /// File name first, then location (path, range), then presentation.
    fn cmp(&self, other: &Self) -> Ordering {
        self.file_name()
            .cmp(&other.file_name())
            .then_with(|| self.location.cmp(&other.location))
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

impl PartialOrd for Usage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
