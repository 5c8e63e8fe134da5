use super::location::UsageLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A program element whose usages are searched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTarget {
    pub name: String,
    /// Declaration site, if known. A usage at this exact location is the
    /// target itself rather than a reference to it.
    pub declaration: Option<UsageLocation>,
}

impl SearchTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaration: None,
        }
    }

    pub fn declared_at(mut self, location: UsageLocation) -> Self {
        self.declaration = Some(location);
        self
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.declaration {
            Some(loc) => write!(f, "{} ({})", self.name, loc),
            None => f.write_str(&self.name),
        }
    }
}
