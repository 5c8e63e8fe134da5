use super::usage::Usage;
use std::fmt;
use std::sync::Arc;

/// Index of a usage node inside a view's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Index of a group inside a view's arena. `GroupId::ROOT` is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub usize);

impl GroupId {
    pub const ROOT: GroupId = GroupId(0);
}

/// Handle to a node registered in a usage view.
///
/// Two handles are equal only if they refer to the same node and carry the
/// same presentation; a re-rendered node therefore diffs as remove + insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsageNodeRef {
    pub id: NodeId,
    pub group: GroupId,
    pub usage: Arc<Usage>,
}

/// One row of the popup table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UsageNode {
    /// A real usage.
    Usage(UsageNodeRef),
    /// Informational text, e.g. a filtered-out count or the progress line.
    Text(String),
    /// The "more usages" marker appended when the page cap was hit.
    MoreUsages,
}

impl UsageNode {
    pub fn text(text: impl Into<String>) -> Self {
        UsageNode::Text(text.into())
    }

    pub fn usage(&self) -> Option<&Arc<Usage>> {
        match self {
            UsageNode::Usage(node) => Some(&node.usage),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, UsageNode::Text(_))
    }

    pub fn is_more_usages(&self) -> bool {
        matches!(self, UsageNode::MoreUsages)
    }
}

impl fmt::Display for UsageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageNode::Usage(node) => f.write_str(&node.usage.text),
            UsageNode::Text(text) => f.write_str(text),
            UsageNode::MoreUsages => f.write_str("..."),
        }
    }
}
