//! Arena storage for the usage group tree. Parents are referenced by index.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use usagescope_api::{GroupId, NodeId, Usage};

#[derive(Debug)]
pub(crate) struct GroupNode {
    pub name: String,
    pub parent: Option<GroupId>,
    pub subgroups: Vec<GroupId>,
    pub nodes: Vec<NodeId>,
}

#[derive(Debug)]
pub(crate) struct NodeEntry {
    pub group: GroupId,
    pub usage: Arc<Usage>,
    pub merged: usize,
}

/// Key under which raw usages collapse into one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MergeKey {
    pub path: PathBuf,
    pub line: usize,
}

#[derive(Debug)]
pub(crate) struct UsageTree {
    pub groups: Vec<GroupNode>,
    pub nodes: Vec<NodeEntry>,
    children: HashMap<(GroupId, String), GroupId>,
    merge_index: HashMap<MergeKey, NodeId>,
}

impl UsageTree {
    pub fn new() -> Self {
        Self {
            groups: vec![GroupNode {
                name: String::new(),
                parent: None,
                subgroups: Vec::new(),
                nodes: Vec::new(),
            }],
            nodes: Vec::new(),
            children: HashMap::new(),
            merge_index: HashMap::new(),
        }
    }

    pub fn group(&self, id: GroupId) -> Option<&GroupNode> {
        self.groups.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(id.0)
    }

    /// Subgroup `name` of `parent`, created on first use.
    pub fn child_group(&mut self, parent: GroupId, name: String) -> GroupId {
        let key = (parent, name);
        if let Some(id) = self.children.get(&key) {
            return *id;
        }
        let id = GroupId(self.groups.len());
        self.groups.push(GroupNode {
            name: key.1.clone(),
            parent: Some(parent),
            subgroups: Vec::new(),
            nodes: Vec::new(),
        });
        self.groups[parent.0].subgroups.push(id);
        self.children.insert(key, id);
        id
    }

    /// Names from the topmost group down to `id`, root excluded.
    pub fn group_path(&self, id: GroupId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(group) = current.and_then(|id| self.group(id)) {
            if group.parent.is_none() {
                break;
            }
            names.push(group.name.as_str());
            current = group.parent;
        }
        names.reverse();
        names
    }

    /// Node already holding usages on the same line, if any; bumps its count.
    pub fn merge_into_existing(&mut self, key: &MergeKey) -> Option<NodeId> {
        let id = *self.merge_index.get(key)?;
        self.nodes[id.0].merged += 1;
        Some(id)
    }

    pub fn add_node(&mut self, group: GroupId, usage: Arc<Usage>, key: Option<MergeKey>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            group,
            usage,
            merged: 1,
        });
        self.groups[group.0].nodes.push(id);
        if let Some(key) = key {
            self.merge_index.insert(key, id);
        }
        id
    }

    /// Depth-first walk: a group's nodes, then its subgroups.
    pub fn walk<F>(&self, group: GroupId, visit: &mut F)
    where
        F: FnMut(NodeId, &NodeEntry),
    {
        let Some(node) = self.group(group) else {
            return;
        };
        for id in &node.nodes {
            visit(*id, &self.nodes[id.0]);
        }
        for sub in &node.subgroups {
            self.walk(*sub, visit);
        }
    }
}
