//! Row projection: which nodes are shown, in which order, with which cells.

use crate::collector::ResultSnapshot;
use std::cmp::Ordering;
use usagescope_api::{UsageNode, UsageNodeRef, UsageView};

pub const USAGE_COLUMNS: usize = 3;

/// One rendered row: the node plus its cell texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupRow {
    pub node: UsageNode,
    pub cells: Vec<String>,
}

pub fn filtered_out_text(count: usize) -> String {
    if count == 1 {
        "1 usage was filtered out".to_string()
    } else {
        format!("{count} usages were filtered out")
    }
}

pub fn progress_text(name: &str, scope: &str) -> String {
    format!("Searching for usages of {name} in {scope}...")
}

fn compare_nodes(a: &UsageNodeRef, b: &UsageNodeRef) -> Ordering {
    a.usage.cmp(&b.usage).then_with(|| a.id.cmp(&b.id))
}

/// Sorted rows for a snapshot: visible usages, then the "more" marker,
/// then informational text rows.
pub fn collect_rows(
    snapshot: &ResultSnapshot,
    view: &dyn UsageView,
    name: &str,
    scope: &str,
) -> Vec<UsageNode> {
    let mut usages: Vec<&UsageNodeRef> = snapshot.shown.iter().collect();
    usages.sort_by(|a, b| compare_nodes(a, b));

    let mut rows: Vec<UsageNode> = usages.into_iter().cloned().map(UsageNode::Usage).collect();
    if snapshot.has_more {
        rows.push(UsageNode::MoreUsages);
    }
    let filtered = snapshot
        .accepted()
        .filter(|usage| !view.is_visible(usage))
        .count();
    if filtered > 0 {
        rows.push(UsageNode::text(filtered_out_text(filtered)));
    }
    if rows.is_empty() {
        rows.push(UsageNode::text(progress_text(name, scope)));
    }
    rows
}

/// 1 column for informational content, 3 (group, location, text) otherwise.
pub fn column_count(rows: &[UsageNode]) -> usize {
    match rows.first() {
        None | Some(UsageNode::Text(_)) => 1,
        Some(_) => USAGE_COLUMNS,
    }
}

pub fn render_row(node: &UsageNode, view: &dyn UsageView, columns: usize) -> PopupRow {
    let cells = match node {
        UsageNode::Usage(r) => {
            let group = view.group_label(r.group).unwrap_or_default();
            let location = r
                .usage
                .location
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            let merged = view.merged_count(r.id);
            let text = if merged > 1 {
                format!("{} ({merged})", r.usage.text.trim())
            } else {
                r.usage.text.trim().to_string()
            };
            vec![group, location, text]
        }
        UsageNode::MoreUsages => {
            let mut cells = vec![String::new(); columns.max(1)];
            if let Some(last) = cells.last_mut() {
                *last = "...".to_string();
            }
            cells
        }
        UsageNode::Text(text) => {
            let mut cells = vec![String::new(); columns.max(1)];
            cells[0] = text.clone();
            cells
        }
    };
    PopupRow {
        node: node.clone(),
        cells,
    }
}

/// Text matched by speed search: usage text plus its group name.
pub fn speed_search_text(node: &UsageNode, view: &dyn UsageView) -> String {
    match node {
        UsageNode::Usage(r) => match view.group_label(r.group) {
            Some(group) => format!("{} {group}", r.usage.text),
            None => r.usage.text.clone(),
        },
        UsageNode::Text(_) | UsageNode::MoreUsages => String::new(),
    }
}

/// First row whose speed-search text contains `query`, ignoring case.
pub fn speed_search(rows: &[UsageNode], query: &str, view: &dyn UsageView) -> Option<usize> {
    let query = query.to_lowercase();
    if query.is_empty() {
        return None;
    }
    rows.iter()
        .position(|node| speed_search_text(node, view).to_lowercase().contains(&query))
}
