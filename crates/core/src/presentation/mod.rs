//! Presentation state of the popup: caption, rows, selection and size.

pub mod geometry;
pub mod table;
pub mod title;

use crate::collector::ResultSnapshot;
use crate::diff::{apply_diff, diff_commands, translate_selection};
pub use geometry::PopupGeometry;
pub use table::PopupRow;
pub use title::{Title, TitleSpan};
use crate::config::Keymap;
use tracing::debug;
use usagescope_api::{SearchHandler, SearchOptions, UsageNode, UsageView};

/// "Press <shortcut> again to search in <scope>" while a wider scope exists.
pub fn second_invocation_text(
    keymap: &Keymap,
    handler: &dyn SearchHandler,
    options: &SearchOptions,
) -> Option<String> {
    let shortcut = keymap.show_usages.as_deref()?;
    let maximal = handler.maximal_scope();
    (options.scope != maximal)
        .then(|| format!("Press {shortcut} again to search in {}", maximal.display_name()))
}

pub fn usages_title(name: &str) -> String {
    format!("Usages of {name}")
}

/// Everything the host needs to draw the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub title: Title,
    pub rows: Vec<PopupRow>,
    pub columns: usize,
    pub selected: Option<usize>,
    /// Footer text, e.g. the "press again" suggestion.
    pub ad_text: Option<String>,
    pub geometry: PopupGeometry,
    pub in_progress: bool,
}

impl PopupView {
    pub fn selected_node(&self) -> Option<&UsageNode> {
        self.selected
            .and_then(|row| self.rows.get(row))
            .map(|row| &row.node)
    }
}

/// Inputs for one rebuild that are not part of the snapshot.
#[derive(Debug, Clone)]
pub struct RebuildContext<'a> {
    pub title: &'a str,
    pub name: &'a str,
    pub scope: &'a str,
    pub ad_text: Option<&'a str>,
    pub in_progress: bool,
    pub max_visible_rows: usize,
    pub available_rows: Option<usize>,
}

/// The rendered table, patched in place by diffing on each rebuild.
#[derive(Debug, Default)]
pub struct PopupModel {
    rows: Vec<UsageNode>,
    selected: Option<usize>,
    width: usize,
}

impl PopupModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[UsageNode] {
        &self.rows
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_node(&self) -> Option<&UsageNode> {
        self.selected.and_then(|row| self.rows.get(row))
    }

    /// Move the selection; out-of-range rows are ignored.
    pub fn select(&mut self, row: usize) -> bool {
        if row < self.rows.len() {
            self.selected = Some(row);
            true
        } else {
            false
        }
    }

    /// Replace the rows with `data`, keeping the selection on the same
    /// logical row where possible.
    pub fn update(&mut self, data: Vec<UsageNode>) {
        let cmds = diff_commands(&self.rows, &data);
        if cmds.is_empty() {
            return;
        }
        let had_usages = self.rows.iter().any(|node| node.usage().is_some());
        self.selected = if had_usages {
            translate_selection(&cmds, self.selected.or(Some(0)), data.len())
        } else {
            (!data.is_empty()).then_some(0)
        };
        debug!(commands = cmds.len(), rows = data.len(), "patching popup rows");
        apply_diff(&mut self.rows, cmds);
        debug_assert_eq!(self.rows, data);
    }

    pub fn speed_search(&mut self, query: &str, view: &dyn UsageView) -> Option<usize> {
        let row = table::speed_search(&self.rows, query, view)?;
        self.selected = Some(row);
        Some(row)
    }

    /// Rebuild from a snapshot and produce the view to hand to the host.
    pub fn rebuild(
        &mut self,
        snapshot: &ResultSnapshot,
        view: &dyn UsageView,
        ctx: &RebuildContext<'_>,
    ) -> PopupView {
        let data = table::collect_rows(snapshot, view, ctx.name, ctx.scope);
        self.update(data);
        self.render(snapshot, view, ctx)
    }

    /// Render the current rows without re-collecting them.
    pub fn render(
        &mut self,
        snapshot: &ResultSnapshot,
        view: &dyn UsageView,
        ctx: &RebuildContext<'_>,
    ) -> PopupView {
        let title = title::full_title(
            ctx.title,
            snapshot.usage_count(),
            snapshot.node_count(),
            snapshot.has_more,
            ctx.in_progress,
        );
        let columns = table::column_count(&self.rows);
        let rows: Vec<PopupRow> = self
            .rows
            .iter()
            .map(|node| table::render_row(node, view, columns))
            .collect();
        let geometry = geometry::fit(
            &rows,
            columns,
            ctx.max_visible_rows,
            ctx.available_rows,
            title.width(),
            self.width,
        );
        self.width = geometry.width;

        PopupView {
            title,
            rows,
            columns,
            selected: self.selected,
            ad_text: ctx.ad_text.map(str::to_string),
            geometry,
            in_progress: ctx.in_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::UsageEntry;
    use crate::settings::DisplaySettings;
    use crate::view::GroupedUsageView;
    use std::sync::Arc;
    use usagescope_api::{FilterRule, Range, Usage, UsageKind, UsageLocation};

    fn ctx(in_progress: bool) -> RebuildContext<'static> {
        RebuildContext {
            title: "Usages of foo",
            name: "foo",
            scope: "Project Files",
            ad_text: None,
            in_progress,
            max_visible_rows: 30,
            available_rows: None,
        }
    }

    fn add(view: &GroupedUsageView, snapshot: &mut ResultSnapshot, line: usize) {
        let usage = Arc::new(Usage::at(
            UsageLocation::new("/src/a.rs", Range::on_line(line, 0, 3)),
            format!("foo {line}"),
        ).with_kind(UsageKind::Read));
        let node = view.register_usage(&usage).unwrap();
        snapshot.usages.push(UsageEntry::Usage(usage));
        snapshot.nodes.push(UsageNode::Usage(node));
        snapshot.shown = view.visible_nodes();
    }

    #[test]
    fn selection_follows_row_across_rebuilds() {
        let view = GroupedUsageView::new(&DisplaySettings::popup());
        let mut snapshot = ResultSnapshot::default();
        let mut model = PopupModel::new();

        let first = model.rebuild(&snapshot, &view, &ctx(true));
        assert_eq!(first.columns, 1);
        assert_eq!(first.title.text(), "Usages of foo (0 usages so far)");

        add(&view, &mut snapshot, 5);
        add(&view, &mut snapshot, 9);
        model.rebuild(&snapshot, &view, &ctx(true));
        assert!(model.select(1));
        let selected = model.selected_node().cloned();

        add(&view, &mut snapshot, 1);
        let popup = model.rebuild(&snapshot, &view, &ctx(false));
        assert_eq!(popup.selected, Some(2));
        assert_eq!(popup.selected_node(), selected.as_ref());
        assert_eq!(popup.title.text(), "Usages of foo (3 usages)");
        assert_eq!(popup.columns, 3);
    }

    #[test]
    fn width_never_shrinks_within_a_session() {
        let view = GroupedUsageView::new(&DisplaySettings::popup());
        let mut snapshot = ResultSnapshot::default();
        let mut model = PopupModel::new();
        add(&view, &mut snapshot, 1);
        add(&view, &mut snapshot, 2);
        let wide = model.rebuild(&snapshot, &view, &ctx(true)).geometry.width;

        view.toggle_rule(FilterRule::Reads);
        snapshot.shown = view.visible_nodes();
        let narrow = model.rebuild(&snapshot, &view, &ctx(false));
        assert_eq!(narrow.columns, 1);
        assert_eq!(narrow.geometry.width, wide);
    }
}
