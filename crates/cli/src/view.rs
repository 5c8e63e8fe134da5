use nu_ansi_term::{Color, Style};
use serde_json::json;
use tabled::builder::Builder;
use tabled::settings::Style as TableStyle;
use usagescope_api::{SearchRequest, SearchTarget, Usage};
use usagescope_core::{Hint, HintKind, PopupView, SessionOutcome, Title};

pub fn render_title(title: &Title) -> String {
    title
        .spans
        .iter()
        .map(|span| {
            if span.emphasized {
                Style::new().bold().paint(span.text.as_str()).to_string()
            } else {
                span.text.clone()
            }
        })
        .collect()
}

/// First row of the window of `visible` rows that keeps `selected` in view.
fn window_start(total: usize, visible: usize, selected: Option<usize>) -> usize {
    let visible = visible.max(1);
    let Some(selected) = selected else {
        return 0;
    };
    let start = selected.saturating_sub(visible - 1);
    start.min(total.saturating_sub(visible))
}

/// The popup as a table: row index, selection marker and the row cells.
pub fn render_popup(view: &PopupView) -> String {
    let total = view.rows.len();
    let visible = view.geometry.visible_rows.max(1);
    let start = window_start(total, visible, view.selected);
    let end = (start + visible).min(total);

    let mut builder = Builder::default();
    for (index, row) in view.rows.iter().enumerate().take(end).skip(start) {
        let marker = if view.selected == Some(index) { ">" } else { " " };
        let mut record = vec![marker.to_string(), index.to_string()];
        record.extend(row.cells.iter().cloned());
        builder.push_record(record);
    }
    let mut table = builder.build();
    table.with(TableStyle::blank());

    let mut out = Color::LightBlue.paint(render_title(&view.title)).to_string();
    if view.in_progress {
        out.push_str(&Color::DarkGray.paint(" (searching)").to_string());
    }
    out.push('\n');
    out.push_str(&table.to_string());
    if end < total || start > 0 {
        out.push('\n');
        let hidden = Color::DarkGray.paint(format!(
            "rows {}-{} of {}",
            start,
            end.saturating_sub(1),
            total
        ));
        out.push_str(&hidden.to_string());
    }
    if let Some(ad) = &view.ad_text {
        out.push('\n');
        out.push_str(&Color::DarkGray.italic().paint(ad.as_str()).to_string());
    }
    out
}

/// Machine-readable popup for scripted use.
pub fn popup_json(view: &PopupView) -> serde_json::Value {
    let rows: Vec<_> = view
        .rows
        .iter()
        .map(|row| {
            json!({
                "cells": row.cells,
                "usage": row.node.usage().map(|u| u.as_ref()),
                "more": row.node.is_more_usages(),
            })
        })
        .collect();
    json!({
        "title": view.title.text(),
        "selected": view.selected,
        "ad_text": view.ad_text,
        "in_progress": view.in_progress,
        "rows": rows,
    })
}

pub fn render_hint(hint: &Hint) -> String {
    let color = match hint.kind {
        HintKind::Information => Color::Yellow,
        HintKind::Error => Color::Red,
    };
    let mut out = color.paint(hint.text.as_str()).to_string();
    if let Some(secondary) = &hint.secondary {
        out.push('\n');
        out.push_str(&Color::DarkGray.paint(secondary.as_str()).to_string());
    }
    out
}

pub fn render_navigation(usage: &Usage) -> String {
    match &usage.location {
        Some(location) => format!(
            "{} {}:{}:{}  {}",
            Color::Green.paint("->"),
            location.path.display(),
            location.range.start_line + 1,
            location.range.start_col + 1,
            usage.text
        ),
        None => format!("{} {}", Color::Green.paint("->"), usage.text),
    }
}

pub fn render_full_view(request: &SearchRequest) -> String {
    let names: Vec<&str> = request.primary.iter().map(|t| t.name.as_str()).collect();
    format!(
        "Find Usages of {} in {} opened in the usages panel",
        names.join(", "),
        request.options.scope
    )
}

pub fn render_candidates(candidates: &[SearchTarget]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["#".to_string(), "target".to_string()]);
    for (index, target) in candidates.iter().enumerate() {
        builder.push_record([index.to_string(), target.to_string()]);
    }
    let mut table = builder.build();
    table.with(TableStyle::psql());
    format!("Several declarations match, pass --pick <#>:\n{table}")
}

pub fn render_outcome(outcome: &SessionOutcome) -> Option<String> {
    let text = match outcome {
        SessionOutcome::Cancelled => "Popup closed".to_string(),
        SessionOutcome::HandedOff => "Handed over to the usages panel".to_string(),
        SessionOutcome::NoUsages { .. } => return None,
        SessionOutcome::NavigatedSingle { .. } | SessionOutcome::Navigated { .. } => return None,
        other => format!("Session ended: {}", other.state()),
    };
    Some(Color::DarkGray.paint(text).to_string())
}
