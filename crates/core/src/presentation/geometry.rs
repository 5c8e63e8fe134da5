use super::table::PopupRow;

/// Size of the popup table in rows and character cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupGeometry {
    pub visible_rows: usize,
    pub width: usize,
    pub column_widths: Vec<usize>,
}

const COLUMN_GAP: usize = 2;

pub fn column_widths(rows: &[PopupRow], columns: usize) -> Vec<usize> {
    let mut widths = vec![0; columns];
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

/// Fit the table: at most `max_visible_rows` (and what the host can show),
/// at least one row. The width never drops below `previous_width`.
pub fn fit(
    rows: &[PopupRow],
    columns: usize,
    max_visible_rows: usize,
    available_rows: Option<usize>,
    title_width: usize,
    previous_width: usize,
) -> PopupGeometry {
    let mut visible_rows = rows.len().min(max_visible_rows).max(1);
    if let Some(available) = available_rows {
        visible_rows = visible_rows.min(available.max(1));
    }
    let column_widths = column_widths(rows, columns);
    let content = column_widths.iter().sum::<usize>() + COLUMN_GAP * columns.saturating_sub(1);
    PopupGeometry {
        visible_rows,
        width: content.max(title_width).max(previous_width),
        column_widths,
    }
}
