//! Minimal edit scripts between two rendered row lists.

use similar::{Algorithm, DiffOp, capture_diff_slices};
use std::hash::Hash;

/// One primitive edit. Commands are emitted back to front, so indices always
/// refer to the list as it stands when the command is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffCmd<T> {
    Insert { index: usize, items: Vec<T> },
    /// Half-open range `start..end`.
    Remove { start: usize, end: usize },
}

/// A list that can be patched in place.
pub trait ListModel<T> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_items(&mut self, index: usize, items: Vec<T>);

    fn remove_range(&mut self, start: usize, end: usize);
}

impl<T> ListModel<T> for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn insert_items(&mut self, index: usize, items: Vec<T>) {
        self.splice(index..index, items);
    }

    fn remove_range(&mut self, start: usize, end: usize) {
        self.drain(start..end);
    }
}

/// Edit script turning `old` into `new`.
pub fn diff_commands<T: Eq + Hash + Ord + Clone>(old: &[T], new: &[T]) -> Vec<DiffCmd<T>> {
    let ops = capture_diff_slices(Algorithm::Myers, old, new);
    let mut cmds = Vec::with_capacity(ops.len());
    // ops index into `old`, so later hunks go first
    for op in ops.into_iter().rev() {
        match op {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete {
                old_index, old_len, ..
            } => cmds.push(DiffCmd::Remove {
                start: old_index,
                end: old_index + old_len,
            }),
            DiffOp::Insert {
                old_index,
                new_index,
                new_len,
            } => cmds.push(DiffCmd::Insert {
                index: old_index,
                items: new[new_index..new_index + new_len].to_vec(),
            }),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                cmds.push(DiffCmd::Remove {
                    start: old_index,
                    end: old_index + old_len,
                });
                cmds.push(DiffCmd::Insert {
                    index: old_index,
                    items: new[new_index..new_index + new_len].to_vec(),
                });
            }
        }
    }
    cmds
}

/// Apply an edit script produced by [`diff_commands`].
pub fn apply_diff<T, M: ListModel<T> + ?Sized>(model: &mut M, cmds: Vec<DiffCmd<T>>) {
    for cmd in cmds {
        match cmd {
            DiffCmd::Insert { index, items } => {
                assert!(index <= model.len(), "insert at {index} past end");
                model.insert_items(index, items);
            }
            DiffCmd::Remove { start, end } => {
                assert!(start <= end && end <= model.len(), "bad remove {start}..{end}");
                model.remove_range(start, end);
            }
        }
    }
}

/// Carry a selected row through an edit script, clamping it into the
/// resulting list of `final_len` rows.
pub fn translate_selection<T>(
    cmds: &[DiffCmd<T>],
    selection: Option<usize>,
    final_len: usize,
) -> Option<usize> {
    let mut row = selection?;
    for cmd in cmds {
        row = match cmd {
            DiffCmd::Insert { index, items } if row >= *index => row + items.len(),
            DiffCmd::Insert { .. } => row,
            DiffCmd::Remove { start, end } => {
                if row < *start {
                    row
                } else if row >= *end {
                    row - (end - start)
                } else {
                    *start
                }
            }
        };
    }
    if final_len == 0 {
        None
    } else {
        Some(row.min(final_len - 1))
    }
}
