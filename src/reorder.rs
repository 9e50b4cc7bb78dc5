//! Every operation checks its inputs before touching the rows.

use std::ops::Range;

use crate::error::MoveError;
use crate::tree::Row;

/// The row at `index` plus the run of following rows nested deeper than it.
/// Empty when `index` is out of range.
pub fn subtree_span(rows: &[Row], index: usize) -> Range<usize> {
    let Some(root) = rows.get(index) else {
        return index..index;
    };
    let end = rows[index + 1..]
        .iter()
        .position(|row| row.depth <= root.depth)
        .map_or(rows.len(), |offset| index + 1 + offset);
    index..end
}

fn check_index(rows: &[Row], index: usize) -> Result<(), MoveError> {
    if index < rows.len() {
        Ok(())
    } else {
        Err(MoveError::OutOfRange {
            index,
            len: rows.len(),
        })
    }
}

/// Moves the subtree rooted at `from` onto the row at `to`.
///
/// The moved block is re-rooted at the target's depth, keeping its internal
/// nesting. Moving up places it just before the target; moving down places it
/// just after the target's own subtree. Returns where the block ended up.
pub fn move_subtree(rows: &mut Vec<Row>, from: usize, to: usize) -> Result<Range<usize>, MoveError> {
    if from == to {
        return Err(MoveError::SameIndex);
    }
    check_index(rows, from)?;
    check_index(rows, to)?;

    let span = subtree_span(rows, from);
    if span.contains(&to) {
        return Err(MoveError::IntoOwnSubtree);
    }
    let count = span.len();
    let source_depth = rows[from].depth;
    let target_depth = rows[to].depth;
    let insert_at = if to > from {
        subtree_span(rows, to).end - count
    } else {
        to
    };

    let mut block: Vec<Row> = rows.drain(span).collect();
    for row in &mut block {
        row.depth = target_depth + (row.depth - source_depth);
    }
    rows.splice(insert_at..insert_at, block);
    tracing::debug!(from, to, count, insert_at, "moved subtree");
    Ok(insert_at..insert_at + count)
}

/// Removes the row at `index` and everything nested under it.
pub fn delete_subtree(rows: &mut Vec<Row>, index: usize) -> Result<Vec<Row>, MoveError> {
    check_index(rows, index)?;
    let span = subtree_span(rows, index);
    Ok(rows.drain(span).collect())
}

/// Copies the subtree at `index` right after itself.
pub fn duplicate_subtree(rows: &mut Vec<Row>, index: usize) -> Result<Range<usize>, MoveError> {
    check_index(rows, index)?;
    let span = subtree_span(rows, index);
    let copy: Vec<Row> = rows[span.clone()].to_vec();
    let count = copy.len();
    rows.splice(span.end..span.end, copy);
    Ok(span.end..span.end + count)
}

/// Inserts a single row; `index` may equal the length to append.
pub fn insert_row(rows: &mut Vec<Row>, index: usize, row: Row) -> Result<(), MoveError> {
    if index > rows.len() {
        return Err(MoveError::OutOfRange {
            index,
            len: rows.len(),
        });
    }
    rows.insert(index, row);
    Ok(())
}
