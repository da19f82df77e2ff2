//! Jumping to commits, labels and tagged rows.

use gitlane_protocol::{CommitId, RefKind};
use thiserror::Error;

use crate::model::{LabelIndex, RowSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("commit {0} is not in the loaded window")]
    NotInWindow(CommitId),
    #[error("no branch or tag named {0}")]
    UnknownLabel(String),
}

/// Row showing commit `id`.
pub fn jump_to(rows: &RowSet, id: &CommitId) -> Result<usize, NavigationError> {
    rows.row_index_of(id)
        .ok_or_else(|| NavigationError::NotInWindow(id.clone()))
}

/// Row showing the commit the branch or tag `name` points at.
pub fn jump_to_label(
    rows: &RowSet,
    labels: &LabelIndex,
    name: &str,
) -> Result<usize, NavigationError> {
    let label = labels
        .find(name)
        .ok_or_else(|| NavigationError::UnknownLabel(name.to_owned()))?;
    jump_to(rows, &label.target)
}

/// First row after `after` (wrapping) whose commit carries a tag.
pub fn next_tagged_row(rows: &RowSet, labels: &LabelIndex, after: Option<usize>) -> Option<usize> {
    let len = rows.len();
    if len == 0 {
        return None;
    }
    let start = after.map_or(0, |row| row + 1);
    (0..len)
        .map(|step| (start + step) % len)
        .find(|&row| {
            rows.get(row)
                .and_then(|r| r.commit_id())
                .is_some_and(|id| labels.has_kind(id, RefKind::Tag))
        })
}
