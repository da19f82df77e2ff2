use std::borrow::Borrow;
use std::hash::Hash;

use gitlane_protocol::{CommitId, CommitRecord, Lane, WorkTreeStatus};

use super::index::CommitIndex;

/// One visible row: the synthetic working-tree row or a commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Row<'a> {
    WorkTree(&'a WorkTreeStatus),
    Commit(&'a CommitRecord),
}

impl<'a> Row<'a> {
    pub fn commit(&self) -> Option<&'a CommitRecord> {
        match self {
            Row::Commit(commit) => Some(commit),
            Row::WorkTree(_) => None,
        }
    }

    pub fn commit_id(&self) -> Option<&'a CommitId> {
        self.commit().map(|commit| &commit.id)
    }

    pub fn is_work_tree(&self) -> bool {
        matches!(self, Row::WorkTree(_))
    }
}

/// The ordered rows of one refresh.
///
/// Row 0 is the working-tree row when the status handed to [`RowSet::build`]
/// was dirty. Commit rows follow in provider order, newest first.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    work_tree: Option<WorkTreeStatus>,
    commits: Vec<CommitRecord>,
    index: CommitIndex,
}

impl RowSet {
    pub fn build(commits: Vec<CommitRecord>, status: WorkTreeStatus) -> Self {
        let work_tree = status.is_dirty().then_some(status);
        let index = CommitIndex::build(&commits);
        Self {
            work_tree,
            commits,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.commits.len() + self.commit_offset()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_work_tree(&self) -> bool {
        self.work_tree.is_some()
    }

    /// Row number of the first commit.
    pub fn commit_offset(&self) -> usize {
        usize::from(self.work_tree.is_some())
    }

    pub fn work_tree(&self) -> Option<&WorkTreeStatus> {
        self.work_tree.as_ref()
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn index(&self) -> &CommitIndex {
        &self.index
    }

    pub fn get(&self, row: usize) -> Option<Row<'_>> {
        match (&self.work_tree, row) {
            (Some(status), 0) => Some(Row::WorkTree(status)),
            (Some(_), row) => self.commits.get(row - 1).map(Row::Commit),
            (None, row) => self.commits.get(row).map(Row::Commit),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.work_tree
            .iter()
            .map(Row::WorkTree)
            .chain(self.commits.iter().map(Row::Commit))
    }

    pub fn commit<Q>(&self, id: &Q) -> Option<&CommitRecord>
    where
        CommitId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.resolve(&self.commits, id).map(|(_, commit)| commit)
    }

    /// Row number of commit `id`, accounting for the working-tree row.
    pub fn row_index_of<Q>(&self, id: &Q) -> Option<usize>
    where
        CommitId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.position_of(id).map(|pos| pos + self.commit_offset())
    }

    /// Lane the working-tree row draws on: the lane of the first commit.
    pub fn work_tree_lane(&self) -> Lane {
        self.commits.first().map_or(0, |commit| commit.lane)
    }
}
