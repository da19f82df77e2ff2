use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use gitlane_protocol::{CommitId, CommitRecord};

/// Commit id to position lookup over the commit list of one refresh.
///
/// Positions count commits only. The working-tree row, when present, sits
/// in front of every commit and is not part of this index; callers that need
/// a row number go through [`RowSet::row_index_of`](super::RowSet::row_index_of).
#[derive(Debug, Clone, Default)]
pub struct CommitIndex {
    positions: HashMap<CommitId, usize>,
}

impl CommitIndex {
    /// Index `commits`. A repeated id keeps its first position.
    pub fn build(commits: &[CommitRecord]) -> Self {
        let mut positions = HashMap::with_capacity(commits.len());
        for (pos, commit) in commits.iter().enumerate() {
            positions.entry(commit.id.clone()).or_insert(pos);
        }
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position_of<Q>(&self, id: &Q) -> Option<usize>
    where
        CommitId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.get(id).copied()
    }

    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        CommitId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.contains_key(id)
    }

    /// Look `id` up in `commits`, the list this index was built from.
    pub fn resolve<'a, Q>(
        &self,
        commits: &'a [CommitRecord],
        id: &Q,
    ) -> Option<(usize, &'a CommitRecord)>
    where
        CommitId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.position_of(id)?;
        commits.get(pos).map(|commit| (pos, commit))
    }

    /// The commit listed directly above `id`.
    pub fn prev<'a, Q>(&self, commits: &'a [CommitRecord], id: &Q) -> Option<&'a CommitRecord>
    where
        CommitId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.position_of(id)?;
        commits.get(pos.checked_sub(1)?)
    }

    /// The commit listed directly below `id`.
    pub fn next<'a, Q>(&self, commits: &'a [CommitRecord], id: &Q) -> Option<&'a CommitRecord>
    where
        CommitId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.position_of(id)?;
        commits.get(pos + 1)
    }
}
