use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;

/// A column index in the commit graph.
pub type Lane = u32;

/// Ordered, duplicate-free lane set. Ordering keeps layouts deterministic.
pub type LaneSet = BTreeSet<Lane>;

/// Opaque commit identity (hex object id for git).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(SharedStr);

impl CommitId {
    pub fn new(id: impl Into<SharedStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Abbreviated form for display.
    pub fn short(&self) -> &str {
        let s = self.0.as_str();
        s.get(..7).unwrap_or(s)
    }
}

impl std::borrow::Borrow<str> for CommitId {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One commit as delivered by the topology provider, with its lane already
/// assigned.
///
/// Immutable for the lifetime of a refresh. Parent and child references may
/// point outside the loaded window; consumers treat those as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: CommitId,
    /// Ordered parents; the first one is the mainline parent.
    pub parent_ids: Vec<CommitId>,
    /// Direct descendants inside the loaded window.
    pub child_ids: Vec<CommitId>,
    /// Column assigned by the topology provider.
    pub lane: Lane,
    /// Lanes of unrelated strands crossing this row without touching it.
    pub pass_through: LaneSet,
    /// First line of the commit message.
    #[serde(default)]
    pub summary: SharedStr,
    #[serde(default)]
    pub author: SharedStr,
    /// Commit time in seconds since the Unix epoch.
    #[serde(default)]
    pub time: i64,
}

impl CommitRecord {
    pub fn new(id: impl Into<CommitId>, lane: Lane) -> Self {
        Self {
            id: id.into(),
            parent_ids: Vec::new(),
            child_ids: Vec::new(),
            lane,
            pass_through: LaneSet::new(),
            summary: SharedStr::default(),
            author: SharedStr::default(),
            time: 0,
        }
    }

    pub fn with_parents<I, T>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CommitId>,
    {
        self.parent_ids = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CommitId>,
    {
        self.child_ids = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pass_through(mut self, lanes: impl IntoIterator<Item = Lane>) -> Self {
        self.pass_through = lanes.into_iter().collect();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<SharedStr>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Whether this commit has more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }
}

/// Paths with uncommitted changes, grouped by state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkTreeStatus {
    pub staged: BTreeSet<String>,
    pub modified: BTreeSet<String>,
    pub conflicting: BTreeSet<String>,
}

impl WorkTreeStatus {
    /// Any staged, modified or conflicting path present.
    pub fn is_dirty(&self) -> bool {
        !(self.staged.is_empty() && self.modified.is_empty() && self.conflicting.is_empty())
    }

    pub fn is_conflicting(&self) -> bool {
        !self.conflicting.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RefKind {
    LocalBranch,
    RemoteBranch,
    Tag,
}

/// A branch or tag name decorating a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefLabel {
    /// Short name (`main`, `origin/main`, `v1.0`).
    pub name: SharedStr,
    pub kind: RefKind,
    pub target: CommitId,
    /// Set on the local branch HEAD points at.
    #[serde(default)]
    pub is_current: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_detection_counts_all_parents() {
        let plain = CommitRecord::new("a", 0).with_parents(["b"]);
        let merge = CommitRecord::new("m", 0).with_parents(["b", "c"]);
        let root = CommitRecord::new("r", 0);
        assert!(!plain.is_merge());
        assert!(merge.is_merge());
        assert!(!root.is_merge());
    }

    #[test]
    fn short_id_truncates_long_ids_only() {
        let id = CommitId::from("0123456789abcdef");
        assert_eq!(id.short(), "0123456");
        assert_eq!(CommitId::from("abc").short(), "abc");
    }

    #[test]
    fn dirtiness_covers_every_group() {
        let mut status = WorkTreeStatus::default();
        assert!(!status.is_dirty());
        status.conflicting.insert("src/lib.rs".into());
        assert!(status.is_dirty());
        assert!(status.is_conflicting());
    }

    #[test]
    fn record_json_defaults_display_metadata() {
        let json = r#"{"id":"c1","parent_ids":["c2"],"child_ids":[],"lane":2,"pass_through":[0,1]}"#;
        let record: CommitRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(record.id, CommitId::from("c1"));
        assert_eq!(record.lane, 2);
        assert_eq!(record.pass_through, LaneSet::from([0, 1]));
        assert_eq!(record.summary, "");
    }
}
