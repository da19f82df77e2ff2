//! The repository interface the core consumes.

use gitlane_protocol::{CommitId, CommitRecord, RefLabel, WorkTreeStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unknown revision: {0}")]
    UnknownRevision(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("repository backend error: {0}")]
    Backend(String),
}

/// Read-only queries answered by a repository backend.
pub trait RepositorySource {
    /// Commits reachable from `tips` (every branch when empty), newest first,
    /// at most `limit` of them, with lanes and pass-through sets assigned.
    fn list_commits(&self, tips: &[String], limit: usize)
    -> Result<Vec<CommitRecord>, SourceError>;

    /// The commit HEAD resolves to; `None` on an unborn branch.
    fn current_head(&self) -> Result<Option<CommitId>, SourceError>;

    fn work_tree_status(&self) -> Result<WorkTreeStatus, SourceError>;

    /// Branch and tag decorations.
    fn refs(&self) -> Result<Vec<RefLabel>, SourceError>;
}

/// Which commits a refresh loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitQuery {
    /// Branch, tag or revision names; empty selects every local branch.
    pub tips: Vec<String>,
    pub limit: usize,
}

impl Default for CommitQuery {
    fn default() -> Self {
        Self {
            tips: Vec::new(),
            limit: 1000,
        }
    }
}

/// Everything one refresh reads from the repository.
#[derive(Debug, Clone, Default)]
pub struct RepositoryData {
    pub commits: Vec<CommitRecord>,
    pub head: Option<CommitId>,
    pub status: WorkTreeStatus,
    pub refs: Vec<RefLabel>,
}

impl RepositoryData {
    pub fn load(source: &dyn RepositorySource, query: &CommitQuery) -> Result<Self, SourceError> {
        let commits = source.list_commits(&query.tips, query.limit)?;
        let head = source.current_head()?;
        let status = source.work_tree_status()?;
        let refs = source.refs()?;
        log::debug!(
            "loaded {} commits, {} refs, dirty: {}",
            commits.len(),
            refs.len(),
            status.is_dirty()
        );
        Ok(Self {
            commits,
            head,
            status,
            refs,
        })
    }
}
