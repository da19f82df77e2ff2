use gitlane_core::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Git(#[from] git2::Error),
    #[error("operation cancelled")]
    Cancelled,
    #[error("conflicts in {}", .0.join(", "))]
    Conflicts(Vec<String>),
    #[error("branch {0} has no upstream")]
    NoUpstream(String),
    #[error("unknown revision: {0}")]
    UnknownRevision(String),
    #[error("{0}")]
    InvalidState(String),
}

impl From<RepoError> for SourceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::UnknownRevision(name) => SourceError::UnknownRevision(name),
            other => SourceError::Backend(other.to_string()),
        }
    }
}
