//! Git backend for gitlane, built on libgit2.
//!
//! [`GitRepository`] answers the read queries of
//! [`gitlane_core::RepositorySource`] and runs the mutating
//! [`Operation`]s, reporting progress and honouring cancellation through a
//! [`gitlane_core::jobs::JobContext`].

mod error;
mod operations;
mod remote;
mod repository;

pub use error::RepoError;
pub use operations::{Operation, ResetMode};
pub use repository::GitRepository;
