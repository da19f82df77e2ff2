//! Row model, lane routing and refresh coordination for the gitlane commit
//! graph, plus the view transform that turns routed rows into render
//! commands.
//!
//! Nothing in this crate touches a repository; data comes in through
//! [`source::RepositorySource`].

pub mod jobs;
pub mod lanes;
pub mod model;
pub mod navigation;
pub mod refresh;
pub mod snapshot;
pub mod source;
pub mod svg;
pub mod topology;
pub mod views;

pub use model::{CommitIndex, LabelIndex, Row, RowSet};
pub use navigation::NavigationError;
pub use refresh::{RefreshCoordinator, RefreshState, RefreshTicket, RefreshTrigger, RowsReplaced};
pub use snapshot::{SelectionKey, Snapshot};
pub use source::{CommitQuery, RepositoryData, RepositorySource, SourceError};
pub use topology::{LaneWalker, RawCommit};
