pub mod index;
pub mod labels;
pub mod rows;

pub use index::CommitIndex;
pub use labels::LabelIndex;
pub use rows::{Row, RowSet};
