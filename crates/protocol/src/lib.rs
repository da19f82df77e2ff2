pub mod commands;
pub mod graph;
pub mod layout;
pub mod shared_str;
pub mod theme;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use graph::{
    CommitId, CommitRecord, Lane, LaneSet, RefKind, RefLabel, WorkTreeStatus,
};
pub use layout::{LayoutAnnotation, RowMarker};
pub use shared_str::SharedStr;
pub use theme::{LANE_PALETTE_SIZE, ThemeToken};
pub use types::{Point, Rect};
