use serde::{Deserialize, Serialize};

use crate::graph::{Lane, LaneSet};

/// What kind of mark a row draws on its own lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowMarker {
    Commit,
    Merge,
    WorkTree,
}

/// Per-row layout facts produced by the lane routing engine.
///
/// This is the read-only projection every renderer consumes, for commit rows
/// and the working-tree row alike:
///
/// - `pass_through` lanes cross the full row height.
/// - `exiting` lanes leave the mark upward, bending from `lane` when they differ.
/// - `entering` lanes arrive from below, bending into `lane` when they differ.
/// - `head_lane` is the pointer strand from the top of the window down to HEAD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutAnnotation {
    pub lane: Lane,
    pub marker: RowMarker,
    /// The row holds the commit HEAD points at.
    pub is_head: bool,
    pub pass_through: LaneSet,
    pub exiting: LaneSet,
    pub entering: LaneSet,
    pub head_lane: Option<Lane>,
}

impl LayoutAnnotation {
    /// Highest lane this row draws on, used to size the graph column.
    ///
    /// The row's own `lane` is deliberately not part of the maximum; `None`
    /// means the row draws no connector at all.
    pub fn max_lane(&self) -> Option<Lane> {
        let sets = self
            .pass_through
            .iter()
            .chain(&self.exiting)
            .chain(&self.entering)
            .copied()
            .max();
        sets.max(self.head_lane)
    }

    /// Every lane touched by this row, including its own.
    pub fn lanes(&self) -> LaneSet {
        let mut all: LaneSet = self
            .pass_through
            .iter()
            .chain(&self.exiting)
            .chain(&self.entering)
            .copied()
            .collect();
        all.insert(self.lane);
        all
    }
}
