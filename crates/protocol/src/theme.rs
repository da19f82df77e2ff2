use serde::{Deserialize, Serialize};

/// Number of distinct lane colors before the palette wraps around.
pub const LANE_PALETTE_SIZE: u8 = 10;

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    /// Color slot for a graph lane, `0..LANE_PALETTE_SIZE`.
    Lane(u8),
    /// Inner dot drawn on top of a merge commit mark.
    MergeMark,
    WorkTreeMark,
    ConflictMark,

    TextPrimary,
    TextMuted,

    SelectionHighlight,

    Background,
    Border,

    // Ref decorations
    LocalBranchLabel,
    CurrentBranchLabel,
    RemoteBranchLabel,
    TagLabel,
}

impl ThemeToken {
    /// The palette slot used to draw `lane`.
    pub fn for_lane(lane: u32) -> Self {
        ThemeToken::Lane((lane % u32::from(LANE_PALETTE_SIZE)) as u8)
    }
}
