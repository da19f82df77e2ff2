use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// The core emits a `Vec<RenderCommand>` for the commit graph. Renderers
/// consume this list sequentially and each command carries all the data it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Fill a rectangle (row highlight, label background).
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        label: Option<SharedStr>,
    },

    /// Draw a straight line segment. Graph connectors are always axis
    /// aligned so that cell-based renderers can rasterize them exactly.
    DrawLine {
        from: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
    },

    /// Draw a commit mark.
    DrawCircle {
        center: Point,
        radius: f64,
        color: ThemeToken,
        filled: bool,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: SharedStr,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Offset all subsequent commands until the matching `PopTransform`.
    PushTransform { translate: Point },

    /// Pop the most recent transform.
    PopTransform,

    /// Begin a logical group (one graph row).
    BeginGroup {
        id: SharedStr,
        label: Option<SharedStr>,
    },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}
