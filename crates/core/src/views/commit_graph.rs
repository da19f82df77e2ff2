use gitlane_protocol::{
    Lane, LayoutAnnotation, Point, Rect, RefKind, RenderCommand, RowMarker, SharedStr, TextAlign,
    ThemeToken,
};

use crate::model::Row;
use crate::snapshot::Snapshot;

const FONT_SIZE: f64 = 11.0;
const TEXT_PADDING: f64 = 6.0;
/// Rough advance of one glyph at `FONT_SIZE`, for laying out text runs.
const CHAR_WIDTH: f64 = 6.6;

/// Geometry of the graph column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphMetrics {
    /// Horizontal distance between neighbouring lanes.
    pub lane_pitch: f64,
    pub row_height: f64,
    pub line_width: f64,
    pub mark_radius: f64,
    /// Width reserved right of the graph for labels and summaries.
    pub text_width: f64,
}

impl Default for GraphMetrics {
    fn default() -> Self {
        Self {
            lane_pitch: 14.0,
            row_height: 22.0,
            line_width: 2.5,
            mark_radius: 4.0,
            text_width: 520.0,
        }
    }
}

impl GraphMetrics {
    /// One terminal cell per row, two cells per lane.
    pub const TERMINAL: GraphMetrics = GraphMetrics {
        lane_pitch: 2.0,
        row_height: 1.0,
        line_width: 1.0,
        mark_radius: 0.5,
        text_width: 0.0,
    };

    /// Centre of `lane`.
    pub fn lane_x(&self, lane: Lane) -> f64 {
        (f64::from(lane) + 0.5) * self.lane_pitch
    }

    pub fn mid_y(&self) -> f64 {
        self.row_height / 2.0
    }

    /// Width of the graph column when lanes go up to `max_lane`.
    pub fn graph_width(&self, max_lane: Option<Lane>) -> f64 {
        max_lane.map_or(0.0, |lane| f64::from(lane + 1) * self.lane_pitch)
    }
}

/// One run of row text in a single color.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub text: SharedStr,
    pub color: ThemeToken,
}

impl TextSegment {
    fn new(text: impl Into<SharedStr>, color: ThemeToken) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Connectors and mark of a single row, in row-local coordinates
/// (origin at the row's top-left corner).
///
/// Every line is axis aligned: bends are a horizontal run at mid height plus
/// a vertical run to the row edge.
pub fn render_row(annotation: &LayoutAnnotation, metrics: &GraphMetrics) -> Vec<RenderCommand> {
    let own = annotation.lane;
    let mut commands = Vec::with_capacity(
        2 * (annotation.pass_through.len() + annotation.exiting.len() + annotation.entering.len())
            + 4,
    );

    for &lane in &annotation.pass_through {
        let x = metrics.lane_x(lane);
        line(
            &mut commands,
            metrics,
            lane,
            Point::new(x, 0.0),
            Point::new(x, metrics.row_height),
        );
    }
    for &lane in &annotation.exiting {
        upper_bend(&mut commands, metrics, own, lane);
    }
    for &lane in &annotation.entering {
        lower_bend(&mut commands, metrics, own, lane);
    }

    if let Some(head) = annotation.head_lane {
        if annotation.is_head {
            upper_bend(&mut commands, metrics, own, head);
        } else if annotation.marker == RowMarker::WorkTree {
            lower_bend(&mut commands, metrics, own, head);
        } else {
            let x = metrics.lane_x(head);
            line(
                &mut commands,
                metrics,
                head,
                Point::new(x, 0.0),
                Point::new(x, metrics.row_height),
            );
        }
    }

    let center = Point::new(metrics.lane_x(own), metrics.mid_y());
    match annotation.marker {
        RowMarker::WorkTree => commands.push(RenderCommand::DrawCircle {
            center,
            radius: metrics.mark_radius,
            color: ThemeToken::WorkTreeMark,
            filled: false,
        }),
        RowMarker::Commit => commands.push(RenderCommand::DrawCircle {
            center,
            radius: metrics.mark_radius,
            color: ThemeToken::for_lane(own),
            filled: true,
        }),
        RowMarker::Merge => {
            commands.push(RenderCommand::DrawCircle {
                center,
                radius: metrics.mark_radius,
                color: ThemeToken::for_lane(own),
                filled: true,
            });
            commands.push(RenderCommand::DrawCircle {
                center,
                radius: metrics.mark_radius * 0.45,
                color: ThemeToken::MergeMark,
                filled: true,
            });
        }
    }
    commands
}

/// The whole graph with row text, one group per row, rows stacked by
/// transform.
pub fn render_graph(
    snapshot: &Snapshot,
    metrics: &GraphMetrics,
    selected: Option<usize>,
) -> Vec<RenderCommand> {
    let graph_width = metrics.graph_width(snapshot.max_lane());
    let total_width = graph_width + metrics.text_width;
    let mut commands = Vec::with_capacity(snapshot.len() * 12 + 2);
    commands.push(RenderCommand::BeginGroup {
        id: "commit-graph".into(),
        label: Some("Commit graph".into()),
    });

    for (row, annotation) in snapshot.annotations().iter().enumerate() {
        let top = row as f64 * metrics.row_height;
        if selected == Some(row) {
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(0.0, top, total_width, metrics.row_height),
                color: ThemeToken::SelectionHighlight,
                label: None,
            });
        }

        commands.push(RenderCommand::PushTransform {
            translate: Point::new(0.0, top),
        });
        commands.extend(render_row(annotation, metrics));

        let mut x = graph_width + TEXT_PADDING;
        let baseline = metrics.mid_y() + FONT_SIZE * 0.35;
        for segment in row_segments(snapshot, row) {
            let advance = (segment.text.chars().count() + 1) as f64 * CHAR_WIDTH;
            commands.push(RenderCommand::DrawText {
                position: Point::new(x, baseline),
                text: segment.text,
                color: segment.color,
                font_size: FONT_SIZE,
                align: TextAlign::Left,
            });
            x += advance;
        }
        commands.push(RenderCommand::PopTransform);
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

/// Text shown next to `row`: abbreviated id, ref labels, summary. The
/// working-tree row shows a change count instead.
pub fn row_segments(snapshot: &Snapshot, row: usize) -> Vec<TextSegment> {
    match snapshot.row(row) {
        None => Vec::new(),
        Some(Row::WorkTree(status)) => {
            let changed = status.staged.len() + status.modified.len();
            let mut segments = vec![TextSegment::new(
                format!("Uncommitted changes ({changed})"),
                ThemeToken::WorkTreeMark,
            )];
            if status.is_conflicting() {
                segments.push(TextSegment::new(
                    format!("{} conflicted", status.conflicting.len()),
                    ThemeToken::ConflictMark,
                ));
            }
            segments
        }
        Some(Row::Commit(commit)) => {
            let mut segments = vec![TextSegment::new(commit.id.short(), ThemeToken::TextMuted)];
            for label in snapshot.labels_for(&commit.id) {
                let color = match label.kind {
                    RefKind::LocalBranch if label.is_current => ThemeToken::CurrentBranchLabel,
                    RefKind::LocalBranch => ThemeToken::LocalBranchLabel,
                    RefKind::RemoteBranch => ThemeToken::RemoteBranchLabel,
                    RefKind::Tag => ThemeToken::TagLabel,
                };
                segments.push(TextSegment::new(format!("[{}]", label.name), color));
            }
            segments.push(TextSegment::new(
                commit.summary.clone(),
                ThemeToken::TextPrimary,
            ));
            segments
        }
    }
}

fn line(commands: &mut Vec<RenderCommand>, metrics: &GraphMetrics, lane: Lane, from: Point, to: Point) {
    commands.push(RenderCommand::DrawLine {
        from,
        to,
        color: ThemeToken::for_lane(lane),
        width: metrics.line_width,
    });
}

/// From the mark on `own` over to `lane`, then up to the top edge.
fn upper_bend(commands: &mut Vec<RenderCommand>, metrics: &GraphMetrics, own: Lane, lane: Lane) {
    let (x_own, x, mid) = (metrics.lane_x(own), metrics.lane_x(lane), metrics.mid_y());
    if lane != own {
        line(commands, metrics, lane, Point::new(x_own, mid), Point::new(x, mid));
    }
    line(commands, metrics, lane, Point::new(x, mid), Point::new(x, 0.0));
}

/// Up from the bottom edge on `lane`, then over to the mark on `own`.
fn lower_bend(commands: &mut Vec<RenderCommand>, metrics: &GraphMetrics, own: Lane, lane: Lane) {
    let (x_own, x, mid) = (metrics.lane_x(own), metrics.lane_x(lane), metrics.mid_y());
    line(
        commands,
        metrics,
        lane,
        Point::new(x, metrics.row_height),
        Point::new(x, mid),
    );
    if lane != own {
        line(commands, metrics, lane, Point::new(x, mid), Point::new(x_own, mid));
    }
}
