//! Cell renderer: rasterizes per-row graph commands into box-drawing glyphs
//! and paints the frame.

use gitlane_core::Snapshot;
use gitlane_core::views::{GraphMetrics, render_row, row_segments};
use gitlane_protocol::{LayoutAnnotation, Point, RenderCommand, ThemeToken};
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Paragraph},
};

const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;

const LANE_COLORS: [Color; 10] = [
    Color::Rgb(79, 163, 224),
    Color::Rgb(230, 126, 34),
    Color::Rgb(46, 204, 113),
    Color::Rgb(231, 76, 60),
    Color::Rgb(155, 89, 182),
    Color::Rgb(241, 196, 15),
    Color::Rgb(26, 188, 156),
    Color::Rgb(236, 112, 160),
    Color::Rgb(149, 165, 166),
    Color::Rgb(52, 152, 219),
];

pub fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::Lane(slot) => LANE_COLORS[usize::from(slot) % LANE_COLORS.len()],
        ThemeToken::MergeMark => Color::White,
        ThemeToken::WorkTreeMark => Color::Yellow,
        ThemeToken::ConflictMark => Color::LightRed,
        ThemeToken::TextPrimary => Color::White,
        ThemeToken::TextMuted => Color::DarkGray,
        ThemeToken::SelectionHighlight => Color::Rgb(40, 60, 90),
        ThemeToken::Background => Color::Black,
        ThemeToken::Border => Color::DarkGray,
        ThemeToken::LocalBranchLabel => Color::Green,
        ThemeToken::CurrentBranchLabel => Color::LightGreen,
        ThemeToken::RemoteBranchLabel => Color::Red,
        ThemeToken::TagLabel => Color::Yellow,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Commit,
    Merge,
    WorkTree,
}

/// One terminal cell of the graph column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GraphCell {
    edges: u8,
    mark: Option<Mark>,
    color: Option<ThemeToken>,
}

impl GraphCell {
    fn glyph(&self) -> char {
        match self.mark {
            Some(Mark::Commit) => return '●',
            Some(Mark::Merge) => return '◉',
            Some(Mark::WorkTree) => return '○',
            None => {}
        }
        match self.edges {
            0 => ' ',
            e if e == UP | DOWN => '│',
            e if e == LEFT | RIGHT => '─',
            e if e == UP | LEFT => '╯',
            e if e == UP | RIGHT => '╰',
            e if e == DOWN | LEFT => '╮',
            e if e == DOWN | RIGHT => '╭',
            e if e == UP | DOWN | LEFT => '┤',
            e if e == UP | DOWN | RIGHT => '├',
            e if e == UP | LEFT | RIGHT => '┴',
            e if e == DOWN | LEFT | RIGHT => '┬',
            e if e == UP => '╵',
            e if e == DOWN => '╷',
            e if e == LEFT => '╴',
            e if e == RIGHT => '╶',
            _ => '┼',
        }
    }
}

/// Column holding a point at `x`. Lane centres land on even columns.
fn column(x: f64) -> usize {
    (x - 0.5).max(0.0).floor() as usize
}

/// Rasterize one row into `columns` cells of (glyph, color).
pub fn row_glyphs(annotation: &LayoutAnnotation, columns: usize) -> Vec<(char, ThemeToken)> {
    let metrics = GraphMetrics::TERMINAL;
    let mid = metrics.mid_y();
    let mut cells = vec![GraphCell::default(); columns];

    for command in render_row(annotation, &metrics) {
        match command {
            RenderCommand::DrawLine { from, to, color, .. } => {
                stroke(&mut cells, from, to, mid, color);
            }
            RenderCommand::DrawCircle {
                center,
                color,
                filled,
                ..
            } => {
                let Some(cell) = cells.get_mut(column(center.x)) else {
                    continue;
                };
                cell.mark = Some(match (cell.mark, filled) {
                    (_, false) => Mark::WorkTree,
                    // A second filled mark on the same cell is the merge dot.
                    (Some(Mark::Commit), true) => Mark::Merge,
                    (_, true) => Mark::Commit,
                });
                if cell.mark != Some(Mark::Merge) {
                    cell.color = Some(color);
                }
            }
            _ => {}
        }
    }

    cells
        .iter()
        .map(|cell| {
            (
                cell.glyph(),
                cell.color.unwrap_or(ThemeToken::TextMuted),
            )
        })
        .collect()
}

fn stroke(cells: &mut [GraphCell], from: Point, to: Point, mid: f64, color: ThemeToken) {
    if from.x == to.x {
        let Some(cell) = cells.get_mut(column(from.x)) else {
            return;
        };
        let (top, bottom) = (from.y.min(to.y), from.y.max(to.y));
        if top < mid {
            cell.edges |= UP;
        }
        if bottom > mid {
            cell.edges |= DOWN;
        }
        cell.color.get_or_insert(color);
    } else {
        let (left, right) = (column(from.x.min(to.x)), column(from.x.max(to.x)));
        for col in left..=right {
            let Some(cell) = cells.get_mut(col) else {
                break;
            };
            if col > left {
                cell.edges |= LEFT;
            }
            if col < right {
                cell.edges |= RIGHT;
            }
            cell.color.get_or_insert(color);
        }
    }
}

/// What the status bar shows besides the row count.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    pub branch: Option<String>,
    pub message: Option<String>,
    pub is_error: bool,
    /// An open question; replaces the message while it waits for input.
    pub prompt: Option<String>,
}

impl StatusLine {
    fn text(&self, rows: usize) -> String {
        if let Some(prompt) = &self.prompt {
            return format!(" {prompt}");
        }
        let mut text = format!(" {rows} rows");
        if let Some(branch) = &self.branch {
            text.push_str(&format!(" | on {branch}"));
        }
        if let Some(message) = &self.message {
            text.push_str(&format!(" | {message}"));
        }
        text
    }

    fn style(&self) -> Style {
        if self.prompt.is_some() {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else if self.is_error {
            Style::default().fg(Color::White).bg(Color::Red)
        } else {
            Style::default().fg(Color::Black).bg(Color::Gray)
        }
    }
}

/// Paint header, graph rows from `scroll` and the status bar.
pub fn draw(
    frame: &mut Frame<'_>,
    title: &str,
    snapshot: &Snapshot,
    selected: Option<usize>,
    scroll: usize,
    status: &StatusLine,
) {
    let area = frame.area();
    let header_area = Rect::new(area.x, area.y, area.width, 1);
    let body_area = Rect::new(
        area.x,
        area.y + 1,
        area.width,
        area.height.saturating_sub(2),
    );
    let status_area = Rect::new(
        area.x,
        area.y + area.height.saturating_sub(1),
        area.width,
        1,
    );

    let header = Block::default()
        .title(format!(
            " gitlane: {title} | j/k h t move | c b T n D refs | s u d C stage | m R y x X history | f p P remote | r q "
        ))
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(header, header_area);

    draw_rows(frame.buffer_mut(), body_area, snapshot, selected, scroll);

    frame.render_widget(
        Paragraph::new(status.text(snapshot.len())).style(status.style()),
        status_area,
    );
}

fn draw_rows(
    buf: &mut Buffer,
    area: Rect,
    snapshot: &Snapshot,
    selected: Option<usize>,
    scroll: usize,
) {
    let metrics = GraphMetrics::TERMINAL;
    let columns = metrics.graph_width(snapshot.max_lane()) as usize;
    let right = area.x + area.width;

    for (line, row) in (scroll..snapshot.len())
        .take(usize::from(area.height))
        .enumerate()
    {
        let Some(annotation) = snapshot.annotation(row) else {
            break;
        };
        let y = area.y + line as u16;
        let bg = if selected == Some(row) {
            theme_to_color(ThemeToken::SelectionHighlight)
        } else {
            Color::Reset
        };
        if bg != Color::Reset {
            buf.set_style(Rect::new(area.x, y, area.width, 1), Style::default().bg(bg));
        }

        let mut x = area.x;
        for (glyph, color) in row_glyphs(annotation, columns) {
            if x >= right {
                break;
            }
            buf[(x, y)].set_char(glyph).set_fg(theme_to_color(color)).set_bg(bg);
            x += 1;
        }

        for segment in row_segments(snapshot, row) {
            x = x.saturating_add(1);
            let mut style = Style::default().fg(theme_to_color(segment.color)).bg(bg);
            if segment.color == ThemeToken::CurrentBranchLabel {
                style = style.add_modifier(Modifier::BOLD);
            }
            for ch in segment.text.chars() {
                if x >= right {
                    break;
                }
                buf[(x, y)].set_char(ch).set_style(style);
                x += 1;
            }
        }
    }
}
