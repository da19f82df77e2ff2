pub mod commit_graph;

pub use commit_graph::{GraphMetrics, TextSegment, render_graph, render_row, row_segments};
