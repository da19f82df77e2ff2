//! Lane routing: derives the connector lanes every row draws.
//!
//! Input is a [`RowSet`] whose commits already carry a lane and a
//! pass-through set. Output is one [`LayoutAnnotation`] per row, in row
//! order. Routing runs in two batch passes over the commit rows: exiting
//! lanes top to bottom, then entering lanes, which need the exiting set of
//! the row below. Parent and child links that leave the window are dropped.
//! The working-tree row only enters on its own lane, toward the commit below.

use gitlane_protocol::{CommitId, CommitRecord, Lane, LaneSet, LayoutAnnotation, RowMarker};

use crate::model::{CommitIndex, RowSet};

/// Route every row of `rows`. `head` is the commit HEAD points at, if any.
pub fn route(rows: &RowSet, head: Option<&CommitId>) -> Vec<LayoutAnnotation> {
    let commits = rows.commits();
    let index = rows.index();

    let exiting = exiting_lanes(commits, index);
    let entering = entering_lanes(commits, index, &exiting);

    let mut annotations = Vec::with_capacity(rows.len());
    if rows.has_work_tree() {
        let lane = rows.work_tree_lane();
        annotations.push(LayoutAnnotation {
            lane,
            marker: RowMarker::WorkTree,
            is_head: false,
            pass_through: LaneSet::new(),
            exiting: LaneSet::new(),
            entering: if commits.is_empty() {
                LaneSet::new()
            } else {
                LaneSet::from([lane])
            },
            head_lane: None,
        });
    }

    for ((commit, exiting), entering) in commits.iter().zip(exiting).zip(entering) {
        annotations.push(LayoutAnnotation {
            lane: commit.lane,
            marker: if commit.is_merge() {
                RowMarker::Merge
            } else {
                RowMarker::Commit
            },
            is_head: head == Some(&commit.id),
            pass_through: commit.pass_through.clone(),
            exiting,
            entering,
            head_lane: None,
        });
    }

    if let Some(head_row) = head.and_then(|id| rows.row_index_of(id)) {
        assign_head_lane(&mut annotations, head_row);
    }

    log::trace!("routed {} rows", annotations.len());
    annotations
}

/// Widest lane drawn by any row, for sizing the graph column.
pub fn max_lane(annotations: &[LayoutAnnotation]) -> Option<Lane> {
    annotations.iter().map(reach).max()
}

/// Rightmost lane a row occupies, its mark included.
fn reach(annotation: &LayoutAnnotation) -> Lane {
    annotation
        .max_lane()
        .map_or(annotation.lane, |lane| lane.max(annotation.lane))
}

/// Lanes leaving each commit row upward.
///
/// A lane that passed through the row above but not through this one ends
/// here. Every in-window child adds the lane it sits on, except merge
/// children: their edge stays on this commit's lane and the merge row draws
/// the bend.
fn exiting_lanes(commits: &[CommitRecord], index: &CommitIndex) -> Vec<LaneSet> {
    commits
        .iter()
        .enumerate()
        .map(|(pos, commit)| {
            let mut lanes: LaneSet = match pos.checked_sub(1).and_then(|p| commits.get(p)) {
                Some(prev) => prev
                    .pass_through
                    .difference(&commit.pass_through)
                    .copied()
                    .collect(),
                None => LaneSet::new(),
            };
            for (_, child) in commit
                .child_ids
                .iter()
                .filter_map(|id| index.resolve(commits, id))
            {
                lanes.insert(if child.is_merge() {
                    commit.lane
                } else {
                    child.lane
                });
            }
            lanes
        })
        .collect()
}

/// Lanes arriving at each commit row from below.
///
/// Whatever leaves the next row upward, plus whatever passes through it,
/// converges here unless it also passes through this row. Each in-window
/// parent adds its lane unless the parent already exits on this commit's
/// lane. The last row gets a stub on its own lane.
fn entering_lanes(
    commits: &[CommitRecord],
    index: &CommitIndex,
    exiting: &[LaneSet],
) -> Vec<LaneSet> {
    commits
        .iter()
        .enumerate()
        .map(|(pos, commit)| {
            let (Some(next), Some(next_exiting)) = (commits.get(pos + 1), exiting.get(pos + 1))
            else {
                return LaneSet::from([commit.lane]);
            };
            let mut lanes: LaneSet = next_exiting
                .union(&next.pass_through)
                .filter(|lane| !commit.pass_through.contains(lane))
                .copied()
                .collect();
            for (parent_pos, parent) in commit
                .parent_ids
                .iter()
                .filter_map(|id| index.resolve(commits, id))
            {
                let joins_own_lane = exiting
                    .get(parent_pos)
                    .is_some_and(|lanes| lanes.contains(&commit.lane));
                if !joins_own_lane {
                    lanes.insert(parent.lane);
                }
            }
            lanes
        })
        .collect()
}

/// Run a pointer strand from the top row down to HEAD at `head_row`.
///
/// The strand takes the first lane right of everything drawn above HEAD,
/// marks included, or HEAD's own lane when that is further right. HEAD on
/// the top row needs no strand.
fn assign_head_lane(annotations: &mut [LayoutAnnotation], head_row: usize) {
    if head_row == 0 {
        return;
    }
    let Some(head) = annotations.get(head_row) else {
        return;
    };
    let above = annotations[..head_row].iter().map(reach).max();
    let lane = above.map_or(0, |max| max + 1).max(head.lane);
    for annotation in &mut annotations[..=head_row] {
        annotation.head_lane = Some(lane);
    }
}
