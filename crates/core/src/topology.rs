//! Lane assignment for a newest-first commit list.
//!
//! [`LaneWalker`] turns raw commits (id and parents) into [`CommitRecord`]s
//! carrying the lane, pass-through set and in-window children the lane
//! routing engine expects. Parents outside the list are clipped: they get no
//! strand and no lane.

use std::collections::HashMap;

use gitlane_protocol::{CommitId, CommitRecord, Lane, LaneSet, SharedStr};
use serde::{Deserialize, Serialize};

/// A commit as read from the repository, before lane assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCommit {
    pub id: CommitId,
    #[serde(default)]
    pub parent_ids: Vec<CommitId>,
    #[serde(default)]
    pub summary: SharedStr,
    #[serde(default)]
    pub author: SharedStr,
    #[serde(default)]
    pub time: i64,
}

impl RawCommit {
    pub fn new<I, T>(id: impl Into<CommitId>, parents: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CommitId>,
    {
        Self {
            id: id.into(),
            parent_ids: parents.into_iter().map(Into::into).collect(),
            summary: SharedStr::default(),
            author: SharedStr::default(),
            time: 0,
        }
    }
}

/// Assigns lanes by walking commits top to bottom.
///
/// Each lane holds at most one strand at a time: the edge from the commit
/// that opened it down to the parent it is waiting for. A commit takes the
/// lane some child reserved for it, or a fresh one when it has no child in
/// the list. Merges keep their first parent on their own lane and open one
/// lane per further parent that no other strand already leads to.
#[derive(Debug, Clone, Copy)]
pub struct LaneWalker {
    reuse_lanes: bool,
}

impl Default for LaneWalker {
    fn default() -> Self {
        Self { reuse_lanes: true }
    }
}

impl LaneWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `false`, a lane is never handed out twice, so every lane number
    /// identifies a single strand across the whole list. Layouts get wider.
    pub fn reuse_lanes(mut self, reuse: bool) -> Self {
        self.reuse_lanes = reuse;
        self
    }

    pub fn assign(&self, commits: Vec<RawCommit>) -> Vec<CommitRecord> {
        let mut positions: HashMap<CommitId, usize> = HashMap::with_capacity(commits.len());
        for (pos, commit) in commits.iter().enumerate() {
            positions.entry(commit.id.clone()).or_insert(pos);
        }

        // Only edges pointing further down the list take part in the layout.
        let parent_positions: Vec<Vec<(usize, usize)>> = commits
            .iter()
            .enumerate()
            .map(|(pos, commit)| {
                let mut seen = Vec::new();
                for (order, parent) in commit.parent_ids.iter().enumerate() {
                    if let Some(&p) = positions.get(parent)
                        && p > pos
                        && !seen.iter().any(|&(_, q)| q == p)
                    {
                        seen.push((order, p));
                    }
                }
                seen
            })
            .collect();

        let mut children: Vec<Vec<CommitId>> = vec![Vec::new(); commits.len()];
        for (pos, parents) in parent_positions.iter().enumerate() {
            for &(_, p) in parents {
                if let (Some(list), Some(child)) = (children.get_mut(p), commits.get(pos)) {
                    list.push(child.id.clone());
                }
            }
        }

        let mut table = LaneTable::new(self.reuse_lanes);
        let mut reserved: HashMap<usize, Lane> = HashMap::new();
        let mut records = Vec::with_capacity(commits.len());

        for (pos, (raw, parents)) in commits.into_iter().zip(parent_positions).enumerate() {
            let lane = match reserved.remove(&pos) {
                Some(lane) => lane,
                None => table.allocate(),
            };
            let pass_through = table.passing(pos);
            table.release(pos);

            if raw.parent_ids.len() > 1 {
                for (order, parent) in parents {
                    if reserved.contains_key(&parent) {
                        continue;
                    }
                    let strand = if order == 0 { lane } else { table.allocate() };
                    table.occupy(strand, parent);
                    reserved.insert(parent, strand);
                }
            } else if let Some(&(_, parent)) = parents.first() {
                if !reserved.contains_key(&parent) {
                    reserved.insert(parent, lane);
                }
                table.occupy(lane, parent);
            }

            let child_ids = children.get_mut(pos).map(std::mem::take).unwrap_or_default();
            records.push(CommitRecord {
                id: raw.id,
                parent_ids: raw.parent_ids,
                child_ids,
                lane,
                pass_through,
                summary: raw.summary,
                author: raw.author,
                time: raw.time,
            });
        }

        log::debug!(
            "assigned lanes to {} commits, widest lane {}",
            records.len(),
            table.width()
        );
        records
    }
}

/// Lane occupancy while walking: `slots[lane]` is the position of the commit
/// the strand on that lane leads to.
#[derive(Debug)]
struct LaneTable {
    slots: Vec<Option<usize>>,
    reuse: bool,
}

impl LaneTable {
    fn new(reuse: bool) -> Self {
        Self {
            slots: Vec::new(),
            reuse,
        }
    }

    fn allocate(&mut self) -> Lane {
        if self.reuse
            && let Some(free) = self.slots.iter().position(Option::is_none)
        {
            // Park the lane until the caller decides where it leads.
            return free as Lane;
        }
        self.slots.push(None);
        (self.slots.len() - 1) as Lane
    }

    fn occupy(&mut self, lane: Lane, target: usize) {
        let idx = lane as usize;
        if self.slots.len() <= idx {
            self.slots.resize(idx + 1, None);
        }
        self.slots[idx] = Some(target);
    }

    /// Lanes carrying a strand past row `pos` without ending there.
    fn passing(&self, pos: usize) -> LaneSet {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, target)| matches!(target, Some(t) if *t != pos))
            .map(|(lane, _)| lane as Lane)
            .collect()
    }

    /// Close every strand ending at `pos`.
    fn release(&mut self, pos: usize) {
        for slot in &mut self.slots {
            if *slot == Some(pos) {
                *slot = None;
            }
        }
    }

    fn width(&self) -> usize {
        self.slots.len()
    }
}
