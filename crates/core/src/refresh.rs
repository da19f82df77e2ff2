//! Refresh coordination.
//!
//! The coordinator owns the current [`Snapshot`] and the selection. A refresh
//! is split in two so that the repository read can run anywhere: `request`
//! hands out a [`RefreshTicket`], the caller loads [`RepositoryData`], and
//! `complete` swaps the snapshot in. Requests that arrive while a ticket is
//! outstanding collapse into a single follow-up run.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use gitlane_protocol::{CommitId, LayoutAnnotation};

use crate::model::Row;
use crate::navigation::NavigationError;
use crate::snapshot::{SelectionKey, Snapshot};
use crate::source::{CommitQuery, RepositoryData, RepositorySource, SourceError};

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Initial,
    BranchSelection,
    OperationCompleted,
    WorkTreeChanged,
    Manual,
    /// Follow-up for requests that arrived during the previous run.
    Coalesced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Recomputing,
}

/// Permission to finish one refresh run. Not cloneable: each run completes
/// or fails exactly once.
#[derive(Debug)]
#[must_use = "a refresh ticket must be completed or failed"]
pub struct RefreshTicket {
    generation: u64,
    trigger: RefreshTrigger,
}

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger
    }
}

/// Published after every successful refresh.
#[derive(Debug, Clone)]
pub struct RowsReplaced {
    pub generation: u64,
    pub snapshot: Arc<Snapshot>,
    /// Row of the re-resolved selection, if it survived.
    pub selection: Option<usize>,
}

#[derive(Debug)]
pub struct RefreshCoordinator {
    state: RefreshState,
    pending: bool,
    generation: u64,
    snapshot: Arc<Snapshot>,
    selection: SelectionKey,
    subscribers: Vec<Sender<RowsReplaced>>,
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            state: RefreshState::Idle,
            pending: false,
            generation: 0,
            snapshot: Arc::new(Snapshot::default()),
            selection: SelectionKey::None,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Number of completed refreshes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    pub fn rows(&self) -> &crate::model::RowSet {
        self.snapshot.rows()
    }

    pub fn annotation(&self, row: usize) -> Option<&LayoutAnnotation> {
        self.snapshot.annotation(row)
    }

    pub fn subscribe(&mut self) -> Receiver<RowsReplaced> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Select `row` of the current snapshot, or clear the selection.
    /// Returns the row actually selected.
    pub fn select(&mut self, row: Option<usize>) -> Option<usize> {
        self.selection = row.map_or(SelectionKey::None, |row| self.snapshot.key_of(row));
        self.selected_index()
    }

    pub fn selection(&self) -> &SelectionKey {
        &self.selection
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.snapshot.resolve(&self.selection)
    }

    pub fn selected_row(&self) -> Option<Row<'_>> {
        self.selected_index().and_then(|row| self.snapshot.row(row))
    }

    /// Select the row showing `id`.
    pub fn jump_to(&mut self, id: &CommitId) -> Result<usize, NavigationError> {
        let row = self.snapshot.jump_to(id)?;
        self.selection = SelectionKey::Commit(id.clone());
        Ok(row)
    }

    /// Select the row showing the target of branch or tag `name`.
    pub fn jump_to_label(&mut self, name: &str) -> Result<usize, NavigationError> {
        let row = self.snapshot.jump_to_label(name)?;
        self.selection = self.snapshot.key_of(row);
        Ok(row)
    }

    /// Ask for a refresh. Returns a ticket when the caller should load data
    /// now; `None` when a run is already in flight, in which case exactly
    /// one follow-up is scheduled.
    pub fn request(&mut self, trigger: RefreshTrigger) -> Option<RefreshTicket> {
        match self.state {
            RefreshState::Recomputing => {
                log::debug!("refresh requested ({trigger:?}) while recomputing, coalescing");
                self.pending = true;
                None
            }
            RefreshState::Idle => Some(self.begin(trigger)),
        }
    }

    /// Swap in the data loaded for `ticket`. Returns the follow-up ticket
    /// when requests arrived meanwhile.
    pub fn complete(
        &mut self,
        ticket: RefreshTicket,
        data: RepositoryData,
    ) -> Option<RefreshTicket> {
        if !self.owns(&ticket) {
            return None;
        }
        let RefreshTicket {
            generation,
            trigger,
        } = ticket;
        let snapshot = Arc::new(Snapshot::build(data));
        let selection = snapshot.resolve(&self.selection);
        if selection.is_none() && self.selection != SelectionKey::None {
            log::debug!("selection {:?} left the window, clearing", self.selection);
            self.selection = SelectionKey::None;
        }

        self.generation = generation;
        self.snapshot = Arc::clone(&snapshot);
        log::info!(
            "refresh #{generation} ({trigger:?}): {} rows",
            snapshot.len()
        );

        let event = RowsReplaced {
            generation: self.generation,
            snapshot,
            selection,
        };
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());

        self.finish()
    }

    /// Abandon the run for `ticket`, keeping the previous snapshot.
    pub fn fail(&mut self, ticket: RefreshTicket, error: &SourceError) -> Option<RefreshTicket> {
        if !self.owns(&ticket) {
            return None;
        }
        let RefreshTicket { trigger, .. } = ticket;
        log::warn!("refresh ({trigger:?}) failed: {error}");
        self.finish()
    }

    /// Run a refresh against `source` on the calling thread, including any
    /// follow-up runs. Returns the error of the last run, if it failed.
    pub fn refresh_from(
        &mut self,
        source: &dyn RepositorySource,
        query: &CommitQuery,
        trigger: RefreshTrigger,
    ) -> Result<(), SourceError> {
        let mut ticket = self.request(trigger);
        let mut outcome = Ok(());
        while let Some(current) = ticket.take() {
            match RepositoryData::load(source, query) {
                Ok(data) => {
                    outcome = Ok(());
                    ticket = self.complete(current, data);
                }
                Err(err) => {
                    ticket = self.fail(current, &err);
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    fn begin(&mut self, trigger: RefreshTrigger) -> RefreshTicket {
        self.state = RefreshState::Recomputing;
        self.pending = false;
        RefreshTicket {
            generation: self.generation + 1,
            trigger,
        }
    }

    fn owns(&self, ticket: &RefreshTicket) -> bool {
        let owned =
            self.state == RefreshState::Recomputing && ticket.generation == self.generation + 1;
        if !owned {
            log::warn!(
                "ignoring stale refresh ticket #{} (at #{})",
                ticket.generation,
                self.generation
            );
        }
        owned
    }

    fn finish(&mut self) -> Option<RefreshTicket> {
        self.state = RefreshState::Idle;
        if self.pending {
            Some(self.begin(RefreshTrigger::Coalesced))
        } else {
            None
        }
    }
}
