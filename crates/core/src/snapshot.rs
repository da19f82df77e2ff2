use gitlane_protocol::{CommitId, Lane, LayoutAnnotation, RefLabel};

use crate::lanes;
use crate::model::{LabelIndex, Row, RowSet};
use crate::navigation::{self, NavigationError};
use crate::source::RepositoryData;

/// Identity of a selected row that survives a refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SelectionKey {
    #[default]
    None,
    WorkTree,
    Commit(CommitId),
}

/// Rows, index, annotations and labels of one refresh, replaced as a whole.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    rows: RowSet,
    annotations: Vec<LayoutAnnotation>,
    labels: LabelIndex,
    head: Option<CommitId>,
}

impl Snapshot {
    pub fn build(data: RepositoryData) -> Self {
        let rows = RowSet::build(data.commits, data.status);
        let annotations = lanes::route(&rows, data.head.as_ref());
        Self {
            rows,
            annotations,
            labels: LabelIndex::new(data.refs),
            head: data.head,
        }
    }

    pub fn rows(&self) -> &RowSet {
        &self.rows
    }

    pub fn row(&self, row: usize) -> Option<Row<'_>> {
        self.rows.get(row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn annotations(&self) -> &[LayoutAnnotation] {
        &self.annotations
    }

    pub fn annotation(&self, row: usize) -> Option<&LayoutAnnotation> {
        self.annotations.get(row)
    }

    pub fn head(&self) -> Option<&CommitId> {
        self.head.as_ref()
    }

    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    pub fn labels_for(&self, id: &CommitId) -> &[RefLabel] {
        self.labels.labels_for(id)
    }

    pub fn max_lane(&self) -> Option<Lane> {
        lanes::max_lane(&self.annotations)
    }

    pub fn jump_to(&self, id: &CommitId) -> Result<usize, NavigationError> {
        navigation::jump_to(&self.rows, id)
    }

    pub fn jump_to_label(&self, name: &str) -> Result<usize, NavigationError> {
        navigation::jump_to_label(&self.rows, &self.labels, name)
    }

    pub fn key_of(&self, row: usize) -> SelectionKey {
        match self.rows.get(row) {
            Some(Row::WorkTree(_)) => SelectionKey::WorkTree,
            Some(Row::Commit(commit)) => SelectionKey::Commit(commit.id.clone()),
            None => SelectionKey::None,
        }
    }

    /// Row currently holding `key`, if it is still in this snapshot.
    pub fn resolve(&self, key: &SelectionKey) -> Option<usize> {
        match key {
            SelectionKey::None => None,
            SelectionKey::WorkTree => self.rows.has_work_tree().then_some(0),
            SelectionKey::Commit(id) => self.rows.row_index_of(id),
        }
    }
}
