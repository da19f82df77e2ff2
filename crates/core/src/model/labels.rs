use std::collections::HashMap;

use gitlane_protocol::{CommitId, RefKind, RefLabel};

/// Branch and tag decorations grouped by the commit they point at.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    by_commit: HashMap<CommitId, Vec<RefLabel>>,
}

impl LabelIndex {
    pub fn new(refs: impl IntoIterator<Item = RefLabel>) -> Self {
        let mut by_commit: HashMap<CommitId, Vec<RefLabel>> = HashMap::new();
        for label in refs {
            by_commit.entry(label.target.clone()).or_default().push(label);
        }
        // Current branch first, then local branches, remotes, tags.
        for labels in by_commit.values_mut() {
            labels.sort_by(|a, b| {
                b.is_current
                    .cmp(&a.is_current)
                    .then(a.kind.cmp(&b.kind))
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
        Self { by_commit }
    }

    /// Labels decorating `id`, in display order.
    pub fn labels_for(&self, id: &CommitId) -> &[RefLabel] {
        self.by_commit.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_commit.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefLabel> {
        self.by_commit.values().flatten()
    }

    /// Find a label by its short name. Local branches shadow tags and remote
    /// branches of the same name.
    pub fn find(&self, name: &str) -> Option<&RefLabel> {
        self.iter()
            .filter(|label| label.name == name)
            .min_by_key(|label| label.kind)
    }

    pub fn current_branch(&self) -> Option<&RefLabel> {
        self.iter().find(|label| label.is_current)
    }

    pub fn has_kind(&self, id: &CommitId, kind: RefKind) -> bool {
        self.labels_for(id).iter().any(|label| label.kind == kind)
    }
}
