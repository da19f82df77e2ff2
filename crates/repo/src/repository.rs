use std::path::Path;

use git2::{Commit, ErrorCode, ReferenceType, Repository, Sort, Status, StatusOptions};
use gitlane_core::jobs::JobContext;
use gitlane_core::topology::{LaneWalker, RawCommit};
use gitlane_core::{RepositorySource, SourceError};
use gitlane_protocol::{CommitId, CommitRecord, RefKind, RefLabel, WorkTreeStatus};

use crate::error::RepoError;
use crate::remote;

const INDEX_CHANGES: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

const WORK_TREE_CHANGES: Status = Status::WT_NEW
    .union(Status::WT_MODIFIED)
    .union(Status::WT_DELETED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE);

/// An open repository plus the walker that lays out its history.
pub struct GitRepository {
    pub(crate) repo: Repository,
    walker: LaneWalker,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.repo.path())
            .field("walker", &self.walker)
            .finish()
    }
}

impl GitRepository {
    /// Open the repository containing `path`, searching parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let repo = Repository::discover(path.as_ref())?;
        log::debug!("opened repository at {}", repo.path().display());
        Ok(Self::from_repository(repo))
    }

    /// Create an empty repository with a work tree at `path`.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let repo = Repository::init(path)?;
        log::info!("created repository at {}", path.display());
        Ok(Self::from_repository(repo))
    }

    /// Clone `url` into `path`, reporting transfer progress to `ctx`.
    pub fn clone_into(
        url: &str,
        path: impl AsRef<Path>,
        ctx: &JobContext,
    ) -> Result<Self, RepoError> {
        let path = path.as_ref();
        log::info!("cloning {url} into {}", path.display());
        let config = git2::Config::open_default().ok();
        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(remote::fetch_options(ctx, config.as_ref()));
        let repo = builder
            .clone(url, path)
            .map_err(|err| remote::interrupted(err, ctx))?;
        Ok(Self::from_repository(repo))
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self {
            repo,
            walker: LaneWalker::new(),
        }
    }

    pub fn with_walker(mut self, walker: LaneWalker) -> Self {
        self.walker = walker;
        self
    }

    /// Working directory, or the git directory of a bare repository.
    pub fn path(&self) -> &Path {
        self.repo.workdir().unwrap_or_else(|| self.repo.path())
    }

    pub fn inner(&self) -> &Repository {
        &self.repo
    }

    /// Short name of the checked-out branch; `None` when detached.
    pub fn current_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if !head.is_branch() {
            return None;
        }
        head.shorthand().map(str::to_owned)
    }

    pub(crate) fn read_commits(
        &self,
        tips: &[String],
        limit: usize,
    ) -> Result<Vec<CommitRecord>, RepoError> {
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        if tips.is_empty() {
            walk.push_glob("refs/heads")?;
            if self.head_commit()?.is_some() {
                walk.push_head()?;
            }
        } else {
            for tip in tips {
                let commit = self
                    .repo
                    .revparse_single(tip)
                    .and_then(|obj| obj.peel_to_commit())
                    .map_err(|_| RepoError::UnknownRevision(tip.clone()))?;
                walk.push(commit.id())?;
            }
        }

        let mut raw = Vec::new();
        for oid in walk.take(limit) {
            let commit = self.repo.find_commit(oid?)?;
            raw.push(RawCommit {
                id: CommitId::from(commit.id().to_string()),
                parent_ids: commit
                    .parent_ids()
                    .map(|id| CommitId::from(id.to_string()))
                    .collect(),
                summary: commit.summary().unwrap_or_default().into(),
                author: commit.author().name().unwrap_or_default().into(),
                time: commit.time().seconds(),
            });
        }
        log::debug!("walked {} commits from {} tips", raw.len(), tips.len());
        Ok(self.walker.assign(raw))
    }

    /// The commit HEAD resolves to; `None` on an unborn branch.
    pub(crate) fn head_commit(&self) -> Result<Option<Commit<'_>>, RepoError> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(err) if matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) fn read_status(&self) -> Result<WorkTreeStatus, RepoError> {
        let mut status = WorkTreeStatus::default();
        if self.repo.is_bare() {
            return Ok(status);
        }
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        for entry in self.repo.statuses(Some(&mut opts))?.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            let flags = entry.status();
            if flags.contains(Status::CONFLICTED) {
                status.conflicting.insert(path.to_owned());
                continue;
            }
            if flags.intersects(INDEX_CHANGES) {
                status.staged.insert(path.to_owned());
            }
            if flags.intersects(WORK_TREE_CHANGES) {
                status.modified.insert(path.to_owned());
            }
        }
        Ok(status)
    }

    pub(crate) fn read_refs(&self) -> Result<Vec<RefLabel>, RepoError> {
        let current = self.current_branch();
        let mut labels = Vec::new();
        for reference in self.repo.references()? {
            let reference = reference?;
            if reference.kind() == Some(ReferenceType::Symbolic) {
                continue;
            }
            let kind = if reference.is_branch() {
                RefKind::LocalBranch
            } else if reference.is_remote() {
                RefKind::RemoteBranch
            } else if reference.is_tag() {
                RefKind::Tag
            } else {
                continue;
            };
            let Some(name) = reference.shorthand() else {
                continue;
            };
            // Tags on trees or blobs have no row to decorate.
            let Ok(commit) = reference.peel_to_commit() else {
                log::debug!("skipping {name}: does not point at a commit");
                continue;
            };
            labels.push(RefLabel {
                name: name.into(),
                kind,
                target: CommitId::from(commit.id().to_string()),
                is_current: kind == RefKind::LocalBranch && current.as_deref() == Some(name),
            });
        }
        Ok(labels)
    }
}

impl RepositorySource for GitRepository {
    fn list_commits(
        &self,
        tips: &[String],
        limit: usize,
    ) -> Result<Vec<CommitRecord>, SourceError> {
        Ok(self.read_commits(tips, limit)?)
    }

    fn current_head(&self) -> Result<Option<CommitId>, SourceError> {
        let head = self.head_commit()?;
        Ok(head.map(|commit| CommitId::from(commit.id().to_string())))
    }

    fn work_tree_status(&self) -> Result<WorkTreeStatus, SourceError> {
        Ok(self.read_status()?)
    }

    fn refs(&self) -> Result<Vec<RefLabel>, SourceError> {
        Ok(self.read_refs()?)
    }
}
