//! Mutating repository operations.
//!
//! Every operation runs to completion on the calling thread; the front end
//! puts them on a job thread. Conflicting merges, rebases and cherry-picks
//! stop with [`RepoError::Conflicts`] and leave the repository conflicted so
//! the user can resolve and commit.

use std::cell::Cell;
use std::fmt;
use std::path::Path;

use git2::{
    AnnotatedCommit, Branch, BranchType, CherrypickOptions, Commit, ErrorCode, Index, Oid,
    RepositoryState, ResetType, build::CheckoutBuilder,
};
use gitlane_core::jobs::JobContext;
use gitlane_protocol::CommitId;

use crate::error::RepoError;
use crate::remote;
use crate::repository::GitRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    Soft,
    Mixed,
    Hard,
}

impl From<ResetMode> for ResetType {
    fn from(mode: ResetMode) -> Self {
        match mode {
            ResetMode::Soft => ResetType::Soft,
            ResetMode::Mixed => ResetType::Mixed,
            ResetMode::Hard => ResetType::Hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Check out a local branch, a remote branch (creating a tracking
    /// branch) or any revision (detached).
    Checkout {
        target: String,
    },
    CreateBranch {
        name: String,
        target: CommitId,
        checkout: bool,
    },
    /// Unless `force` is set, the branch must be merged into HEAD.
    DeleteBranch {
        name: String,
        force: bool,
    },
    RenameBranch {
        from: String,
        to: String,
    },
    /// Annotated when a message is given, lightweight otherwise.
    CreateTag {
        name: String,
        target: CommitId,
        message: Option<String>,
    },
    DeleteTag {
        name: String,
    },
    Stage {
        paths: Vec<String>,
    },
    Unstage {
        paths: Vec<String>,
    },
    /// Discard staged and unstaged changes to `paths`, back to HEAD.
    Restore {
        paths: Vec<String>,
    },
    Commit {
        message: String,
    },
    /// Merge a branch, tag or commit into the current branch.
    Merge {
        branch: String,
    },
    /// Replay the current branch onto a branch, tag or commit.
    Rebase {
        onto: String,
    },
    Reset {
        target: CommitId,
        mode: ResetMode,
    },
    CherryPick {
        commit: CommitId,
    },
    Fetch {
        remote: String,
    },
    /// Fetch, then merge the current branch's upstream.
    Pull {
        remote: String,
    },
    /// Push `branch`, or the current branch, to the same name on `remote`.
    Push {
        remote: String,
        branch: Option<String>,
    },
    /// Delete `branch` on `remote` along with its remote-tracking ref.
    DeleteRemoteBranch {
        remote: String,
        branch: String,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkout { target } => write!(f, "checkout {target}"),
            Self::CreateBranch { name, target, .. } => {
                write!(f, "branch {name} at {}", target.short())
            }
            Self::DeleteBranch { name, .. } => write!(f, "delete branch {name}"),
            Self::RenameBranch { from, to } => write!(f, "rename {from} to {to}"),
            Self::CreateTag { name, target, .. } => write!(f, "tag {name} at {}", target.short()),
            Self::DeleteTag { name } => write!(f, "delete tag {name}"),
            Self::Stage { paths } => write!(f, "stage {} paths", paths.len()),
            Self::Unstage { paths } => write!(f, "unstage {} paths", paths.len()),
            Self::Restore { paths } => write!(f, "restore {} paths", paths.len()),
            Self::Commit { .. } => f.write_str("commit"),
            Self::Merge { branch } => write!(f, "merge {branch}"),
            Self::Rebase { onto } => write!(f, "rebase onto {onto}"),
            Self::Reset { target, mode } => write!(f, "reset {mode:?} to {}", target.short()),
            Self::CherryPick { commit } => write!(f, "cherry-pick {}", commit.short()),
            Self::Fetch { remote } => write!(f, "fetch {remote}"),
            Self::Pull { remote } => write!(f, "pull {remote}"),
            Self::Push { remote, branch } => match branch {
                Some(branch) => write!(f, "push {branch} to {remote}"),
                None => write!(f, "push to {remote}"),
            },
            Self::DeleteRemoteBranch { remote, branch } => {
                write!(f, "delete {branch} on {remote}")
            }
        }
    }
}

impl GitRepository {
    pub fn run(&self, op: &Operation, ctx: &JobContext) -> Result<(), RepoError> {
        if ctx.is_cancelled() {
            return Err(RepoError::Cancelled);
        }
        log::info!("running {op}");
        match op {
            Operation::Checkout { target } => self.checkout(target),
            Operation::CreateBranch {
                name,
                target,
                checkout,
            } => {
                let commit = self.find_commit(target)?;
                self.repo.branch(name, &commit, false)?;
                if *checkout {
                    self.checkout(name)?;
                }
                Ok(())
            }
            Operation::DeleteBranch { name, force } => self.delete_branch(name, *force),
            Operation::RenameBranch { from, to } => {
                let mut branch = self.local_branch(from)?;
                branch.rename(to, false)?;
                log::info!("renamed {from} to {to}");
                Ok(())
            }
            Operation::CreateTag {
                name,
                target,
                message,
            } => {
                let commit = self.find_commit(target)?;
                match message {
                    Some(message) => {
                        let tagger = self.repo.signature()?;
                        self.repo
                            .tag(name, commit.as_object(), &tagger, message, false)?;
                    }
                    None => {
                        self.repo.tag_lightweight(name, commit.as_object(), false)?;
                    }
                }
                Ok(())
            }
            Operation::DeleteTag { name } => {
                self.repo.tag_delete(name).map_err(|err| match err.code() {
                    ErrorCode::NotFound => RepoError::UnknownRevision(name.clone()),
                    _ => err.into(),
                })
            }
            Operation::Stage { paths } => self.stage(paths),
            Operation::Unstage { paths } => self.unstage(paths),
            Operation::Restore { paths } => self.restore(paths),
            Operation::Commit { message } => self.commit(message),
            Operation::Merge { branch } => {
                let annotated = self.annotated(branch)?;
                self.merge_annotated(&annotated, branch)
            }
            Operation::Rebase { onto } => self.rebase(onto, ctx),
            Operation::Reset { target, mode } => {
                let commit = self.find_commit(target)?;
                self.repo
                    .reset(commit.as_object(), ResetType::from(*mode), None)?;
                Ok(())
            }
            Operation::CherryPick { commit } => self.cherry_pick(commit),
            Operation::Fetch { remote } => self.fetch(remote, ctx),
            Operation::Pull { remote } => self.pull(remote, ctx),
            Operation::Push { remote, branch } => self.push(remote, branch.as_deref(), ctx),
            Operation::DeleteRemoteBranch { remote, branch } => {
                self.delete_remote_branch(remote, branch, ctx)
            }
        }
    }

    fn local_branch(&self, name: &str) -> Result<Branch<'_>, RepoError> {
        self.repo
            .find_branch(name, BranchType::Local)
            .map_err(|_| RepoError::UnknownRevision(name.to_owned()))
    }

    /// A branch or tag by short name, or any revision.
    fn annotated(&self, name: &str) -> Result<AnnotatedCommit<'_>, RepoError> {
        if let Ok(reference) = self.repo.resolve_reference_from_short_name(name) {
            return Ok(self.repo.reference_to_annotated_commit(&reference)?);
        }
        let commit = self
            .repo
            .revparse_single(name)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|_| RepoError::UnknownRevision(name.to_owned()))?;
        Ok(self.repo.find_annotated_commit(commit.id())?)
    }

    fn find_commit(&self, id: &CommitId) -> Result<Commit<'_>, RepoError> {
        Oid::from_str(id.as_str())
            .and_then(|oid| self.repo.find_commit(oid))
            .map_err(|_| RepoError::UnknownRevision(id.to_string()))
    }

    fn checkout_commit(&self, commit: &Commit<'_>) -> Result<(), RepoError> {
        let mut builder = CheckoutBuilder::new();
        builder.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut builder))?;
        Ok(())
    }

    fn checkout(&self, target: &str) -> Result<(), RepoError> {
        if let Ok(branch) = self.repo.find_branch(target, BranchType::Local) {
            let commit = branch.get().peel_to_commit()?;
            self.checkout_commit(&commit)?;
            self.repo.set_head(&format!("refs/heads/{target}"))?;
            return Ok(());
        }

        if let Ok(remote_branch) = self.repo.find_branch(target, BranchType::Remote)
            && let Some((_, local_name)) = target.split_once('/')
            && self.repo.find_branch(local_name, BranchType::Local).is_err()
        {
            let commit = remote_branch.get().peel_to_commit()?;
            let mut local = self.repo.branch(local_name, &commit, false)?;
            local.set_upstream(Some(target))?;
            self.checkout_commit(&commit)?;
            self.repo.set_head(&format!("refs/heads/{local_name}"))?;
            log::info!("created {local_name} tracking {target}");
            return Ok(());
        }

        let commit = self
            .repo
            .revparse_single(target)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|_| RepoError::UnknownRevision(target.to_owned()))?;
        self.checkout_commit(&commit)?;
        self.repo.set_head_detached(commit.id())?;
        Ok(())
    }

    fn delete_branch(&self, name: &str, force: bool) -> Result<(), RepoError> {
        let mut branch = self.local_branch(name)?;
        if branch.is_head() {
            return Err(RepoError::InvalidState(format!(
                "cannot delete the checked-out branch {name}"
            )));
        }
        if !force {
            let tip = branch.get().peel_to_commit()?.id();
            let merged = match self.head_commit()? {
                Some(head) => head.id() == tip || self.repo.graph_descendant_of(head.id(), tip)?,
                None => false,
            };
            if !merged {
                return Err(RepoError::InvalidState(format!(
                    "branch {name} is not merged into HEAD"
                )));
            }
        }
        branch.delete()?;
        log::info!("deleted branch {name}");
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), RepoError> {
        let signature = self.repo.signature()?;
        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            return Err(RepoError::Conflicts(conflict_paths(&index)?));
        }
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let mut parents = Vec::new();
        if let Some(head) = self.head_commit()? {
            parents.push(head);
        }
        let merging = self.repo.state() == RepositoryState::Merge;
        if merging {
            let mut merge_heads = Vec::new();
            git2::Repository::open(self.repo.path())?.mergehead_foreach(|oid| {
                merge_heads.push(*oid);
                true
            })?;
            for oid in merge_heads {
                parents.push(self.repo.find_commit(oid)?);
            }
        } else if parents.first().is_some_and(|head| head.tree_id() == tree.id()) {
            return Err(RepoError::InvalidState("nothing to commit".into()));
        }

        let parents: Vec<&Commit<'_>> = parents.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        self.repo.cleanup_state()?;
        log::info!("committed {oid}");
        Ok(())
    }

    fn merge_annotated(&self, theirs: &AnnotatedCommit<'_>, name: &str) -> Result<(), RepoError> {
        let (analysis, _) = self.repo.merge_analysis(&[theirs])?;
        if analysis.is_up_to_date() {
            log::info!("already up to date with {name}");
            return Ok(());
        }
        if analysis.is_unborn() {
            return Err(RepoError::InvalidState(format!(
                "cannot merge {name} into an unborn branch"
            )));
        }
        if analysis.is_fast_forward() {
            let target = self.repo.find_commit(theirs.id())?;
            self.checkout_commit(&target)?;
            self.repo
                .head()?
                .set_target(target.id(), &format!("merge {name}: fast-forward"))?;
            log::info!("fast-forwarded to {name}");
            return Ok(());
        }

        self.repo.merge(&[theirs], None, None)?;
        let index = self.repo.index()?;
        if index.has_conflicts() {
            return Err(RepoError::Conflicts(conflict_paths(&index)?));
        }
        self.commit(&format!("Merge {name}"))
    }

    fn rebase(&self, onto: &str, ctx: &JobContext) -> Result<(), RepoError> {
        let upstream = self.annotated(onto)?;
        let signature = self.repo.signature()?;
        let mut rebase = self.repo.rebase(None, Some(&upstream), None, None)?;

        while let Some(step) = rebase.next() {
            step?;
            if ctx.is_cancelled() {
                rebase.abort()?;
                return Err(RepoError::Cancelled);
            }
            let index = self.repo.index()?;
            if index.has_conflicts() {
                return Err(RepoError::Conflicts(conflict_paths(&index)?));
            }
            match rebase.commit(None, &signature, None) {
                Ok(_) => {}
                Err(err) if err.code() == ErrorCode::Applied => {
                    log::debug!("patch already applied upstream, skipping");
                }
                Err(err) => return Err(err.into()),
            }
        }
        rebase.finish(Some(&signature))?;
        Ok(())
    }

    fn cherry_pick(&self, id: &CommitId) -> Result<(), RepoError> {
        let commit = self.find_commit(id)?;
        let head = self.head_commit()?.ok_or_else(|| {
            RepoError::InvalidState("cannot cherry-pick onto an unborn branch".into())
        })?;
        let mut options = CherrypickOptions::new();
        if commit.parent_count() > 1 {
            options.mainline(1);
        }
        self.repo.cherrypick(&commit, Some(&mut options))?;

        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            return Err(RepoError::Conflicts(conflict_paths(&index)?));
        }
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let committer = self.repo.signature()?;
        self.repo.commit(
            Some("HEAD"),
            &commit.author(),
            &committer,
            commit.message().unwrap_or_default(),
            &tree,
            &[&head],
        )?;
        self.repo.cleanup_state()?;
        Ok(())
    }

    fn stage(&self, paths: &[String]) -> Result<(), RepoError> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| RepoError::InvalidState("bare repository has no work tree".into()))?;
        let mut index = self.repo.index()?;
        for path in paths {
            let path = Path::new(path);
            if workdir.join(path).exists() {
                index.add_path(path)?;
            } else {
                index.remove_path(path)?;
            }
        }
        index.write()?;
        Ok(())
    }

    fn unstage(&self, paths: &[String]) -> Result<(), RepoError> {
        match self.head_commit()? {
            Some(head) => {
                self.repo
                    .reset_default(Some(head.as_object()), paths.iter().map(String::as_str))?;
            }
            None => {
                let mut index = self.repo.index()?;
                for path in paths {
                    index.remove_path(Path::new(path))?;
                }
                index.write()?;
            }
        }
        Ok(())
    }

    fn restore(&self, paths: &[String]) -> Result<(), RepoError> {
        let head = self.head_commit()?.ok_or_else(|| {
            RepoError::InvalidState("nothing to restore on an unborn branch".into())
        })?;
        let mut builder = CheckoutBuilder::new();
        builder.force();
        for path in paths {
            builder.path(path.as_str());
        }
        self.repo
            .checkout_tree(head.as_object(), Some(&mut builder))?;
        log::info!("restored {} paths", paths.len());
        Ok(())
    }

    fn fetch(&self, name: &str, ctx: &JobContext) -> Result<(), RepoError> {
        let config = self.repo.config().ok();
        let mut git_remote = self.repo.find_remote(name)?;
        let mut options = remote::fetch_options(ctx, config.as_ref());
        git_remote
            .fetch(&[] as &[&str], Some(&mut options), None)
            .map_err(|err| remote::interrupted(err, ctx))?;
        log::info!(
            "fetched {} objects from {name}",
            git_remote.stats().received_objects()
        );
        Ok(())
    }

    fn pull(&self, name: &str, ctx: &JobContext) -> Result<(), RepoError> {
        self.fetch(name, ctx)?;
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(RepoError::InvalidState("HEAD is detached".into()));
        }
        let branch_name = head.shorthand().unwrap_or("HEAD").to_owned();
        let upstream = git2::Branch::wrap(head)
            .upstream()
            .map_err(|_| RepoError::NoUpstream(branch_name))?;
        let upstream_name = upstream.name()?.unwrap_or("upstream").to_owned();
        let theirs = self.repo.reference_to_annotated_commit(upstream.get())?;
        self.merge_annotated(&theirs, &upstream_name)
    }

    fn push(&self, name: &str, branch: Option<&str>, ctx: &JobContext) -> Result<(), RepoError> {
        let branch = match branch {
            Some(branch) => branch.to_owned(),
            None => self
                .current_branch()
                .ok_or_else(|| RepoError::InvalidState("HEAD is detached".into()))?,
        };
        self.push_refspec(name, &format!("refs/heads/{branch}:refs/heads/{branch}"), ctx)?;
        log::info!("pushed {branch} to {name}");
        Ok(())
    }

    fn delete_remote_branch(
        &self,
        name: &str,
        branch: &str,
        ctx: &JobContext,
    ) -> Result<(), RepoError> {
        self.push_refspec(name, &format!(":refs/heads/{branch}"), ctx)?;
        if let Ok(mut tracking) = self
            .repo
            .find_reference(&format!("refs/remotes/{name}/{branch}"))
        {
            tracking.delete()?;
        }
        log::info!("deleted {branch} on {name}");
        Ok(())
    }

    fn push_refspec(&self, name: &str, refspec: &str, ctx: &JobContext) -> Result<(), RepoError> {
        let config = self.repo.config().ok();
        let rejected = Cell::new(None);
        let mut git_remote = self.repo.find_remote(name)?;
        let mut options = remote::push_options(ctx, config.as_ref(), &rejected);
        git_remote
            .push(&[refspec], Some(&mut options))
            .map_err(|err| remote::interrupted(err, ctx))?;
        match rejected.take() {
            Some(reason) => Err(RepoError::InvalidState(format!("push rejected: {reason}"))),
            None => Ok(()),
        }
    }
}

fn conflict_paths(index: &Index) -> Result<Vec<String>, RepoError> {
    let mut paths = Vec::new();
    for conflict in index.conflicts()? {
        let conflict = conflict?;
        if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
            paths.push(String::from_utf8_lossy(&entry.path).into_owned());
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}
