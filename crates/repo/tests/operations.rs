//! Integration test: run the backend against real repositories in
//! temporary directories.

use std::fs;
use std::path::Path;

use git2::{Commit, Oid, Repository, RepositoryInitOptions, Signature, Time};
use gitlane_core::jobs::JobContext;
use gitlane_core::{CommitQuery, RefreshCoordinator, RefreshTrigger, RepositorySource, SourceError};
use gitlane_protocol::{CommitId, RefKind, RowMarker};
use gitlane_repo::{GitRepository, Operation, RepoError, ResetMode};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn init(dir: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(dir, &opts).expect("init");
    configure(&repo);
    repo
}

fn configure(repo: &Repository) {
    let mut config = repo.config().expect("config");
    config.set_str("user.name", "Lane Tester").expect("user.name");
    config
        .set_str("user.email", "lanes@example.com")
        .expect("user.email");
}

/// Write `path`, stage it and commit on HEAD.
fn commit_file(repo: &Repository, path: &str, contents: &str, message: &str) -> Oid {
    let workdir = repo.workdir().expect("work tree");
    fs::write(workdir.join(path), contents).expect("write file");
    let mut index = repo.index().expect("index");
    index.add_path(Path::new(path)).expect("add");
    index.write().expect("write index");
    let tree = repo
        .find_tree(index.write_tree().expect("write tree"))
        .expect("tree");
    let signature = repo.signature().expect("signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .expect("commit")
}

/// Commit an empty tree at a fixed time without moving any ref.
fn commit_at(repo: &Repository, parents: &[Oid], time: i64, message: &str) -> Oid {
    let signature =
        Signature::new("Lane Tester", "lanes@example.com", &Time::new(time, 0)).expect("sig");
    let tree_id = repo
        .treebuilder(None)
        .and_then(|builder| builder.write())
        .expect("empty tree");
    let tree = repo.find_tree(tree_id).expect("tree");
    let parents: Vec<Commit<'_>> = parents
        .iter()
        .map(|id| repo.find_commit(*id).expect("parent"))
        .collect();
    let parents: Vec<&Commit<'_>> = parents.iter().collect();
    repo.commit(None, &signature, &signature, message, &tree, &parents)
        .expect("commit")
}

fn head_id(repo: &Repository) -> Oid {
    repo.head()
        .and_then(|head| head.peel_to_commit())
        .map(|commit| commit.id())
        .expect("head")
}

fn id(oid: Oid) -> CommitId {
    CommitId::from(oid.to_string())
}

fn read(repo: &Repository, path: &str) -> String {
    fs::read_to_string(repo.workdir().expect("work tree").join(path)).expect("read file")
}

#[test]
fn history_comes_back_with_lanes() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let a = commit_at(&repo, &[], 1_700_000_001, "A");
    let b = commit_at(&repo, &[a], 1_700_000_002, "B");
    let f1 = commit_at(&repo, &[b], 1_700_000_003, "F1");
    let c = commit_at(&repo, &[b], 1_700_000_004, "C");
    let m = commit_at(&repo, &[c, f1], 1_700_000_005, "M");
    repo.reference("refs/heads/main", m, true, "test").expect("main");
    repo.reference("refs/heads/feature", f1, true, "test")
        .expect("feature");

    let git = GitRepository::open(dir.path()).expect("open");
    let commits = git.list_commits(&[], 100).expect("list");
    assert_eq!(
        commits.iter().map(|c| c.summary.as_str()).collect::<Vec<_>>(),
        ["M", "C", "F1", "B", "A"]
    );
    assert_eq!(
        commits.iter().map(|c| c.lane).collect::<Vec<_>>(),
        [0, 0, 1, 0, 0]
    );
    assert!(commits[0].is_merge());
    assert_eq!(commits[3].child_ids, [id(c), id(f1)]);
    assert_eq!(commits[0].author, "Lane Tester");

    let limited = git.list_commits(&["feature".into()], 2).expect("list");
    assert_eq!(
        limited.iter().map(|c| c.summary.as_str()).collect::<Vec<_>>(),
        ["F1", "B"]
    );
    assert!(matches!(
        git.list_commits(&["no-such-branch".into()], 10),
        Err(SourceError::UnknownRevision(name)) if name == "no-such-branch"
    ));
}

#[test]
fn unborn_repository_is_empty() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    let git = GitRepository::open(dir.path()).expect("open");
    assert!(git.list_commits(&[], 10).expect("list").is_empty());
    assert_eq!(git.current_head().expect("head"), None);
    assert!(!git.work_tree_status().expect("status").is_dirty());
}

#[test]
fn init_creates_a_repository_to_commit_into() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("fresh");
    let git = GitRepository::init(&path).expect("init");
    assert!(path.join(".git").is_dir());
    assert!(git.list_commits(&[], 10).expect("list").is_empty());

    configure(git.inner());
    let first = commit_file(git.inner(), "a.txt", "one\n", "first");
    let reopened = GitRepository::open(&path).expect("open");
    assert_eq!(reopened.current_head().expect("head"), Some(id(first)));
    assert!(reopened.current_branch().is_some());
}

#[test]
fn status_groups_paths() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    commit_file(&repo, "a.txt", "one\n", "add a");
    commit_file(&repo, "b.txt", "one\n", "add b");

    fs::write(dir.path().join("a.txt"), "two\n").expect("write");
    fs::write(dir.path().join("c.txt"), "new\n").expect("write");
    fs::write(dir.path().join("untracked.txt"), "?\n").expect("write");
    fs::write(dir.path().join("b.txt"), "two\n").expect("write");
    let git = GitRepository::open(dir.path()).expect("open");
    git.run(
        &Operation::Stage {
            paths: vec!["c.txt".into(), "b.txt".into()],
        },
        &JobContext::detached(),
    )
    .expect("stage");
    fs::write(dir.path().join("b.txt"), "three\n").expect("write");

    let status = git.work_tree_status().expect("status");
    assert_eq!(
        status.staged.iter().map(String::as_str).collect::<Vec<_>>(),
        ["b.txt", "c.txt"]
    );
    assert_eq!(
        status.modified.iter().map(String::as_str).collect::<Vec<_>>(),
        ["a.txt", "b.txt", "untracked.txt"]
    );
    assert!(status.conflicting.is_empty());
}

#[test]
fn refs_flag_the_current_branch_and_peel_tags() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let first = commit_file(&repo, "a.txt", "one\n", "first");
    let second = commit_file(&repo, "a.txt", "two\n", "second");

    let git = GitRepository::open(dir.path()).expect("open");
    let ctx = JobContext::detached();
    git.run(
        &Operation::CreateTag {
            name: "v1.0".into(),
            target: id(first),
            message: Some("first release".into()),
        },
        &ctx,
    )
    .expect("annotated tag");
    git.run(
        &Operation::CreateTag {
            name: "nightly".into(),
            target: id(second),
            message: None,
        },
        &ctx,
    )
    .expect("lightweight tag");
    git.run(
        &Operation::CreateBranch {
            name: "topic".into(),
            target: id(first),
            checkout: false,
        },
        &ctx,
    )
    .expect("branch");

    let mut refs: Vec<_> = git
        .refs()
        .expect("refs")
        .into_iter()
        .map(|label| (label.name.to_string(), label.kind, label.target, label.is_current))
        .collect();
    refs.sort();
    assert_eq!(
        refs,
        [
            ("main".to_string(), RefKind::LocalBranch, id(second), true),
            ("nightly".to_string(), RefKind::Tag, id(second), false),
            ("topic".to_string(), RefKind::LocalBranch, id(first), false),
            ("v1.0".to_string(), RefKind::Tag, id(first), false),
        ]
    );
}

#[test]
fn create_branch_and_checkout() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let first = commit_file(&repo, "a.txt", "one\n", "first");
    commit_file(&repo, "a.txt", "two\n", "second");

    let git = GitRepository::open(dir.path()).expect("open");
    let ctx = JobContext::detached();
    git.run(
        &Operation::CreateBranch {
            name: "old".into(),
            target: id(first),
            checkout: true,
        },
        &ctx,
    )
    .expect("branch");
    assert_eq!(git.current_branch().as_deref(), Some("old"));
    assert_eq!(read(&repo, "a.txt"), "one\n");

    git.run(
        &Operation::Checkout {
            target: first.to_string(),
        },
        &ctx,
    )
    .expect("detached checkout");
    assert_eq!(git.current_branch(), None);
    assert_eq!(git.current_head().expect("head"), Some(id(first)));

    git.run(
        &Operation::Checkout {
            target: "main".into(),
        },
        &ctx,
    )
    .expect("checkout main");
    assert_eq!(read(&repo, "a.txt"), "two\n");
}

#[test]
fn branches_rename_and_delete() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let base = commit_file(&repo, "a.txt", "one\n", "first");
    let git = GitRepository::open(dir.path()).expect("open");
    let ctx = JobContext::detached();
    let branch = |name: &str, checkout| Operation::CreateBranch {
        name: name.into(),
        target: id(base),
        checkout,
    };

    git.run(&branch("topic", false), &ctx).expect("topic");
    git.run(
        &Operation::RenameBranch {
            from: "topic".into(),
            to: "renamed".into(),
        },
        &ctx,
    )
    .expect("rename");
    let names: Vec<String> = git
        .refs()
        .expect("refs")
        .iter()
        .map(|label| label.name.to_string())
        .collect();
    assert!(names.contains(&"renamed".to_owned()));
    assert!(!names.contains(&"topic".to_owned()));

    git.run(
        &Operation::DeleteBranch {
            name: "renamed".into(),
            force: false,
        },
        &ctx,
    )
    .expect("merged branch deletes");
    assert!(repo.find_branch("renamed", git2::BranchType::Local).is_err());

    // A branch holding commits HEAD lacks needs force.
    git.run(&branch("ahead", true), &ctx).expect("ahead");
    commit_file(&repo, "b.txt", "ahead\n", "ahead work");
    git.run(
        &Operation::Checkout {
            target: "main".into(),
        },
        &ctx,
    )
    .expect("checkout");
    let unmerged = Operation::DeleteBranch {
        name: "ahead".into(),
        force: false,
    };
    assert!(matches!(
        git.run(&unmerged, &ctx),
        Err(RepoError::InvalidState(_))
    ));
    git.run(
        &Operation::DeleteBranch {
            name: "ahead".into(),
            force: true,
        },
        &ctx,
    )
    .expect("forced delete");

    let current = Operation::DeleteBranch {
        name: "main".into(),
        force: true,
    };
    assert!(matches!(
        git.run(&current, &ctx),
        Err(RepoError::InvalidState(_))
    ));
    let missing = Operation::RenameBranch {
        from: "nope".into(),
        to: "still-nope".into(),
    };
    assert!(matches!(
        git.run(&missing, &ctx),
        Err(RepoError::UnknownRevision(_))
    ));
}

#[test]
fn tags_delete() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let first = commit_file(&repo, "a.txt", "one\n", "first");
    let git = GitRepository::open(dir.path()).expect("open");
    let ctx = JobContext::detached();
    git.run(
        &Operation::CreateTag {
            name: "v1".into(),
            target: id(first),
            message: Some("release".into()),
        },
        &ctx,
    )
    .expect("tag");

    let delete = Operation::DeleteTag { name: "v1".into() };
    git.run(&delete, &ctx).expect("delete tag");
    assert!(
        !git.refs()
            .expect("refs")
            .iter()
            .any(|label| label.kind == RefKind::Tag)
    );
    assert!(matches!(
        git.run(&delete, &ctx),
        Err(RepoError::UnknownRevision(_))
    ));
}

#[test]
fn restore_discards_staged_and_unstaged_edits() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    commit_file(&repo, "a.txt", "one\n", "first");
    commit_file(&repo, "b.txt", "two\n", "second");
    fs::write(dir.path().join("a.txt"), "scribbled\n").expect("write");
    fs::write(dir.path().join("b.txt"), "staged\n").expect("write");
    let mut index = repo.index().expect("index");
    index.add_path(Path::new("b.txt")).expect("add");
    index.write().expect("write index");

    let git = GitRepository::open(dir.path()).expect("open");
    assert!(git.work_tree_status().expect("status").is_dirty());
    git.run(
        &Operation::Restore {
            paths: vec!["a.txt".into(), "b.txt".into()],
        },
        &JobContext::detached(),
    )
    .expect("restore");

    assert_eq!(read(&repo, "a.txt"), "one\n");
    assert_eq!(read(&repo, "b.txt"), "two\n");
    assert!(!git.work_tree_status().expect("status").is_dirty());
}

#[test]
fn merge_accepts_a_commit_id() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let base = commit_file(&repo, "a.txt", "one\n", "first");
    let tip = commit_file(&repo, "a.txt", "two\n", "second");
    repo.reference("refs/heads/main", base, true, "rewind")
        .expect("rewind");
    repo.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))
        .expect("checkout");

    let git = GitRepository::open(dir.path()).expect("open");
    git.run(
        &Operation::Merge {
            branch: tip.to_string(),
        },
        &JobContext::detached(),
    )
    .expect("merge by id");
    assert_eq!(head_id(&repo), tip);
    assert_eq!(read(&repo, "a.txt"), "two\n");
}

#[test]
fn merge_fast_forwards() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    commit_file(&repo, "a.txt", "one\n", "first");
    let git = GitRepository::open(dir.path()).expect("open");
    let ctx = JobContext::detached();
    git.run(
        &Operation::CreateBranch {
            name: "feature".into(),
            target: id(head_id(&repo)),
            checkout: true,
        },
        &ctx,
    )
    .expect("branch");
    let tip = commit_file(&repo, "b.txt", "feature\n", "feature work");
    git.run(
        &Operation::Checkout {
            target: "main".into(),
        },
        &ctx,
    )
    .expect("checkout");
    assert!(!dir.path().join("b.txt").exists());

    git.run(
        &Operation::Merge {
            branch: "feature".into(),
        },
        &ctx,
    )
    .expect("merge");
    assert_eq!(head_id(&repo), tip);
    assert_eq!(git.current_branch().as_deref(), Some("main"));
    assert_eq!(read(&repo, "b.txt"), "feature\n");
}

#[test]
fn conflicting_merge_leaves_conflicts_behind() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let base = commit_file(&repo, "a.txt", "base\n", "base");
    let git = GitRepository::open(dir.path()).expect("open");
    let ctx = JobContext::detached();
    git.run(
        &Operation::CreateBranch {
            name: "other".into(),
            target: id(base),
            checkout: false,
        },
        &ctx,
    )
    .expect("branch");
    commit_file(&repo, "a.txt", "main\n", "main side");
    git.run(
        &Operation::Checkout {
            target: "other".into(),
        },
        &ctx,
    )
    .expect("checkout other");
    commit_file(&repo, "a.txt", "other\n", "other side");
    git.run(
        &Operation::Checkout {
            target: "main".into(),
        },
        &ctx,
    )
    .expect("checkout main");

    let err = git
        .run(
            &Operation::Merge {
                branch: "other".into(),
            },
            &ctx,
        )
        .expect_err("conflict");
    assert!(matches!(&err, RepoError::Conflicts(paths) if paths == &["a.txt"]));

    let status = git.work_tree_status().expect("status");
    assert!(status.is_conflicting());
    assert!(status.conflicting.contains("a.txt"));
}

#[test]
fn cherry_pick_copies_a_commit() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let base = commit_file(&repo, "a.txt", "one\n", "base");
    let git = GitRepository::open(dir.path()).expect("open");
    let ctx = JobContext::detached();
    git.run(
        &Operation::CreateBranch {
            name: "topic".into(),
            target: id(base),
            checkout: true,
        },
        &ctx,
    )
    .expect("branch");
    let picked = commit_file(&repo, "b.txt", "picked\n", "add b");
    git.run(
        &Operation::Checkout {
            target: "main".into(),
        },
        &ctx,
    )
    .expect("checkout");
    let main_tip = commit_file(&repo, "c.txt", "main\n", "add c");

    git.run(&Operation::CherryPick { commit: id(picked) }, &ctx)
        .expect("cherry-pick");
    let head = repo.head().and_then(|h| h.peel_to_commit()).expect("head");
    assert_eq!(head.summary(), Some("add b"));
    assert_eq!(head.parent_id(0).expect("parent"), main_tip);
    assert_ne!(head.id(), picked);
    assert_eq!(read(&repo, "b.txt"), "picked\n");
    assert!(!git.work_tree_status().expect("status").is_dirty());
}

#[test]
fn rebase_replays_onto_upstream() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let base = commit_file(&repo, "a.txt", "one\n", "base");
    let git = GitRepository::open(dir.path()).expect("open");
    let ctx = JobContext::detached();
    git.run(
        &Operation::CreateBranch {
            name: "topic".into(),
            target: id(base),
            checkout: true,
        },
        &ctx,
    )
    .expect("branch");
    commit_file(&repo, "b.txt", "topic\n", "topic work");
    git.run(
        &Operation::Checkout {
            target: "main".into(),
        },
        &ctx,
    )
    .expect("checkout main");
    let main_tip = commit_file(&repo, "c.txt", "main\n", "main work");
    git.run(
        &Operation::Checkout {
            target: "topic".into(),
        },
        &ctx,
    )
    .expect("checkout topic");

    git.run(
        &Operation::Rebase {
            onto: "main".into(),
        },
        &ctx,
    )
    .expect("rebase");
    let head = repo.head().and_then(|h| h.peel_to_commit()).expect("head");
    assert_eq!(head.summary(), Some("topic work"));
    assert_eq!(head.parent_id(0).expect("parent"), main_tip);
    assert_eq!(git.current_branch().as_deref(), Some("topic"));
}

#[test]
fn hard_reset_moves_head_and_files() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    let first = commit_file(&repo, "a.txt", "one\n", "first");
    commit_file(&repo, "a.txt", "two\n", "second");
    let git = GitRepository::open(dir.path()).expect("open");

    git.run(
        &Operation::Reset {
            target: id(first),
            mode: ResetMode::Hard,
        },
        &JobContext::detached(),
    )
    .expect("reset");
    assert_eq!(head_id(&repo), first);
    assert_eq!(read(&repo, "a.txt"), "one\n");
    assert_eq!(git.current_branch().as_deref(), Some("main"));
}

#[test]
fn stage_unstage_and_commit() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    commit_file(&repo, "a.txt", "one\n", "first");
    let git = GitRepository::open(dir.path()).expect("open");
    let ctx = JobContext::detached();

    fs::write(dir.path().join("a.txt"), "two\n").expect("write");
    let paths = vec!["a.txt".to_string()];
    git.run(
        &Operation::Stage {
            paths: paths.clone(),
        },
        &ctx,
    )
    .expect("stage");
    let status = git.work_tree_status().expect("status");
    assert!(status.staged.contains("a.txt"));
    assert!(status.modified.is_empty());

    git.run(
        &Operation::Unstage {
            paths: paths.clone(),
        },
        &ctx,
    )
    .expect("unstage");
    let status = git.work_tree_status().expect("status");
    assert!(status.staged.is_empty());
    assert!(status.modified.contains("a.txt"));

    git.run(&Operation::Stage { paths }, &ctx).expect("stage");
    git.run(
        &Operation::Commit {
            message: "update a".into(),
        },
        &ctx,
    )
    .expect("commit");
    let head = repo.head().and_then(|h| h.peel_to_commit()).expect("head");
    assert_eq!(head.summary(), Some("update a"));
    assert!(!git.work_tree_status().expect("status").is_dirty());

    let err = git
        .run(
            &Operation::Commit {
                message: "again".into(),
            },
            &ctx,
        )
        .expect_err("nothing staged");
    assert!(matches!(err, RepoError::InvalidState(_)));
}

#[test]
fn clone_pull_and_push() {
    let origin_dir = TempDir::new().expect("tempdir");
    let origin = init(origin_dir.path());
    commit_file(&origin, "a.txt", "one\n", "first");

    let clone_dir = TempDir::new().expect("tempdir");
    let target = clone_dir.path().join("work");
    let ctx = JobContext::detached();
    let url = origin_dir.path().to_str().expect("utf-8 path");
    let git = GitRepository::clone_into(url, &target, &ctx).expect("clone");
    configure(git.inner());
    assert_eq!(git.current_branch().as_deref(), Some("main"));

    let upstream_tip = commit_file(&origin, "a.txt", "two\n", "second");
    git.run(
        &Operation::Pull {
            remote: "origin".into(),
        },
        &ctx,
    )
    .expect("pull");
    assert_eq!(head_id(git.inner()), upstream_tip);
    assert!(
        git.refs()
            .expect("refs")
            .iter()
            .any(|label| label.kind == RefKind::RemoteBranch && label.name == "origin/main")
    );

    git.run(
        &Operation::CreateBranch {
            name: "feature".into(),
            target: id(upstream_tip),
            checkout: true,
        },
        &ctx,
    )
    .expect("branch");
    let pushed = commit_file(git.inner(), "b.txt", "feature\n", "feature work");
    git.run(
        &Operation::Push {
            remote: "origin".into(),
            branch: Some("feature".into()),
        },
        &ctx,
    )
    .expect("push");
    let remote_tip = origin
        .find_branch("feature", git2::BranchType::Local)
        .expect("pushed branch")
        .get()
        .target();
    assert_eq!(remote_tip, Some(pushed));

    git.run(
        &Operation::DeleteRemoteBranch {
            remote: "origin".into(),
            branch: "feature".into(),
        },
        &ctx,
    )
    .expect("delete remote branch");
    assert!(
        origin
            .find_branch("feature", git2::BranchType::Local)
            .is_err()
    );
    assert!(
        !git.refs()
            .expect("refs")
            .iter()
            .any(|label| label.name == "origin/feature")
    );
}

#[test]
fn cancelled_context_stops_before_starting() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    commit_file(&repo, "a.txt", "one\n", "first");
    let git = GitRepository::open(dir.path()).expect("open");

    let ctx = JobContext::detached();
    ctx.cancel_token().cancel();
    let err = git
        .run(
            &Operation::Fetch {
                remote: "origin".into(),
            },
            &ctx,
        )
        .expect_err("cancelled");
    assert!(matches!(err, RepoError::Cancelled));
}

#[test]
fn coordinator_refreshes_from_disk() {
    let dir = TempDir::new().expect("tempdir");
    let repo = init(dir.path());
    commit_file(&repo, "a.txt", "one\n", "first");
    let tip = commit_file(&repo, "a.txt", "two\n", "second");
    fs::write(dir.path().join("a.txt"), "dirty\n").expect("write");

    let git = GitRepository::open(dir.path()).expect("open");
    let mut coordinator = RefreshCoordinator::new();
    coordinator
        .refresh_from(&git, &CommitQuery::default(), RefreshTrigger::Initial)
        .expect("refresh");

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(
        snapshot.annotation(0).map(|a| a.marker),
        Some(RowMarker::WorkTree)
    );
    assert_eq!(snapshot.annotation(1).map(|a| a.is_head), Some(true));
    assert_eq!(snapshot.labels_for(&id(tip))[0].name, "main");
    assert_eq!(coordinator.jump_to_label("main"), Ok(1));
}
