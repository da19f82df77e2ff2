use std::collections::BTreeSet;
use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use gitlane_core::jobs::{JobEvent, JobOutcome, JobRunner};
use gitlane_core::navigation::next_tagged_row;
use gitlane_core::{
    CommitQuery, NavigationError, RefreshCoordinator, RefreshTrigger, RepositorySource, Row,
};
use gitlane_protocol::{CommitId, RefKind, RefLabel, WorkTreeStatus};
use gitlane_repo::{GitRepository, Operation, ResetMode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::renderer::{self, StatusLine};

const FRAME_POLL: Duration = Duration::from_millis(100);
const DEFAULT_REMOTE: &str = "origin";

/// What typed text turns into once Enter is pressed.
#[derive(Debug, Clone)]
enum InputKind {
    CommitMessage,
    NewBranch(CommitId),
    NewTag(CommitId),
    RenameBranch(String),
}

impl InputKind {
    fn title(&self) -> String {
        match self {
            Self::CommitMessage => "commit message".to_owned(),
            Self::NewBranch(at) => format!("new branch at {}", at.short()),
            Self::NewTag(at) => format!("new tag at {}", at.short()),
            Self::RenameBranch(from) => format!("rename {from} to"),
        }
    }

    fn into_operation(self, text: String) -> Operation {
        match self {
            Self::CommitMessage => Operation::Commit { message: text },
            Self::NewBranch(target) => Operation::CreateBranch {
                name: text,
                target,
                checkout: false,
            },
            Self::NewTag(target) => Operation::CreateTag {
                name: text,
                target,
                message: None,
            },
            Self::RenameBranch(from) => Operation::RenameBranch { from, to: text },
        }
    }
}

/// A question the status bar is asking.
#[derive(Debug, Clone)]
enum Prompt {
    Input { kind: InputKind, text: String },
    Confirm(Operation),
}

impl Prompt {
    fn line(&self) -> String {
        match self {
            Self::Input { kind, text } => format!("{}: {text}_", kind.title()),
            Self::Confirm(op) => format!("{op}? (y/n)"),
        }
    }
}

/// Viewer state: the open repository, the coordinator owning the rows, and
/// the jobs running operations in the background.
pub struct App {
    repo: GitRepository,
    workdir: PathBuf,
    query: CommitQuery,
    coordinator: RefreshCoordinator,
    jobs: JobRunner,
    poll_interval: Duration,
    last_poll: Instant,
    scroll: usize,
    status: StatusLine,
    prompt: Option<Prompt>,
    quit: bool,
}

impl App {
    pub fn new(repo: GitRepository, query: CommitQuery, poll_interval: Duration) -> Self {
        let workdir = repo.path().to_path_buf();
        Self {
            repo,
            workdir,
            query,
            coordinator: RefreshCoordinator::new(),
            jobs: JobRunner::new(),
            poll_interval,
            last_poll: Instant::now(),
            scroll: 0,
            status: StatusLine::default(),
            prompt: None,
            quit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        self.refresh(RefreshTrigger::Initial);

        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        self.jobs.cancel_all();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    ) -> Result<()> {
        let title = self.workdir.display().to_string();
        while !self.quit {
            let height = usize::from(terminal.size()?.height.saturating_sub(2));
            self.keep_selection_visible(height);

            self.status.prompt = self.prompt.as_ref().map(Prompt::line);
            let snapshot = self.coordinator.snapshot();
            let selected = self.coordinator.selected_index();
            terminal.draw(|frame| {
                renderer::draw(frame, &title, snapshot, selected, self.scroll, &self.status);
            })?;

            if event::poll(FRAME_POLL)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key, height);
            }
            self.drain_jobs();
            self.poll_work_tree();
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, page: usize) {
        if let Some(prompt) = self.prompt.take() {
            self.answer(prompt, key);
            return;
        }
        let last = self.coordinator.snapshot().len().checked_sub(1);
        let current = self.coordinator.selected_index();
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                let next = current.map_or(0, |row| row + 1);
                self.select(last.map(|last| next.min(last)));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.select(Some(current.map_or(0, |row| row.saturating_sub(1))));
            }
            KeyCode::PageDown => {
                let next = current.map_or(0, |row| row + page.max(1));
                self.select(last.map(|last| next.min(last)));
            }
            KeyCode::PageUp => {
                self.select(Some(current.map_or(0, |row| row.saturating_sub(page.max(1)))));
            }
            KeyCode::Char('g') | KeyCode::Home => self.select(Some(0)),
            KeyCode::Char('G') | KeyCode::End => self.select(last),
            KeyCode::Char('h') => self.jump_to_head(),
            KeyCode::Char('t') => {
                let snapshot = self.coordinator.snapshot();
                match next_tagged_row(snapshot.rows(), snapshot.labels(), current) {
                    Some(row) => self.select(Some(row)),
                    None => self.notify("no tagged commit in the loaded window"),
                }
            }
            KeyCode::Char('r') => self.refresh(RefreshTrigger::Manual),
            KeyCode::Char('c') => self.checkout_selected(),
            KeyCode::Char('s') => self.stage_all(),
            KeyCode::Char('u') => self.unstage_all(),
            KeyCode::Char('d') => self.discard_all(),
            KeyCode::Char('C') => self.ask(InputKind::CommitMessage),
            KeyCode::Char('b') => {
                if let Some((id, _)) = self.selected_commit() {
                    self.ask(InputKind::NewBranch(id));
                }
            }
            KeyCode::Char('T') => {
                if let Some((id, _)) = self.selected_commit() {
                    self.ask(InputKind::NewTag(id));
                }
            }
            KeyCode::Char('n') => self.rename_selected_branch(),
            KeyCode::Char('D') => self.delete_selected_label(),
            KeyCode::Char('m') => {
                if let Some((id, labels)) = self.selected_commit() {
                    self.start(Operation::Merge {
                        branch: revision(&id, &labels),
                    });
                }
            }
            KeyCode::Char('R') => {
                if let Some((id, labels)) = self.selected_commit() {
                    self.start(Operation::Rebase {
                        onto: revision(&id, &labels),
                    });
                }
            }
            KeyCode::Char('y') => {
                if let Some((commit, _)) = self.selected_commit() {
                    self.start(Operation::CherryPick { commit });
                }
            }
            KeyCode::Char('x') => {
                if let Some((target, _)) = self.selected_commit() {
                    self.start(Operation::Reset {
                        target,
                        mode: ResetMode::Mixed,
                    });
                }
            }
            KeyCode::Char('X') => {
                if let Some((target, _)) = self.selected_commit() {
                    self.prompt = Some(Prompt::Confirm(Operation::Reset {
                        target,
                        mode: ResetMode::Hard,
                    }));
                }
            }
            KeyCode::Char('P') => self.start(Operation::Push {
                remote: DEFAULT_REMOTE.into(),
                branch: None,
            }),
            KeyCode::Char('f') => self.start(Operation::Fetch {
                remote: DEFAULT_REMOTE.into(),
            }),
            KeyCode::Char('p') => self.start(Operation::Pull {
                remote: DEFAULT_REMOTE.into(),
            }),
            KeyCode::Esc => {
                if self.jobs.is_busy() {
                    self.jobs.cancel_all();
                    self.notify("cancelling");
                }
            }
            _ => {}
        }
    }

    /// Feed a key to the open prompt; it stays open until answered.
    fn answer(&mut self, prompt: Prompt, key: KeyEvent) {
        match prompt {
            Prompt::Confirm(op) => match key.code {
                KeyCode::Char('y') => self.start(op),
                _ => self.notify("cancelled"),
            },
            Prompt::Input { kind, mut text } => match key.code {
                KeyCode::Esc => self.notify("cancelled"),
                KeyCode::Enter => {
                    let text = text.trim().to_owned();
                    if text.is_empty() {
                        self.notify(format!("{} is empty", kind.title()));
                    } else {
                        self.start(kind.into_operation(text));
                    }
                }
                KeyCode::Backspace => {
                    text.pop();
                    self.prompt = Some(Prompt::Input { kind, text });
                }
                KeyCode::Char(ch) => {
                    text.push(ch);
                    self.prompt = Some(Prompt::Input { kind, text });
                }
                _ => self.prompt = Some(Prompt::Input { kind, text }),
            },
        }
    }

    fn ask(&mut self, kind: InputKind) {
        self.prompt = Some(Prompt::Input {
            kind,
            text: String::new(),
        });
    }

    /// Selected commit and its labels; tells the user when none is selected.
    fn selected_commit(&mut self) -> Option<(CommitId, Vec<RefLabel>)> {
        let selected = match self.coordinator.selected_row() {
            Some(Row::Commit(commit)) => Some((
                commit.id.clone(),
                self.coordinator.snapshot().labels_for(&commit.id).to_vec(),
            )),
            Some(Row::WorkTree(_)) | None => None,
        };
        if selected.is_none() {
            self.notify("select a commit first");
        }
        selected
    }

    fn shown_status(&self) -> WorkTreeStatus {
        self.coordinator
            .rows()
            .work_tree()
            .cloned()
            .unwrap_or_default()
    }

    fn stage_all(&mut self) {
        let status = self.shown_status();
        let paths: Vec<String> = status
            .modified
            .union(&status.conflicting)
            .cloned()
            .collect();
        if paths.is_empty() {
            self.notify("nothing to stage");
        } else {
            self.start(Operation::Stage { paths });
        }
    }

    fn unstage_all(&mut self) {
        let paths: Vec<String> = self.shown_status().staged.into_iter().collect();
        if paths.is_empty() {
            self.notify("nothing staged");
        } else {
            self.start(Operation::Unstage { paths });
        }
    }

    fn discard_all(&mut self) {
        let status = self.shown_status();
        let paths: Vec<String> = status
            .staged
            .iter()
            .chain(&status.modified)
            .chain(&status.conflicting)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if paths.is_empty() {
            self.notify("no changes to discard");
        } else {
            self.prompt = Some(Prompt::Confirm(Operation::Restore { paths }));
        }
    }

    fn rename_selected_branch(&mut self) {
        let Some((_, labels)) = self.selected_commit() else {
            return;
        };
        match labels.iter().find(|label| label.kind == RefKind::LocalBranch) {
            Some(label) => self.ask(InputKind::RenameBranch(label.name.to_string())),
            None => self.notify("no local branch on the selected commit"),
        }
    }

    /// Delete the first label on the selected commit, after confirmation.
    fn delete_selected_label(&mut self) {
        let Some((_, labels)) = self.selected_commit() else {
            return;
        };
        let op = labels.iter().find_map(|label| match label.kind {
            RefKind::LocalBranch if label.is_current => None,
            RefKind::LocalBranch => Some(Operation::DeleteBranch {
                name: label.name.to_string(),
                force: false,
            }),
            RefKind::RemoteBranch => {
                label
                    .name
                    .split_once('/')
                    .map(|(remote, branch)| Operation::DeleteRemoteBranch {
                        remote: remote.to_owned(),
                        branch: branch.to_owned(),
                    })
            }
            RefKind::Tag => Some(Operation::DeleteTag {
                name: label.name.to_string(),
            }),
        });
        match op {
            Some(op) => self.prompt = Some(Prompt::Confirm(op)),
            None => self.notify("nothing deletable on the selected commit"),
        }
    }

    fn select(&mut self, row: Option<usize>) {
        self.coordinator.select(row);
    }

    fn keep_selection_visible(&mut self, height: usize) {
        let Some(row) = self.coordinator.selected_index() else {
            return;
        };
        if row < self.scroll {
            self.scroll = row;
        } else if height > 0 && row >= self.scroll + height {
            self.scroll = row + 1 - height;
        }
    }

    fn jump_to_head(&mut self) {
        let Some(head) = self.coordinator.snapshot().head().cloned() else {
            self.notify("HEAD does not point at a commit");
            return;
        };
        match self.coordinator.jump_to(&head) {
            Ok(_) => self.status.message = None,
            Err(NavigationError::NotInWindow(_)) => {
                self.warn("HEAD is outside the loaded window");
            }
            Err(err) => self.warn(err.to_string()),
        }
    }

    /// Check out the selected commit, by branch name when a local branch
    /// points at it.
    fn checkout_selected(&mut self) {
        let target = match self.coordinator.selected_row() {
            Some(Row::Commit(commit)) => Some(
                self.coordinator
                    .snapshot()
                    .labels_for(&commit.id)
                    .iter()
                    .find(|label| label.kind == RefKind::LocalBranch)
                    .map_or_else(|| commit.id.to_string(), |label| label.name.to_string()),
            ),
            Some(Row::WorkTree(_)) | None => None,
        };
        match target {
            Some(target) => self.start(Operation::Checkout { target }),
            None => self.notify("select a commit to check out"),
        }
    }

    fn start(&mut self, op: Operation) {
        if self.jobs.is_busy() {
            self.notify("another operation is still running");
            return;
        }
        let label = op.to_string();
        let path = self.workdir.clone();
        let spawned = self.jobs.spawn(label.clone(), move |ctx| {
            GitRepository::open(&path)?.run(&op, ctx)
        });
        match spawned {
            Ok(_) => self.notify(format!("{label}...")),
            Err(err) => self.warn(format!("cannot start {label}: {err}")),
        }
    }

    fn drain_jobs(&mut self) {
        while let Some(event) = self.jobs.try_next() {
            match event {
                JobEvent::Progress { progress, .. } => {
                    let running: Vec<_> = self.jobs.running().map(|(_, label)| label).collect();
                    let label = running.first().copied().unwrap_or("transfer");
                    let percent = (progress.fraction() * 100.0).round();
                    self.status.message = Some(format!(
                        "{label}: {percent}% ({}/{} objects)",
                        progress.received_objects, progress.total_objects
                    ));
                    self.status.is_error = false;
                }
                JobEvent::Finished { label, outcome, .. } => {
                    match outcome {
                        JobOutcome::Succeeded => self.notify(format!("{label}: done")),
                        JobOutcome::Cancelled => self.notify(format!("{label}: cancelled")),
                        JobOutcome::Failed(err) => self.warn(format!("{label}: {err}")),
                    }
                    // Failed operations can still have moved refs or
                    // left conflicts behind.
                    self.refresh(RefreshTrigger::OperationCompleted);
                }
            }
        }
    }

    fn poll_work_tree(&mut self) {
        if self.last_poll.elapsed() < self.poll_interval {
            return;
        }
        self.last_poll = Instant::now();
        let status = match self.repo.work_tree_status() {
            Ok(status) => status,
            Err(err) => {
                log::warn!("work tree poll failed: {err}");
                return;
            }
        };
        if status != self.shown_status() {
            log::debug!("work tree changed");
            self.refresh(RefreshTrigger::WorkTreeChanged);
        }
    }

    fn refresh(&mut self, trigger: RefreshTrigger) {
        if let Err(err) = self
            .coordinator
            .refresh_from(&self.repo, &self.query, trigger)
        {
            self.warn(format!("refresh failed: {err}"));
        }
        self.status.branch = self.repo.current_branch();
        self.last_poll = Instant::now();
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.status.message = Some(message.into());
        self.status.is_error = false;
    }

    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.status.message = Some(message);
        self.status.is_error = true;
    }
}

/// Name to hand to merge or rebase: the commit's first label, else its id.
fn revision(id: &CommitId, labels: &[RefLabel]) -> String {
    labels
        .first()
        .map_or_else(|| id.to_string(), |label| label.name.to_string())
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use super::*;

    fn app(dir: &tempfile::TempDir) -> App {
        let repo = GitRepository::init(dir.path()).expect("init");
        App::new(repo, CommitQuery::default(), Duration::from_secs(60))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), 10);
    }

    #[test]
    fn typed_text_builds_the_operation() {
        let target = CommitId::from("0123456789abcdef0123456789abcdef01234567");
        assert_eq!(
            InputKind::NewBranch(target.clone()).into_operation("topic".into()),
            Operation::CreateBranch {
                name: "topic".into(),
                target,
                checkout: false,
            }
        );
        assert_eq!(
            InputKind::RenameBranch("old".into()).into_operation("new".into()),
            Operation::RenameBranch {
                from: "old".into(),
                to: "new".into(),
            }
        );
    }

    #[test]
    fn commit_prompt_edits_and_cancels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app(&dir);

        press(&mut app, KeyCode::Char('C'));
        for ch in "fixx".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Backspace);
        assert_eq!(
            app.prompt.as_ref().map(Prompt::line).as_deref(),
            Some("commit message: fix_")
        );
        // Keys go to the prompt, not the viewer.
        assert!(!app.quit);

        press(&mut app, KeyCode::Esc);
        assert!(app.prompt.is_none());
        assert_eq!(app.status.message.as_deref(), Some("cancelled"));
        assert!(!app.jobs.is_busy());
    }

    #[test]
    fn confirmation_needs_a_yes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app(&dir);
        app.prompt = Some(Prompt::Confirm(Operation::DeleteTag { name: "v1".into() }));
        assert_eq!(
            app.prompt.as_ref().map(Prompt::line).as_deref(),
            Some("delete tag v1? (y/n)")
        );
        press(&mut app, KeyCode::Char('n'));
        assert!(app.prompt.is_none());
        assert!(!app.jobs.is_busy());
    }

    #[test]
    fn clean_tree_has_nothing_to_stage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app(&dir);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.status.message.as_deref(), Some("nothing to stage"));
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.status.message.as_deref(), Some("select a commit first"));
    }

    #[test]
    fn revisions_prefer_labels() {
        let id = CommitId::from("0123456789abcdef0123456789abcdef01234567");
        assert_eq!(revision(&id, &[]), id.to_string());
        let labels = [RefLabel {
            name: "origin/main".into(),
            kind: RefKind::RemoteBranch,
            target: id.clone(),
            is_current: false,
        }];
        assert_eq!(revision(&id, &labels), "origin/main");
    }
}
