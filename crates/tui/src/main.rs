mod app;
mod config;
mod renderer;

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};
use gitlane_core::views::{GraphMetrics, render_graph};
use gitlane_core::{CommitQuery, LaneWalker, RefreshCoordinator, RefreshTrigger, svg};
use gitlane_repo::GitRepository;

use crate::app::App;
use crate::config::Config;

/// Browse the commit graph of a git repository.
#[derive(Debug, Parser)]
#[command(name = "gitlane", version, about)]
struct Cli {
    /// Any directory inside the repository's work tree.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Commits to load per refresh.
    #[arg(long, value_name = "N")]
    max_commits: Option<usize>,

    /// Branch, tag or revision to load; repeat for several. Defaults to
    /// every local branch.
    #[arg(long = "branch", value_name = "REV")]
    branches: Vec<String>,

    /// Config file to use instead of the default location.
    #[arg(long, env = "GITLANE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the graph as SVG to FILE and exit.
    #[arg(long, value_name = "FILE")]
    export_svg: Option<PathBuf>,

    /// Create a repository at PATH first when there is none.
    #[arg(long)]
    init: bool,

    /// Log file; `RUST_LOG` sets the filter.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref(), cli.export_svg.is_some())?;

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let query = CommitQuery {
        tips: if cli.branches.is_empty() {
            config.branches.clone()
        } else {
            cli.branches.clone()
        },
        limit: cli.max_commits.unwrap_or(config.max_commits),
    };

    let repo = open_repository(&cli.path, cli.init)?
        .with_walker(LaneWalker::new().reuse_lanes(config.reuse_lanes));
    log::info!(
        "gitlane on {} (limit {}, tips {:?})",
        repo.path().display(),
        query.limit,
        query.tips
    );

    match &cli.export_svg {
        Some(out) => export_svg(&repo, &query, config.dark, out),
        None => App::new(repo, query, config.poll_interval()).run(),
    }
}

fn open_repository(path: &Path, init: bool) -> Result<GitRepository> {
    match GitRepository::open(path) {
        Ok(repo) => Ok(repo),
        Err(_) if init => GitRepository::init(path)
            .with_context(|| format!("creating repository at {}", path.display())),
        Err(err) => {
            Err(err).with_context(|| format!("opening repository at {}", path.display()))
        }
    }
}

/// Logs go to `log_file`, to stderr for one-shot exports, and nowhere
/// otherwise so the terminal UI is not disturbed.
fn init_logging(log_file: Option<&Path>, one_shot: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None if one_shot => {
            builder.target(Target::Stderr);
        }
        None => return Ok(()),
    }
    builder.init();
    Ok(())
}

fn export_svg(repo: &GitRepository, query: &CommitQuery, dark: bool, out: &Path) -> Result<()> {
    let mut coordinator = RefreshCoordinator::new();
    coordinator
        .refresh_from(repo, query, RefreshTrigger::Initial)
        .context("reading repository")?;
    let snapshot = coordinator.snapshot();

    let metrics = GraphMetrics::default();
    let commands = render_graph(snapshot, &metrics, None);
    let width = metrics.graph_width(snapshot.max_lane()) + metrics.text_width;
    let height = snapshot.len() as f64 * metrics.row_height;
    let document = svg::render_svg(&commands, width, height, dark);

    fs::write(out, document).with_context(|| format!("writing {}", out.display()))?;
    log::info!("wrote {} rows to {}", snapshot.len(), out.display());
    Ok(())
}
