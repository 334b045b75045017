//! Git mirror of the remote command repository.
//!
//! The mirror keeps a local checkout in step with a remote by polling: each
//! cycle fetches the tracked branch, compares the local `HEAD` with the
//! fetched revision and pulls only when they differ. Cycles run either on
//! the background poller's timer or on demand (`POST /update`).
//!
//! # Concurrency
//!
//! At most one cycle touches the checkout at a time. A cycle requested while
//! another is running waits for it to finish and then runs its own, which
//! normally finds nothing new.
//!
//! # Failures
//!
//! Network errors, a missing remote or a failed merge end the cycle with
//! [`SyncOutcome::Failed`]. The error is logged and the next attempt waits
//! for the next tick or trigger; nothing is retried immediately.

use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::MirrorConfig;
use crate::models::SyncOutcome;

pub struct Mirror {
    repo_url: String,
    path: PathBuf,
    branch: String,
    git_timeout: Duration,
    /// Held for the duration of a sync cycle.
    cycle: Mutex<()>,
}

impl Mirror {
    pub fn new(
        repo_url: impl Into<String>,
        path: impl Into<PathBuf>,
        branch: impl Into<String>,
        git_timeout: Duration,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            path: path.into(),
            branch: branch.into(),
            git_timeout,
            cycle: Mutex::new(()),
        }
    }

    /// Build a mirror from `[mirror]`, or `None` when no remote is configured.
    pub fn from_config(config: &MirrorConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        Some(Self::new(
            config.repo_url.clone().unwrap_or_default(),
            config.path.clone(),
            config.branch.clone(),
            config.git_timeout(),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// Create the local checkout and register `origin` if there is none yet.
    ///
    /// Safe to call repeatedly; an existing checkout is left untouched.
    pub async fn init(&self) -> Result<()> {
        if self.path.join(".git").exists() {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.path)
            .await
            .with_context(|| {
                format!("Failed to create mirror directory: {}", self.path.display())
            })?;

        self.git(&["init"]).await?;
        self.git(&["remote", "add", "origin", self.repo_url.as_str()]).await?;

        tracing::info!(
            path = %self.path.display(),
            remote = %self.repo_url,
            "initialized mirror checkout"
        );
        Ok(())
    }

    /// Run one check-then-pull cycle.
    ///
    /// Waits for any cycle already in progress. Errors are logged and
    /// reported as [`SyncOutcome::Failed`]; this never returns an error.
    pub async fn run_cycle(&self) -> SyncOutcome {
        let _guard = self.cycle.lock().await;

        match self.sync_once().await {
            Ok(outcome) => {
                match &outcome {
                    SyncOutcome::Updated { revision } => {
                        tracing::info!(revision = %revision, "mirror updated");
                    }
                    _ => tracing::debug!("mirror already up to date"),
                }
                outcome
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::error!(remote = %self.repo_url, error = %message, "mirror sync failed");
                SyncOutcome::Failed { message }
            }
        }
    }

    async fn sync_once(&self) -> Result<SyncOutcome> {
        self.init().await?;

        self.git(&["fetch", "origin", self.branch.as_str()]).await?;

        // An unborn branch has no HEAD yet; treat it as "behind".
        let local = self.rev_parse("HEAD").await.ok();
        let remote = self.rev_parse("FETCH_HEAD").await?;

        if local.as_deref() == Some(remote.as_str()) {
            return Ok(SyncOutcome::Unchanged);
        }

        self.git(&["pull", "--no-rebase", "--no-edit", "origin", self.branch.as_str()])
            .await?;

        let revision = self.rev_parse("HEAD").await?;
        Ok(SyncOutcome::Updated { revision })
    }

    async fn rev_parse(&self, rev: &str) -> Result<String> {
        let sha = self.git(&["rev-parse", "--verify", "--quiet", rev]).await?;
        if sha.is_empty() {
            bail!("git rev-parse {} returned nothing", rev);
        }
        Ok(sha)
    }

    /// Run `git <args>` inside the checkout and return trimmed stdout.
    async fn git(&self, args: &[&str]) -> Result<String> {
        let subcommand = args.first().copied().unwrap_or("git");

        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.git_timeout, cmd.output())
            .await
            .map_err(|_| {
                anyhow!(
                    "git {} timed out after {}s",
                    subcommand,
                    self.git_timeout.as_secs()
                )
            })?
            .with_context(|| format!("Failed to execute 'git {}'. Is git installed?", subcommand))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git {} failed: {}", subcommand, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Start the background poller.
///
/// The first cycle runs immediately, then once per `every`. Cancelling
/// `shutdown` stops the loop; a cycle already running is allowed to finish.
pub fn spawn_poller(
    mirror: Arc<Mirror>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            remote = %mirror.repo_url(),
            interval_secs = every.as_secs(),
            "mirror poller started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    mirror.run_cycle().await;
                }
            }
        }

        tracing::info!("mirror poller stopped");
    })
}
