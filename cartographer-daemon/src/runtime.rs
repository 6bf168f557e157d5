use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use cartographer_core::apps::list_app_files_at;
use cartographer_core::settings::load_token_at;
use cartographer_core::{LogFormat, Settings};
use cartographer_sync::staging;
use cartographer_sync::{
    run_cycle, CommitIdentity, CycleReport, CycleScope, Fetcher, GitFetcher, GitHubClient,
    HostingApi,
};

use crate::error::{io_err, DaemonError};

/// Everything a cycle needs, built once at startup and shared by every
/// cycle.
pub struct Runner<F, H> {
    apps_dir: PathBuf,
    staging_dir: PathBuf,
    interval: Duration,
    identity: CommitIdentity,
    fetcher: F,
    host: H,
}

impl Runner<GitFetcher, GitHubClient> {
    /// Production runner: git fetcher and GitHub client, both authenticated
    /// with the token at `settings.token_path`.
    ///
    /// A missing or empty token and an unreadable apps directory are fatal.
    pub fn from_settings(settings: &Settings) -> Result<Self, DaemonError> {
        let token = load_token_at(&settings.token_path)?;
        list_app_files_at(&settings.apps_dir)?;

        let fetcher = GitFetcher::default().with_token(token.clone());
        let host = GitHubClient::new(settings.api_base_url.clone(), token);
        Ok(Self::new(settings, fetcher, host))
    }
}

impl<F, H> Runner<F, H>
where
    F: Fetcher + Send + Sync + 'static,
    H: HostingApi + Send + Sync + 'static,
{
    pub fn new(settings: &Settings, fetcher: F, host: H) -> Self {
        Self {
            apps_dir: settings.apps_dir.clone(),
            staging_dir: settings.staging_dir.clone(),
            interval: Duration::from_secs(settings.interval_secs),
            identity: CommitIdentity::from(settings),
            fetcher,
            host,
        }
    }

    /// Run one cycle on the blocking pool, wiping staging before and after.
    pub async fn cycle(self: &Arc<Self>, scope: CycleScope) -> Result<CycleReport, DaemonError> {
        let started = Instant::now();
        wipe_staging(&self.staging_dir);

        let runner = Arc::clone(self);
        let result = tokio::task::spawn_blocking(move || {
            run_cycle(
                &runner.apps_dir,
                &runner.staging_dir,
                &scope,
                &runner.fetcher,
                &runner.host,
                &runner.identity,
            )
        })
        .await
        .map_err(|err| DaemonError::Join {
            task: "cycle",
            message: err.to_string(),
        });

        wipe_staging(&self.staging_dir);
        let report = result??;
        tracing::info!(
            apps = report.apps.len(),
            created = report.created(),
            skipped = report.skipped(),
            failed_intents = report.failed_intents(),
            failed_apps = report.failed_apps(),
            duration_ms = started.elapsed().as_millis() as u64,
            "cycle finished"
        );
        Ok(report)
    }

    /// Cycle until `shutdown` resolves, sleeping the configured interval
    /// between cycles. A running cycle is never interrupted.
    pub async fn run_until<S>(self: Arc<Self>, shutdown: S) -> Result<(), DaemonError>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            if let Err(err) = self.cycle(CycleScope::All).await {
                tracing::error!(error = %err, "cycle failed");
            }
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

/// Remove the staging tree. Failures are logged; the next wipe retries.
fn wipe_staging(dir: &Path) {
    if let Err(err) = staging::wipe(dir) {
        tracing::warn!(error = %err, "could not clean staging directory");
    }
}

/// Load settings from `root`, then cycle until ctrl-c.
pub fn start_blocking(root: &Path) -> Result<(), DaemonError> {
    let settings = Settings::load_at(root)?;
    init_tracing(settings.log_format);
    let runner = Arc::new(Runner::from_settings(&settings)?);
    tracing::info!(
        apps_dir = %settings.apps_dir.display(),
        interval_secs = settings.interval_secs,
        "cartographer started"
    );

    build_runtime()?.block_on(async move {
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let signal = tokio::spawn(async move {
            let received = tokio::signal::ctrl_c().await;
            let _ = stop_tx.send(());
            received.map_err(|err| DaemonError::Signal(err.to_string()))
        });

        runner
            .run_until(async move {
                let _ = stop_rx.await;
            })
            .await?;
        if !signal.is_finished() {
            signal.abort();
            return Ok(());
        }
        match signal.await {
            Ok(received) => received,
            Err(err) => Err(DaemonError::Join {
                task: "signal",
                message: err.to_string(),
            }),
        }
    })
}

/// Load settings from `root` and run a single cycle.
pub fn run_once_blocking(root: &Path, scope: CycleScope) -> Result<CycleReport, DaemonError> {
    let settings = Settings::load_at(root)?;
    init_tracing(settings.log_format);
    let runner = Arc::new(Runner::from_settings(&settings)?);
    build_runtime()?.block_on(async move { runner.cycle(scope).await })
}

fn build_runtime() -> Result<tokio::runtime::Runtime, DaemonError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))
}

/// Install the global subscriber on stderr. `RUST_LOG` overrides the default
/// `info` filter. Records from the `log` facade are bridged in.
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = match format {
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
    };
}
