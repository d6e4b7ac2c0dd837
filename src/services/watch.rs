//! Stability and log watchers
//!
//! A blocking wait runs in the foreground while a ticking loop reports
//! progress in the background. Both share a cancellation token: the
//! background loop gets a child token that is cancelled as soon as the
//! foreground wait returns, and it checks that token before printing.

use chrono::{DateTime, Utc};
use console::Term;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::format::{format_deployment, format_event, format_log_event, DEFAULT_WIDTH};
use crate::domain::task::LogLocation;
use crate::error::{ClientError, DeployError};
use crate::infrastructure::ControlPlane;

/// Intervals used by the reconciler and its watchers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Pause after each mutating call
    pub settle: Duration,
    /// Stability progress tick
    pub progress: Duration,
    /// Log tail tick
    pub log_poll: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
            progress: Duration::from_secs(10),
            log_poll: Duration::from_secs(5),
        }
    }
}

/// Line-oriented sink for watcher output
pub trait Output: Send + Sync {
    fn print(&self, lines: &[String]);

    /// Replace the previous `previous` lines with `lines`
    fn redraw(&self, previous: usize, lines: &[String]) {
        let _ = previous;
        self.print(lines);
    }

    /// Wrap width for events and log lines
    fn width(&self) -> usize {
        DEFAULT_WIDTH
    }
}

/// Standard output; redraws in place when attached to a terminal
pub struct TermOutput {
    term: Term,
}

impl TermOutput {
    pub fn stdout() -> Self {
        Self { term: Term::stdout() }
    }
}

impl Output for TermOutput {
    fn print(&self, lines: &[String]) {
        for line in lines {
            let _ = self.term.write_line(line);
        }
    }

    fn redraw(&self, previous: usize, lines: &[String]) {
        if self.term.is_term() && previous > 0 {
            let _ = self.term.clear_last_lines(previous);
        }
        self.print(lines);
    }

    fn width(&self) -> usize {
        if self.term.is_term() {
            let (_rows, cols) = self.term.size();
            cols as usize
        } else {
            DEFAULT_WIDTH
        }
    }
}

/// Sleep for `duration` unless cancelled first
pub async fn sleep_or_cancel(
    duration: Duration,
    cancel: &CancellationToken,
    operation: &'static str,
) -> Result<(), DeployError> {
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeployError::Cancelled { operation }),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Run a blocking control plane wait, giving up when `cancel` fires
pub async fn wait_or_cancel<F>(
    wait: F,
    cancel: &CancellationToken,
    operation: &'static str,
    target: impl Into<String>,
) -> Result<(), DeployError>
where
    F: Future<Output = Result<(), ClientError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeployError::Cancelled { operation }),
        result = wait => result.map_err(DeployError::control_plane(operation, target)),
    }
}

/// Block until every named service is stable, reporting progress meanwhile
pub async fn wait_services_stable<C>(
    client: Arc<C>,
    cluster: &str,
    names: &[String],
    started_at: DateTime<Utc>,
    timings: Timings,
    out: Arc<dyn Output>,
    cancel: &CancellationToken,
) -> Result<(), DeployError>
where
    C: ControlPlane + 'static,
{
    let watch = cancel.child_token();
    let progress = tokio::spawn(report_progress(
        client.clone(),
        cluster.to_string(),
        names.to_vec(),
        started_at,
        timings.progress,
        out,
        watch.clone(),
    ));

    let result = wait_or_cancel(
        client.wait_until_services_stable(cluster, names),
        cancel,
        "WaitUntilServicesStable",
        names.join(","),
    )
    .await;

    watch.cancel();
    let _ = progress.await;
    result
}

/// Lines describing current deployments and events newer than `started_at`
pub async fn describe_progress<C>(
    client: &C,
    cluster: &str,
    names: &[String],
    started_at: DateTime<Utc>,
    width: usize,
) -> Result<Vec<String>, ClientError>
where
    C: ControlPlane + ?Sized,
{
    let out = client.describe_services(cluster, names).await?;

    let mut lines = Vec::new();
    for svc in &out.services {
        lines.extend(svc.deployments.iter().map(format_deployment));
        for event in svc.events.iter().filter(|e| e.created_at_utc() > started_at) {
            lines.extend(format_event(event, width));
        }
    }
    Ok(lines)
}

async fn report_progress<C>(
    client: Arc<C>,
    cluster: String,
    names: Vec<String>,
    started_at: DateTime<Utc>,
    tick: Duration,
    out: Arc<dyn Output>,
    token: CancellationToken,
) where
    C: ControlPlane + 'static,
{
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut printed = 0;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let lines = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            lines = describe_progress(client.as_ref(), &cluster, &names, started_at, out.width()) => lines,
        };

        match lines {
            Ok(lines) => {
                if token.is_cancelled() {
                    return;
                }
                out.redraw(printed, &lines);
                printed = lines.len();
            }
            Err(e) => warn!("Failed to describe services while waiting: {}", e),
        }
    }
}

/// Print new events of one stream every tick until cancelled.
///
/// The cursor moves one millisecond past the last delivered event.
pub async fn tail_log<C>(
    client: Arc<C>,
    location: LogLocation,
    since_ms: i64,
    prefix: String,
    tick: Duration,
    out: Arc<dyn Output>,
    token: CancellationToken,
) where
    C: ControlPlane + 'static,
{
    debug!("Tailing {} {}", location.group, location.stream);
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cursor = since_ms;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let page = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            page = client.get_log_events(&location.group, &location.stream, cursor, None) => page,
        };

        match page {
            Ok(page) => {
                if token.is_cancelled() {
                    return;
                }
                let width = out.width();
                for event in &page.events {
                    out.print(&format_log_event(event, &prefix, width));
                }
                if let Some(last) = page.events.last() {
                    cursor = last.timestamp + 1;
                }
            }
            Err(e) => warn!("Failed to fetch logs from {}: {}", location.stream, e),
        }
    }
}
