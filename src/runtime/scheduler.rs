//! Idle-lead follow-up scheduler
//!
//! A cancellable background task that scans the agent's registry once per
//! tick and streams a follow-up for every lead idle past the threshold.

use super::executor::LeadAgent;
use super::traits::{MessageSource, RecordStore};
use super::{AgentError, FollowUp};

use futures::Stream;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

const STREAM_BUFFER: usize = 32;

type FollowUpResult = Result<FollowUp, AgentError>;

pub struct FollowUpScheduler;

impl FollowUpScheduler {
    /// Start scanning `agent` every `tick`. Runs until stopped, until the
    /// stream is dropped, or until a record write fails.
    pub fn spawn<S, G>(agent: Arc<LeadAgent<S, G>>, tick: Duration) -> FollowUpStream
    where
        S: RecordStore + 'static,
        G: MessageSource + 'static,
    {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_scheduler(agent, tick, cancel.clone(), tx));

        FollowUpStream {
            inner: ReceiverStream::new(rx),
            cancel,
            task: Some(task),
        }
    }
}

/// Lazy, unbounded stream of follow-ups with a stop handle
pub struct FollowUpStream {
    inner: ReceiverStream<FollowUpResult>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FollowUpStream {
    /// Stop accepting new ticks. A lead already being processed finishes.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop automatically once `window` has elapsed
    pub fn stop_after(&self, window: Duration) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(window) => cancel.cancel(),
                () = cancel.cancelled() => {}
            }
        });
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop and wait for the scan task to exit
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Follow-up scheduler task failed");
            }
        }
    }
}

impl Stream for FollowUpStream {
    type Item = FollowUpResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for FollowUpStream {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_scheduler<S, G>(
    agent: Arc<LeadAgent<S, G>>,
    tick: Duration,
    cancel: CancellationToken,
    tx: mpsc::Sender<FollowUpResult>,
) where
    S: RecordStore,
    G: MessageSource,
{
    tracing::info!(
        tick_ms = %tick.as_millis(),
        idle_threshold_ms = %agent.idle_threshold().as_millis(),
        "Follow-up scheduler started"
    );

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        if scan_once(&agent, &cancel, &tx).await.is_break() {
            break;
        }
    }

    tracing::info!("Follow-up scheduler stopped");
}

/// One pass over the registry. Breaks on cancellation, on a closed stream,
/// or after forwarding a persistence error. Cancellation is only observed
/// between leads.
async fn scan_once<S, G>(
    agent: &LeadAgent<S, G>,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<FollowUpResult>,
) -> ControlFlow<()>
where
    S: RecordStore,
    G: MessageSource,
{
    let now = Instant::now();

    for lead_id in agent.idle_leads(now).await {
        if cancel.is_cancelled() {
            return ControlFlow::Break(());
        }

        let item = match agent.follow_up(&lead_id, now).await {
            Ok(Some(follow_up)) => Ok(follow_up),
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(lead_id = %lead_id, error = %e, "Follow-up failed");
                Err(e)
            }
        };
        let failed = item.is_err();

        // The record is already written and the idle clock reset, so the
        // message goes out even if a stop arrived meanwhile.
        if tx.send(item).await.is_err() || failed {
            return ControlFlow::Break(());
        }
    }

    ControlFlow::Continue(())
}
