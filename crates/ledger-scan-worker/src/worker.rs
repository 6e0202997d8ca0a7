//! The scan worker loop.
//!
//! A worker owns one [`ScanSession`] and serves messages from a [`Channel`]
//! strictly in order, so at most one chunk is ever in flight for the session.
//! A cancel message only affects chunks that arrive after it; a
//! [`CancelHandle`] can latch the session out of band.

use std::time::Duration;

use ledger_scan::{CancelHandle, ErrorResult, ScanRequest, ScanSession, SessionConfig, SessionStats};

use crate::channel::{memory, Channel};
use crate::error::{Result, WorkerError};
use crate::messages::{WorkerMessage, WorkerResult};

/// Configuration for worker behavior.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Queue depth of the in-memory channel created by [`spawn_worker`].
    pub channel_capacity: usize,
    /// Stop after this long without a message.
    pub idle_timeout: Option<Duration>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            idle_timeout: None,
        }
    }
}

/// Why a worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// A `Finish` message was handled.
    #[default]
    Finished,
    /// The supplier hung up.
    Hangup,
    /// No message arrived within the idle timeout.
    IdleTimeout,
}

/// Summary of a worker run.
#[derive(Debug, Clone, Default)]
pub struct WorkerReport {
    /// Session counters at shutdown.
    pub stats: SessionStats,
    /// Number of `Error` replies sent.
    pub errors_reported: u64,
    /// Whether the session was cancelled.
    pub cancelled: bool,
    /// Bytes processed at shutdown.
    pub bytes_processed: u64,
    /// Why the loop ended.
    pub stop_reason: StopReason,
}

/// Serves one scan session over a channel.
pub struct ScanWorker<C: Channel> {
    /// The session being fed.
    session: ScanSession,
    /// Message channel.
    channel: C,
    /// Configuration.
    config: WorkerConfig,
    /// Error replies sent so far.
    errors_reported: u64,
}

impl<C: Channel> ScanWorker<C> {
    /// Create a worker for `session`.
    pub fn new(session: ScanSession, channel: C, config: WorkerConfig) -> Self {
        Self {
            session,
            channel,
            config,
            errors_reported: 0,
        }
    }

    /// A handle that cancels the session without going through the channel.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.session.cancel_handle()
    }

    /// Serve messages until `Finish`, hangup, or idle timeout.
    pub async fn run(mut self) -> Result<WorkerReport> {
        tracing::info!("Scan worker started");

        let stop_reason = loop {
            let message = match self.next_message().await? {
                Ok(message) => message,
                Err(reason) => break reason,
            };

            match message {
                WorkerMessage::Process(request) => {
                    let reply = self.process(request);
                    self.channel.send(reply).await?;
                    // Let other tasks run between chunks.
                    tokio::task::yield_now().await;
                }
                WorkerMessage::Cancel => {
                    self.session.cancel();
                }
                WorkerMessage::Finish => {
                    self.channel
                        .send(WorkerResult::Complete(self.session.snapshot()))
                        .await?;
                    break StopReason::Finished;
                }
            }
        };

        let report = WorkerReport {
            stats: self.session.stats(),
            errors_reported: self.errors_reported,
            cancelled: self.session.is_cancelled(),
            bytes_processed: self.session.bytes_processed(),
            stop_reason,
        };
        tracing::info!(
            chunks = report.stats.chunks_processed,
            detections = report.stats.detections,
            reason = ?report.stop_reason,
            "Scan worker stopped"
        );
        Ok(report)
    }

    /// The next message, or the reason to stop.
    async fn next_message(&self) -> Result<std::result::Result<WorkerMessage, StopReason>> {
        match self.config.idle_timeout {
            Some(timeout) => match self.channel.recv_timeout(timeout).await {
                Ok(Some(message)) => Ok(Ok(message)),
                Ok(None) => Ok(Err(StopReason::IdleTimeout)),
                Err(WorkerError::ChannelClosed) => Ok(Err(StopReason::Hangup)),
                Err(e) => Err(e),
            },
            None => Ok(self.channel.recv().await?.ok_or(StopReason::Hangup)),
        }
    }

    fn process(&mut self, request: ScanRequest) -> WorkerResult {
        let offset = request.offset;
        match self.session.handle(request) {
            Ok(progress) => WorkerResult::Progress(progress),
            Err(e) => {
                self.errors_reported += 1;
                tracing::warn!("Chunk at offset {} rejected: {}", offset, e);
                WorkerResult::Error(ErrorResult::from(&e))
            }
        }
    }
}

/// Spawn a worker on the current tokio runtime with an in-memory channel.
///
/// Returns the supplier-side client, an out-of-band cancel handle, and the
/// task handle resolving to the run report.
pub fn spawn_worker(
    session_config: SessionConfig,
    config: WorkerConfig,
) -> (
    memory::WorkerClient,
    CancelHandle,
    tokio::task::JoinHandle<Result<WorkerReport>>,
) {
    let (client, channel) = memory::pair(config.channel_capacity);
    let worker = ScanWorker::new(ScanSession::new(session_config), channel, config);
    let cancel = worker.cancel_handle();
    let handle = tokio::spawn(worker.run());
    (client, cancel, handle)
}
