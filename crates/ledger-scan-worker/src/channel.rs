//! Channel abstraction between a scan worker and its chunk supplier.
//!
//! The channel carries [`WorkerMessage`]s in and [`WorkerResult`]s out.
//! Implementations may wrap a web worker port, a socket, or an in-process queue.

use async_trait::async_trait;

use crate::error::Result;
use crate::messages::{WorkerMessage, WorkerResult};

/// Worker-side end of a message channel.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Channel: Send + Sync {
    /// Receive the next message.
    ///
    /// Returns `None` once the supplier has hung up.
    async fn recv(&self) -> Result<Option<WorkerMessage>>;

    /// Receive with timeout.
    ///
    /// Returns `Ok(None)` if the timeout expires before a message arrives.
    async fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<Option<WorkerMessage>>;

    /// Send a result back to the supplier.
    async fn send(&self, result: WorkerResult) -> Result<()>;
}

/// An in-process channel pair built on tokio mpsc queues.
pub mod memory {
    use super::*;
    use crate::error::WorkerError;
    use ledger_scan::{ProgressResult, ScanRequest};
    use tokio::sync::{mpsc, Mutex};

    /// Create a connected (supplier, worker) pair.
    pub fn pair(capacity: usize) -> (WorkerClient, MemoryChannel) {
        let (msg_tx, msg_rx) = mpsc::channel(capacity);
        let (res_tx, res_rx) = mpsc::channel(capacity);
        (
            WorkerClient {
                sender: msg_tx,
                receiver: Mutex::new(res_rx),
            },
            MemoryChannel {
                receiver: Mutex::new(msg_rx),
                sender: res_tx,
            },
        )
    }

    /// Worker-side end of an in-memory channel.
    pub struct MemoryChannel {
        receiver: Mutex<mpsc::Receiver<WorkerMessage>>,
        sender: mpsc::Sender<WorkerResult>,
    }

    #[async_trait]
    impl Channel for MemoryChannel {
        async fn recv(&self) -> Result<Option<WorkerMessage>> {
            let mut rx = self.receiver.lock().await;
            Ok(rx.recv().await)
        }

        async fn recv_timeout(
            &self,
            timeout: std::time::Duration,
        ) -> Result<Option<WorkerMessage>> {
            let mut rx = self.receiver.lock().await;
            match tokio::time::timeout(timeout, rx.recv()).await {
                Ok(Some(message)) => Ok(Some(message)),
                Ok(None) => Err(WorkerError::ChannelClosed),
                Err(_) => Ok(None), // Timeout
            }
        }

        async fn send(&self, result: WorkerResult) -> Result<()> {
            self.sender
                .send(result)
                .await
                .map_err(|_| WorkerError::ChannelClosed)
        }
    }

    /// Supplier-side end of an in-memory channel.
    pub struct WorkerClient {
        sender: mpsc::Sender<WorkerMessage>,
        receiver: Mutex<mpsc::Receiver<WorkerResult>>,
    }

    impl WorkerClient {
        /// Send a raw message.
        pub async fn send(&self, message: WorkerMessage) -> Result<()> {
            self.sender
                .send(message)
                .await
                .map_err(|_| WorkerError::ChannelClosed)
        }

        /// Receive the next result.
        pub async fn recv(&self) -> Result<WorkerResult> {
            let mut rx = self.receiver.lock().await;
            rx.recv().await.ok_or(WorkerError::ChannelClosed)
        }

        /// Submit a chunk and wait for its result.
        pub async fn process(&self, request: ScanRequest) -> Result<WorkerResult> {
            self.send(WorkerMessage::Process(request)).await?;
            self.recv().await
        }

        /// Ask the worker to cancel its session.
        pub async fn cancel(&self) -> Result<()> {
            self.send(WorkerMessage::Cancel).await
        }

        /// Ask the worker for its final balances and wait for them.
        pub async fn finish(&self) -> Result<ProgressResult> {
            self.send(WorkerMessage::Finish).await?;
            loop {
                match self.recv().await? {
                    WorkerResult::Complete(progress) => return Ok(progress),
                    // Results for chunks submitted before Finish.
                    WorkerResult::Progress(_) | WorkerResult::Error(_) => continue,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::pair;
    use super::*;
    use ledger_scan::ScanRequest;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_channel_send_recv() {
        let (client, channel) = pair(8);

        client
            .send(WorkerMessage::Process(ScanRequest::new(vec![1u8, 2, 3], 0, &["USD"])))
            .await
            .unwrap();

        match channel.recv().await.unwrap() {
            Some(WorkerMessage::Process(request)) => {
                assert_eq!(request.chunk.as_ref(), &[1, 2, 3]);
                assert_eq!(request.currencies, vec!["USD".to_string()]);
            }
            other => panic!("expected Process message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_memory_channel_timeout() {
        let (_client, channel) = pair(8);
        let got = channel.recv_timeout(Duration::from_millis(10)).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_recv_after_hangup() {
        let (client, channel) = pair(8);
        drop(client);
        assert!(channel.recv().await.unwrap().is_none());
        assert!(channel.send(WorkerResult::Error(ledger_scan::ErrorResult {
            message: "x".into(),
        }))
        .await
        .is_err());
    }
}
