//! Worker message envelopes.
//!
//! A chunk supplier sends [`WorkerMessage`]s and receives [`WorkerResult`]s.
//! Both encode to CBOR for transports that cross a process boundary.

use serde::{Deserialize, Serialize};

use ledger_scan::{ErrorResult, ProgressResult, ScanRequest};

use crate::error::{Result, WorkerError};

/// Messages sent to a scan worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum WorkerMessage {
    /// Scan one chunk.
    Process(ScanRequest),
    /// Cancel the session. No reply is sent.
    Cancel,
    /// No more chunks: reply with the final balances and stop.
    Finish,
}

/// Messages sent back by a scan worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum WorkerResult {
    /// A chunk was scanned.
    Progress(ProgressResult),
    /// The session finished; final balances.
    Complete(ProgressResult),
    /// A chunk could not be scanned.
    Error(ErrorResult),
}

impl WorkerMessage {
    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
        buf
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| WorkerError::Decoding(e.to_string()))
    }
}

impl WorkerResult {
    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
        buf
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| WorkerError::Decoding(e.to_string()))
    }

    /// The progress payload, for `Progress` and `Complete`.
    pub fn progress(&self) -> Option<&ProgressResult> {
        match self {
            WorkerResult::Progress(p) | WorkerResult::Complete(p) => Some(p),
            WorkerResult::Error(_) => None,
        }
    }

    /// Whether this is the final message of a session.
    pub fn is_complete(&self) -> bool {
        matches!(self, WorkerResult::Complete(_))
    }

    /// Convert into a `Result`, mapping `Error` to [`WorkerError::Remote`].
    pub fn into_result(self) -> Result<ProgressResult> {
        match self {
            WorkerResult::Progress(p) | WorkerResult::Complete(p) => Ok(p),
            WorkerResult::Error(e) => Err(WorkerError::Remote(e.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_scan::{BalanceMap, ScanSession};

    #[test]
    fn test_message_cbor_preserves_chunk() {
        let msg = WorkerMessage::Process(ScanRequest::new(vec![0xAB; 64], 128, &["USD"]));
        let bytes = msg.to_bytes();
        assert_eq!(WorkerMessage::from_bytes(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_result_cbor_keeps_infinite_smallest() {
        let mut session = ScanSession::default();
        let mut data = b"EUR".to_vec();
        data.extend_from_slice(&250u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 16]);
        let progress = session
            .process_chunk(&ledger_scan::Chunk::new(0, data), &["EUR"])
            .unwrap();

        let mut balance = progress.balances["EUR"].clone();
        balance.smallest_transaction = f64::INFINITY;
        let mut balances = BalanceMap::new();
        balances.insert("EUR".into(), balance);

        let result = WorkerResult::Progress(ProgressResult {
            balances,
            bytes_processed: 23,
        });
        let decoded = WorkerResult::from_bytes(&result.to_bytes()).unwrap();
        assert_eq!(
            decoded.progress().unwrap().balances["EUR"].smallest_transaction,
            f64::INFINITY
        );
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        assert!(matches!(
            WorkerMessage::from_bytes(&[0xFF, 0x00, 0x13]),
            Err(WorkerError::Decoding(_))
        ));
    }

    #[test]
    fn test_json_envelope_shape() {
        let json = serde_json::to_string(&WorkerMessage::Cancel).unwrap();
        assert_eq!(json, r#"{"type":"cancel"}"#);

        let json = serde_json::to_value(WorkerResult::Error(ErrorResult {
            message: "session cancelled".into(),
        }))
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["data"]["message"], "session cancelled");
    }

    #[test]
    fn test_into_result() {
        let err = WorkerResult::Error(ErrorResult {
            message: "session cancelled".into(),
        })
        .into_result()
        .unwrap_err();
        assert_eq!(err.to_string(), "worker reported: session cancelled");
    }
}
