//! The Approval Registry: a process-wide map from request id to a waiter,
//! following the oneshot-per-request broker pattern (insert a sender keyed
//! by a fresh id, remove-and-send to resolve). The critical race —
//! concurrent resolve and timeout — resolves by compare-and-remove:
//! whichever side removes the `HashMap` entry first wins, the other is a
//! no-op.

use std::collections::HashMap;
use std::time::Duration;

use bridge_core::new_request_id;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};
use tracing::warn;

/// The decision that resolved a pending approval, or the reason it didn't.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub approved: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cancelled: {0}")]
    Cancelled(String),
    #[error("Approval timeout: no response within {0}ms")]
    Timeout(u64),
}

type Waiter = oneshot::Sender<Result<ApprovalOutcome, String>>;

#[derive(Default)]
pub struct ApprovalRegistry {
    pending: Mutex<HashMap<String, Waiter>>,
}

impl ApprovalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh UUIDv4, unique per process lifetime.
    pub fn new_request_id(&self) -> String {
        new_request_id()
    }

    /// Registers `id` and suspends until the first of: a matching
    /// [`resolve`](Self::resolve), a [`cancel`](Self::cancel) /
    /// [`cancel_all`](Self::cancel_all), or `timeout_ms` elapsing.
    pub async fn wait(&self, id: &str, timeout_ms: u64) -> Result<ApprovalOutcome, RegistryError> {
        let receiver = {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().await.insert(id.to_string(), tx);
            rx
        };

        match tokio::time::timeout(Duration::from_millis(timeout_ms), receiver).await {
            Ok(Ok(Ok(outcome))) => Ok(outcome),
            Ok(Ok(Err(reason))) => Err(RegistryError::Cancelled(reason)),
            Ok(Err(_closed)) => Err(RegistryError::Cancelled("registry dropped".to_string())),
            Err(_elapsed) => {
                // Lost the race to a resolve that landed between the
                // timeout firing and us taking the lock: treat it as
                // already-removed, either way the entry must not linger.
                self.pending.lock().await.remove(id);
                Err(RegistryError::Timeout(timeout_ms))
            }
        }
    }

    /// Resolves `id` with a decision. Returns `true` if a waiter existed;
    /// non-matching ids are orphans, logged and ignored.
    pub async fn resolve(&self, id: &str, approved: bool, reason: Option<String>) -> bool {
        let sender = self.pending.lock().await.remove(id);
        match sender {
            Some(tx) => {
                let _ = tx.send(Ok(ApprovalOutcome { approved, reason }));
                true
            }
            None => {
                warn!(request_id = id, "approval response for unknown request, ignoring");
                false
            }
        }
    }

    /// Rejects the waiter for `id` with `reason`. No-op if absent.
    pub async fn cancel(&self, id: &str, reason: &str) {
        if let Some(tx) = self.pending.lock().await.remove(id) {
            let _ = tx.send(Err(reason.to_string()));
        }
    }

    /// Rejects every pending waiter with `reason`.
    pub async fn cancel_all(&self, reason: &str) {
        let mut pending = self.pending.lock().await;
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(reason.to_string()));
        }
    }

    pub async fn count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
