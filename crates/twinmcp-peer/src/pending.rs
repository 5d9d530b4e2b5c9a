//! Pending-request table.
//!
//! Maps correlation ids to single-shot awaiters. Registration is ordered
//! before the frame write, so a response racing the writer always finds its
//! slot. On transport failure the table is drained and every awaiter is
//! completed exceptionally.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;

use twinmcp_protocol::{RequestId, Response};

/// Concurrent map from correlation id to awaiter.
pub(crate) struct PendingRequests {
    entries: Mutex<HashMap<RequestId, oneshot::Sender<Response>>>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Registers an awaiter for the given id.
    ///
    /// Must happen before the request frame is written.
    pub(crate) fn register(&self, id: RequestId) -> oneshot::Receiver<Response> {
        let (tx, rx) = oneshot::channel();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(id, tx);
        rx
    }

    /// Completes the awaiter registered under the response's id.
    ///
    /// Returns false when no awaiter is registered (unknown id).
    pub(crate) fn complete(&self, response: Response) -> bool {
        let sender = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.remove(&response.id)
        };
        match sender {
            // A dropped receiver means the caller gave up; that still counts
            // as a known id.
            Some(sender) => {
                let _ = sender.send(response);
                true
            }
            None => false,
        }
    }

    /// Removes an entry without completing it (caller gave up).
    pub(crate) fn forget(&self, id: &RequestId) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(id);
    }

    /// Drains the table, completing every awaiter exceptionally.
    ///
    /// Dropping the senders closes the paired receivers, which surfaces as a
    /// transport-closed error at each awaiting caller.
    pub(crate) fn fail_all(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RequestId {
        RequestId::String(s.to_owned())
    }

    #[tokio::test]
    async fn complete_delivers_response() {
        let pending = PendingRequests::new();
        let rx = pending.register(id("1"));

        let response = Response::success(id("1"), serde_json::json!({"ok": true}));
        assert!(pending.complete(response));
        assert_eq!(pending.len(), 0);

        let got = rx.await.unwrap();
        assert_eq!(got.id, id("1"));
    }

    #[tokio::test]
    async fn unknown_id_is_reported() {
        let pending = PendingRequests::new();
        let response = Response::success(id("404"), serde_json::Value::Null);
        assert!(!pending.complete(response));
    }

    #[tokio::test]
    async fn fail_all_closes_every_awaiter() {
        let pending = PendingRequests::new();
        let rx1 = pending.register(id("1"));
        let rx2 = pending.register(id("2"));

        pending.fail_all();
        assert_eq!(pending.len(), 0);
        assert!(rx1.await.is_err());
        assert!(rx2.await.is_err());
    }

    #[tokio::test]
    async fn forget_removes_without_completing() {
        let pending = PendingRequests::new();
        let rx = pending.register(id("1"));
        pending.forget(&id("1"));
        assert_eq!(pending.len(), 0);
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn completion_after_caller_gave_up_still_counts() {
        let pending = PendingRequests::new();
        let rx = pending.register(id("1"));
        drop(rx);
        let response = Response::success(id("1"), serde_json::Value::Null);
        assert!(pending.complete(response));
    }
}
