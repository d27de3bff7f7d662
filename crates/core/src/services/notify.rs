//! Notification Dispatch.
//!
//! A lifecycle transition that committed is durable regardless of what
//! happens to its notifications, so dispatch is decoupled from the
//! transition path: callers enqueue onto a channel and a worker thread
//! drains it into a [`NotificationSink`]. Delivery failures are logged and
//! dropped; `enqueue` never fails the caller.

use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use uuid::Uuid;
use wardbook_docstore::{Document, DocumentStore, WriteBatch};

use crate::error::{WardError, WardResult};
use crate::notification::Notification;
use crate::paths;

/// Where notifications end up. The trait is the seam for retry policies or
/// external delivery channels; the default sink is the per-user inbox in
/// the document store.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, user_id: &str, notification: &Notification) -> WardResult<()>;
}

/// Store-backed sink appending to `users/{user_id}/notifications`.
pub struct InboxSink {
    store: Arc<dyn DocumentStore>,
}

impl InboxSink {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl NotificationSink for InboxSink {
    fn deliver(&self, user_id: &str, notification: &Notification) -> WardResult<()> {
        let path = paths::notification(user_id, &Uuid::new_v4().to_string())?;
        let doc = Document::from_serialize(notification).map_err(WardError::Store)?;
        self.store
            .commit(WriteBatch::new().create(path, doc))
            .map_err(WardError::Commit)
    }
}

struct Envelope {
    user_id: String,
    notification: Notification,
}

/// Fire-and-forget notification queue.
///
/// One worker thread drains enqueued notifications into the sink in
/// enqueue order. There is no retry and no delivery guarantee.
pub struct Dispatcher {
    tx: Mutex<Option<mpsc::Sender<Envelope>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Starts the worker thread.
    pub fn spawn(sink: Arc<dyn NotificationSink>) -> Self {
        let (tx, rx) = mpsc::channel::<Envelope>();
        let worker = std::thread::spawn(move || {
            for envelope in rx {
                if let Err(err) = sink.deliver(&envelope.user_id, &envelope.notification) {
                    tracing::warn!(
                        user = envelope.user_id,
                        error = %err,
                        "notification delivery failed; dropping"
                    );
                }
            }
        });

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queues a notification. Never fails: if the queue is already closed
    /// the notification is logged and dropped.
    pub fn enqueue(&self, user_id: impl Into<String>, notification: Notification) {
        let user_id = user_id.into();
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let sent = tx.as_ref().map(|tx| {
            tx.send(Envelope {
                user_id: user_id.clone(),
                notification,
            })
        });
        match sent {
            Some(Ok(())) => {}
            _ => tracing::warn!(user = user_id, "notification queue closed; dropping"),
        }
    }

    /// Closes the queue and waits for the worker to drain it. Safe to call
    /// more than once.
    pub fn close(&self) {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::warn!("notification worker exited abnormally");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.close();
    }
}
