//! Background worker: a separate task that survives while the foreground
//! is hidden and raises completion notifications on its behalf.
//!
//! The worker never runs timer arithmetic. The foreground pushes snapshots
//! for reference and forwards terminal events as they happen; the worker
//! only decides whether a notification is due (it is, while hidden).

pub mod cache;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::Event;
use crate::notify::{Notification, NotificationBridge};
use crate::timer::Snapshot;

/// Messages from the foreground to the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    SkipWaiting,
    TabHidden,
    TabVisible,
    TimerStates { snapshot: Snapshot },
    TimerCompleted { event: Event },
}

/// Messages from the worker to the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageMessage {
    GetTimerStates,
}

pub struct BackgroundWorker {
    notifications: NotificationBridge,
    hidden: bool,
    activated: bool,
    last_states: Option<Snapshot>,
}

impl BackgroundWorker {
    pub fn new(mut notifications: NotificationBridge) -> Self {
        notifications.request_permission();
        Self {
            notifications,
            hidden: false,
            activated: false,
            last_states: None,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Most recent snapshot pushed while hidden.
    pub fn last_states(&self) -> Option<&Snapshot> {
        self.last_states.as_ref()
    }

    /// Process one message, returning the reply for the foreground if any.
    pub fn handle(&mut self, message: WorkerMessage) -> Option<PageMessage> {
        match message {
            WorkerMessage::SkipWaiting => {
                self.activated = true;
                None
            }
            WorkerMessage::TabHidden => {
                self.hidden = true;
                Some(PageMessage::GetTimerStates)
            }
            WorkerMessage::TabVisible => {
                self.hidden = false;
                None
            }
            WorkerMessage::TimerStates { snapshot } => {
                self.last_states = Some(snapshot);
                None
            }
            WorkerMessage::TimerCompleted { event } => {
                if self.hidden {
                    let notification = Notification::for_event(&event)
                        .unwrap_or_else(|| Notification::timer_complete(event.kind()));
                    let shown = self.notifications.send(notification);
                    debug!(kind = %event.kind(), shown, "background completion");
                }
                None
            }
        }
    }
}

/// Foreground side of a spawned [`BackgroundWorker`].
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<WorkerMessage>,
    task: JoinHandle<BackgroundWorker>,
}

impl WorkerHandle {
    /// Run `worker` on the current tokio runtime. The receiver yields the
    /// worker's requests to the foreground.
    pub fn spawn(mut worker: BackgroundWorker) -> (Self, mpsc::UnboundedReceiver<PageMessage>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<WorkerMessage>();
        let (page_tx, page_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            info!("background worker started");
            while let Some(message) = rx.recv().await {
                if let Some(reply) = worker.handle(message) {
                    if page_tx.send(reply).is_err() {
                        debug!("foreground gone, dropping worker reply");
                    }
                }
            }
            info!("background worker stopped");
            worker
        });

        (Self { tx, task }, page_rx)
    }

    /// Post a message. Returns `false` if the worker has stopped.
    pub fn post(&self, message: WorkerMessage) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Close the channel and wait for the worker to drain it.
    pub async fn shutdown(self) -> Option<BackgroundWorker> {
        drop(self.tx);
        self.task.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Permission, RecordingBackend};
    use crate::timer::TimerKind;
    use chrono::Utc;

    fn worker() -> (BackgroundWorker, RecordingBackend) {
        let backend = RecordingBackend::new(Permission::Granted);
        let bridge = NotificationBridge::new(Box::new(backend.clone()));
        (BackgroundWorker::new(bridge), backend)
    }

    fn completed(kind: TimerKind) -> WorkerMessage {
        WorkerMessage::TimerCompleted {
            event: Event::TimerCompleted {
                kind,
                at: Utc::now(),
            },
        }
    }

    #[test]
    fn notifies_only_while_hidden() {
        let (mut worker, backend) = worker();
        worker.handle(completed(TimerKind::Countdown));
        assert!(backend.shown().is_empty());

        assert_eq!(
            worker.handle(WorkerMessage::TabHidden),
            Some(PageMessage::GetTimerStates)
        );
        worker.handle(completed(TimerKind::Countdown));
        assert_eq!(backend.shown().len(), 1);

        worker.handle(WorkerMessage::TabVisible);
        worker.handle(completed(TimerKind::Egg));
        assert_eq!(backend.shown().len(), 1);
    }

    #[test]
    fn message_wire_format() {
        let json = serde_json::to_string(&WorkerMessage::SkipWaiting).unwrap();
        assert_eq!(json, r#"{"type":"SKIP_WAITING"}"#);
        let json = serde_json::to_string(&PageMessage::GetTimerStates).unwrap();
        assert_eq!(json, r#"{"type":"GET_TIMER_STATES"}"#);
    }

    #[tokio::test]
    async fn spawned_worker_replies_and_shuts_down() {
        let (worker, backend) = worker();
        let (handle, mut replies) = WorkerHandle::spawn(worker);
        assert!(handle.post(WorkerMessage::SkipWaiting));
        assert!(handle.post(WorkerMessage::TabHidden));
        assert_eq!(replies.recv().await, Some(PageMessage::GetTimerStates));
        assert!(handle.post(completed(TimerKind::Pomodoro)));

        let worker = handle.shutdown().await.unwrap();
        assert!(worker.is_activated());
        assert!(worker.is_hidden());
        assert_eq!(backend.shown().len(), 1);
    }
}
