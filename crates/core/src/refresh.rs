//! Coalescing refresh scheduler feeding the UI task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cheap handle used by producers to request a rebuild. Safe to call from
/// any thread; requests made while one is pending collapse into it.
#[derive(Clone, Debug)]
pub struct RefreshTrigger {
    notify: Arc<Notify>,
}

impl RefreshTrigger {
    pub fn new(notify: Arc<Notify>) -> Self {
        Self { notify }
    }

    pub fn ping(&self) {
        self.notify.notify_one();
    }
}

/// Forwards refresh requests to the UI channel at most once per interval.
///
/// The first request after a quiet period is delivered immediately. Requests
/// arriving during the interval are coalesced into one trailing delivery.
/// Once the token is cancelled (or the receiver is gone) nothing more is sent.
pub struct ThrottledRefresher {
    trigger: RefreshTrigger,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ThrottledRefresher {
    pub fn spawn<E>(
        interval: Duration,
        tx: mpsc::Sender<E>,
        event: E,
        cancel: CancellationToken,
    ) -> Self
    where
        E: Clone + Send + 'static,
    {
        let notify = Arc::new(Notify::new());
        let trigger = RefreshTrigger::new(Arc::clone(&notify));
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = notify.notified() => {}
                }
                if tx.send(event.clone()).await.is_err() {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("refresh scheduler stopped");
        });

        Self {
            trigger,
            cancel,
            task,
        }
    }

    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger.clone()
    }

    pub fn ping(&self) {
        self.trigger.ping();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ThrottledRefresher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
