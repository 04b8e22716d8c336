use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep, Sleep};

/// One-shot timer with at most one pending deadline.
///
/// Arming while a deadline is pending drops the old one first, so a stale
/// deadline can never fire. Dropping the debouncer cancels it.
#[derive(Debug)]
pub(crate) struct ProgressDebouncer {
    delay: Duration,
    timer: Option<Pin<Box<Sleep>>>,
}

impl ProgressDebouncer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self { delay, timer: None }
    }

    pub(crate) fn arm(&mut self) {
        self.timer = Some(Box::pin(sleep(self.delay)));
    }

    /// Returns whether a pending deadline was dropped.
    pub(crate) fn cancel(&mut self) -> bool {
        self.timer.take().is_some()
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Resolves when the pending deadline passes and disarms. Never resolves
    /// while disarmed. Dropping this future before it resolves keeps the
    /// deadline pending.
    pub(crate) async fn expired(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.as_mut().await;
                self.timer = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
