use std::time::Duration;

use super::debounce::ProgressDebouncer;
use crate::core::{ProgressSnapshot, PushEnvelope, PushMessage};

/// What handling one push envelope asks of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Envelope was already handled.
    Duplicate,
    Ignored,
    ProgressUpdated,
    RefreshRequested,
}

/// Interprets the latest push message.
///
/// Owns the transient loading-progress snapshot and the timer that hides it
/// after a completed load.
#[derive(Debug)]
pub struct PushChannelDispatcher {
    last_seq: Option<u64>,
    progress: Option<ProgressSnapshot>,
    debouncer: ProgressDebouncer,
}

impl PushChannelDispatcher {
    pub fn new(hide_delay: Duration) -> Self {
        Self {
            last_seq: None,
            progress: None,
            debouncer: ProgressDebouncer::new(hide_delay),
        }
    }

    pub fn dispatch(&mut self, envelope: &PushEnvelope) -> Dispatch {
        if self.last_seq == Some(envelope.seq) {
            return Dispatch::Duplicate;
        }
        self.last_seq = Some(envelope.seq);

        match envelope.message.as_ref() {
            PushMessage::LoadingProgress(snapshot) => {
                self.debouncer.cancel();
                if snapshot.is_complete() {
                    self.debouncer.arm();
                }
                tracing::trace!("Loading progress: {}", snapshot.phase);
                self.progress = Some(snapshot.clone());
                Dispatch::ProgressUpdated
            }
            PushMessage::ProjectsUpdated | PushMessage::ProjectsRefresh => {
                tracing::debug!("Push {} requests a project refresh", envelope.message.kind());
                Dispatch::RefreshRequested
            }
            PushMessage::Unknown => Dispatch::Ignored,
        }
    }

    pub fn progress(&self) -> Option<&ProgressSnapshot> {
        self.progress.as_ref()
    }

    pub fn has_pending_hide(&self) -> bool {
        self.debouncer.is_armed()
    }

    /// Waits out the hide timer, then clears the snapshot. Pends forever when
    /// no hide is scheduled; check [`Self::has_pending_hide`] first.
    pub async fn hide_elapsed(&mut self) {
        self.debouncer.expired().await;
        tracing::trace!("Hiding completed loading progress");
        self.progress = None;
    }

    /// Cancel the pending hide, if any. Called when the owner goes away.
    pub fn teardown(&mut self) {
        if self.debouncer.cancel() {
            tracing::debug!("Cancelled pending progress hide on teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PushSlot;
    use tokio::time::Instant;

    const HIDE_DELAY: Duration = Duration::from_millis(500);

    fn loading(phase: &str) -> PushMessage {
        PushMessage::LoadingProgress(ProgressSnapshot::new(phase))
    }

    fn latest(slot: &mut PushSlot, message: PushMessage) -> PushEnvelope {
        let rx = slot.subscribe();
        slot.publish(message);
        let envelope = rx.borrow().clone();
        envelope.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_then_complete_hides_once_from_complete_time() {
        let (mut slot, _rx) = PushSlot::new();
        let mut dispatcher = PushChannelDispatcher::new(HIDE_DELAY);
        let start = Instant::now();

        let running = latest(&mut slot, loading("scanning"));
        assert_eq!(dispatcher.dispatch(&running), Dispatch::ProgressUpdated);
        assert!(!dispatcher.has_pending_hide());

        tokio::time::advance(Duration::from_millis(200)).await;
        let complete = latest(&mut slot, loading("complete"));
        dispatcher.dispatch(&complete);
        assert_eq!(dispatcher.progress().map(|p| p.phase.as_str()), Some("complete"));

        dispatcher.hide_elapsed().await;

        assert!(start.elapsed() >= Duration::from_millis(700));
        assert!(start.elapsed() < Duration::from_millis(710));
        assert!(dispatcher.progress().is_none());
        assert!(!dispatcher.has_pending_hide());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_progress_cancels_pending_hide() {
        let (mut slot, _rx) = PushSlot::new();
        let mut dispatcher = PushChannelDispatcher::new(HIDE_DELAY);

        let complete = latest(&mut slot, loading("complete"));
        dispatcher.dispatch(&complete);
        assert!(dispatcher.has_pending_hide());

        tokio::time::advance(Duration::from_millis(100)).await;
        let restarted = latest(&mut slot, loading("loading"));
        dispatcher.dispatch(&restarted);

        assert!(!dispatcher.has_pending_hide());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(dispatcher.progress().map(|p| p.phase.as_str()), Some("loading"));
    }

    #[test]
    fn test_replayed_envelope_is_noop() {
        let (mut slot, _rx) = PushSlot::new();
        let mut dispatcher = PushChannelDispatcher::new(HIDE_DELAY);
        let refresh = latest(&mut slot, PushMessage::ProjectsUpdated);

        assert_eq!(dispatcher.dispatch(&refresh), Dispatch::RefreshRequested);
        assert_eq!(dispatcher.dispatch(&refresh), Dispatch::Duplicate);
    }

    #[test]
    fn test_refresh_and_unknown_messages() {
        let (mut slot, _rx) = PushSlot::new();
        let mut dispatcher = PushChannelDispatcher::new(HIDE_DELAY);

        let refresh = latest(&mut slot, PushMessage::ProjectsRefresh);
        assert_eq!(dispatcher.dispatch(&refresh), Dispatch::RefreshRequested);

        let unknown = latest(&mut slot, PushMessage::Unknown);
        assert_eq!(dispatcher.dispatch(&unknown), Dispatch::Ignored);
        assert!(dispatcher.progress().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_timer() {
        let (mut slot, _rx) = PushSlot::new();
        let mut dispatcher = PushChannelDispatcher::new(HIDE_DELAY);
        let complete = latest(&mut slot, loading("complete"));
        dispatcher.dispatch(&complete);

        dispatcher.teardown();

        assert!(!dispatcher.has_pending_hide());
    }
}
