use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;

/// Phase value the server uses to mark a finished load.
pub const PHASE_COMPLETE: &str = "complete";

/// Server-originated push events the workspace reacts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PushMessage {
    #[serde(rename = "loading_progress")]
    LoadingProgress(ProgressSnapshot),
    #[serde(rename = "projects_updated")]
    ProjectsUpdated,
    #[serde(rename = "projects_refresh")]
    ProjectsRefresh,
    /// Any discriminator this client doesn't know about.
    #[serde(other)]
    Unknown,
}

impl PushMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            PushMessage::LoadingProgress(_) => "loading_progress",
            PushMessage::ProjectsUpdated => "projects_updated",
            PushMessage::ProjectsRefresh => "projects_refresh",
            PushMessage::Unknown => "unknown",
        }
    }
}

/// Latest loading progress reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub phase: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ProgressSnapshot {
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            payload: Map::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == PHASE_COMPLETE
    }
}

/// One delivery through the push slot. `seq` identifies the delivery, so
/// observing the same envelope twice is detectable.
#[derive(Debug, Clone)]
pub struct PushEnvelope {
    pub seq: u64,
    pub message: Arc<PushMessage>,
}

/// Writer half of the single-slot push channel. A new message overwrites
/// whatever the reader hasn't looked at yet.
#[derive(Debug)]
pub struct PushSlot {
    tx: watch::Sender<Option<PushEnvelope>>,
    next_seq: u64,
}

pub type PushReceiver = watch::Receiver<Option<PushEnvelope>>;

impl PushSlot {
    pub fn new() -> (Self, PushReceiver) {
        let (tx, rx) = watch::channel(None);
        (Self { tx, next_seq: 1 }, rx)
    }

    /// Publish a message; returns false once every reader has gone away.
    pub fn publish(&mut self, message: PushMessage) -> bool {
        let envelope = PushEnvelope {
            seq: self.next_seq,
            message: Arc::new(message),
        };
        self.next_seq += 1;
        self.tx.send(Some(envelope)).is_ok()
    }

    /// Decode a raw JSON text frame and publish it.
    pub fn publish_json(&mut self, text: &str) -> anyhow::Result<bool> {
        let message: PushMessage = serde_json::from_str(text)?;
        Ok(self.publish(message))
    }

    pub fn subscribe(&self) -> PushReceiver {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_loading_progress_keeps_payload() {
        let msg: PushMessage = serde_json::from_str(
            r#"{"type":"loading_progress","phase":"scanning","current":3,"total":9}"#,
        )
        .unwrap();

        match msg {
            PushMessage::LoadingProgress(snapshot) => {
                assert_eq!(snapshot.phase, "scanning");
                assert_eq!(snapshot.payload["current"], 3);
                assert!(!snapshot.is_complete());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_refresh_messages() {
        let updated: PushMessage = serde_json::from_str(r#"{"type":"projects_updated"}"#).unwrap();
        let refresh: PushMessage = serde_json::from_str(r#"{"type":"projects_refresh"}"#).unwrap();
        assert_eq!(updated, PushMessage::ProjectsUpdated);
        assert_eq!(refresh, PushMessage::ProjectsRefresh);
    }

    #[test]
    fn test_unknown_type_decodes_as_unknown() {
        let msg: PushMessage =
            serde_json::from_str(r#"{"type":"session-aborted","sessionId":"x"}"#).unwrap();
        assert_eq!(msg, PushMessage::Unknown);
    }

    #[test]
    fn test_slot_keeps_only_latest() {
        let (mut slot, rx) = PushSlot::new();
        assert!(slot.publish(PushMessage::ProjectsUpdated));
        assert!(slot.publish(PushMessage::ProjectsRefresh));

        let latest = rx.borrow().clone().unwrap();
        assert_eq!(latest.seq, 2);
        assert_eq!(*latest.message, PushMessage::ProjectsRefresh);
    }
}
