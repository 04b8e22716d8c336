use anyhow::{anyhow, Result};
use std::sync::OnceLock;
use tokio::sync::mpsc;

use super::engine::EngineCommand;

/// Entry point for forcing a project refresh from code that has no handle on
/// the engine (terminal shell, git panel, ...).
///
/// Created empty and shared by `Arc`; the engine installs itself exactly once
/// when it is constructed. Triggers before installation are dropped.
#[derive(Debug, Default)]
pub struct RefreshHook {
    tx: OnceLock<mpsc::UnboundedSender<EngineCommand>>,
}

impl RefreshHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn install(&self, tx: mpsc::UnboundedSender<EngineCommand>) -> Result<()> {
        self.tx
            .set(tx)
            .map_err(|_| anyhow!("Refresh hook is already bound to an engine"))
    }

    pub fn is_installed(&self) -> bool {
        self.tx.get().is_some()
    }

    /// Request a background refresh. Returns false when no engine is
    /// listening.
    pub fn trigger(&self) -> bool {
        self.send(false)
    }

    /// Request a refresh that shows the loading indicator.
    pub fn trigger_with_loading(&self) -> bool {
        self.send(true)
    }

    fn send(&self, force_loading: bool) -> bool {
        match self.tx.get() {
            Some(tx) => tx.send(EngineCommand::Refresh { force_loading }).is_ok(),
            None => {
                tracing::debug!("Refresh requested before the engine started");
                false
            }
        }
    }
}
