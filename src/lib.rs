// texmux library
// Keeps the Overleaf-embedded assistant workspace in sync with its server

pub mod cli;
pub mod client;
pub mod core;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use client::http::{WorkspaceApi, WorkspaceClient};
pub use crate::core::{Config, LaunchContext, Project, Session};
pub use sync::{RefreshHook, SyncEngine, SyncHandle, WorkspaceView};

// Error handling
pub use anyhow::{Error, Result};
