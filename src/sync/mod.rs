//! Keeps the local view of projects and sessions in step with the server.

mod debounce;
pub mod dispatcher;
pub mod engine;
pub mod hook;
pub mod resolver;
pub mod router;
pub mod store;

pub use dispatcher::{Dispatch, PushChannelDispatcher};
pub use engine::{EngineCommand, SyncEngine, SyncHandle, WorkspaceView};
pub use hook::RefreshHook;
pub use resolver::{ProvisionStep, ResolutionState, ResolveStep, WorkspaceResolver};
pub use router::{SessionMatch, SessionRouter};
pub use store::{ProjectStore, RefreshOutcome};
