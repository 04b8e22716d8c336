pub mod config;
pub mod launch;
pub mod session;
pub mod websocket;

pub use config::Config;
pub use launch::{LaunchContext, Route};
pub use session::{
    ActiveView, Project, Provider, SelectedSession, Selection, Session, SessionMeta,
};
pub use websocket::{ProgressSnapshot, PushEnvelope, PushMessage, PushReceiver, PushSlot};
