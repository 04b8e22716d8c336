pub mod http;
pub mod push;

pub use http::{WorkspaceApi, WorkspaceClient};
pub use push::PushListener;
