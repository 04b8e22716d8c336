use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tracked workspace directory and the sessions recorded against it.
///
/// Only the fields the sync engine reasons about are typed; anything else the
/// server sends is carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub full_path: Option<String>,
    /// Legacy alias of `full_path` still emitted by older servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub session_meta: SessionMeta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    pub fn new(name: impl Into<String>, full_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            full_path: Some(full_path.into()),
            path: None,
            sessions: Vec::new(),
            session_meta: SessionMeta::default(),
            extra: Map::new(),
        }
    }

    /// True when either the canonical or the legacy path equals `path`.
    pub fn matches_path(&self, path: &str) -> bool {
        self.full_path.as_deref() == Some(path) || self.path.as_deref() == Some(path)
    }

    pub fn find_session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Compares the fields a consumer renders from. Opaque `extra` fields are
    /// deliberately left out so server-side bookkeeping doesn't force a replace.
    pub fn same_content(&self, other: &Project) -> bool {
        self.name == other.name
            && self.display_name == other.display_name
            && self.full_path == other.full_path
            && self.session_meta == other.session_meta
            && self.sessions == other.sessions
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    #[serde(default)]
    pub total: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Map::new(),
        }
    }
}

/// Backend that produced a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Claude,
}

/// A session as held by the current selection, tagged with its provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedSession {
    #[serde(flatten)]
    pub session: Session,
    #[serde(rename = "__provider", default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
}

impl SelectedSession {
    pub fn claude(session: Session) -> Self {
        Self {
            session,
            provider: Some(Provider::Claude),
        }
    }

    pub fn id(&self) -> &str {
        &self.session.id
    }
}

/// Which surface the workspace shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    #[default]
    Terminal,
    Git,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub project: Option<Project>,
    pub session: Option<SelectedSession>,
}

impl Selection {
    pub fn has_project(&self) -> bool {
        self.project.is_some()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id())
    }

    pub fn clear(&mut self) {
        self.project = None;
        self.session = None;
    }
}
