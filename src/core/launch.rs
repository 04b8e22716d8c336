use anyhow::Result;
use url::Url;

/// Identifiers handed over by the hosting editor in the launch URL.
///
/// Captured exactly once when the client starts. Later navigation rewrites the
/// route and drops the query string, so nothing re-reads the URL afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchContext {
    pub external_project: Option<String>,
    pub external_user: Option<String>,
    pub initial_route: Route,
}

impl LaunchContext {
    pub fn capture(launch_url: &str, basename: &str) -> Result<Self> {
        let url = Url::parse(launch_url)?;
        let mut context = LaunchContext {
            initial_route: Route::parse(url.path(), basename),
            ..Default::default()
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "project" if !value.is_empty() => {
                    context.external_project.get_or_insert_with(|| value.into_owned());
                }
                "user" if !value.is_empty() => {
                    context.external_user.get_or_insert_with(|| value.into_owned());
                }
                _ => {}
            }
        }

        tracing::debug!(
            "Captured launch context: project={:?} user={:?} route={:?}",
            context.external_project,
            context.external_user,
            context.initial_route
        );
        Ok(context)
    }

    /// Running embedded for a specific editor project.
    pub fn is_external_mode(&self) -> bool {
        self.external_project.is_some()
    }
}

/// Client-side route of the workspace page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Root,
    Session(String),
}

impl Route {
    /// Parse a path such as `/base/session/abc`. Anything unrecognised is `Root`.
    pub fn parse(path: &str, basename: &str) -> Self {
        let base = basename.trim_end_matches('/');
        let relative = path.strip_prefix(base).unwrap_or(path);
        let mut segments = relative.split('/').filter(|s| !s.is_empty());

        match (segments.next(), segments.next(), segments.next()) {
            (Some("session"), Some(id), None) => Route::Session(id.to_string()),
            _ => Route::Root,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            Route::Session(id) => Some(id),
            Route::Root => None,
        }
    }
}
