use crate::core::{Project, SelectedSession, Selection, Session};

/// A session found in the project list together with its owner.
#[derive(Debug, Clone, Copy)]
pub struct SessionMatch<'a> {
    pub project: &'a Project,
    pub session: &'a Session,
}

impl SessionMatch<'_> {
    /// Selection this match routes to, with the provider tag attached.
    pub fn to_selection(&self) -> Selection {
        Selection {
            project: Some(self.project.clone()),
            session: Some(SelectedSession::claude(self.session.clone())),
        }
    }
}

/// Maps the session id carried by the route onto the loaded projects.
///
/// Session ids are assumed to be globally unique but nothing checks it. When
/// two projects carry the same id, the one listed first wins.
#[derive(Debug, Default)]
pub struct SessionRouter;

impl SessionRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn locate<'a>(
        &self,
        session_id: &str,
        projects: &'a [Project],
    ) -> Option<SessionMatch<'a>> {
        projects.iter().find_map(|project| {
            project
                .find_session(session_id)
                .map(|session| SessionMatch { project, session })
        })
    }

    /// Route `session_id` into `selection`. Returns the new selection when it
    /// differs from the current one; `None` covers both "already there" and
    /// "not loaded yet".
    pub fn route(
        &self,
        session_id: &str,
        projects: &[Project],
        selection: &Selection,
    ) -> Option<Selection> {
        let Some(found) = self.locate(session_id, projects) else {
            tracing::debug!("Session {} not in loaded projects yet", session_id);
            return None;
        };

        let routed = found.to_selection();
        if routed == *selection {
            None
        } else {
            tracing::debug!("Routed session {} to project {}", session_id, found.project.name);
            Some(routed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Provider;

    fn project(name: &str, sessions: &[&str]) -> Project {
        let mut project = Project::new(name, format!("/w/{}", name));
        project.sessions = sessions.iter().map(|id| Session::new(*id)).collect();
        project
    }

    #[test]
    fn test_locate_finds_owner() {
        let projects = vec![project("P0", &["a"]), project("P1", &["s1"])];
        let found = SessionRouter::new().locate("s1", &projects).unwrap();
        assert_eq!(found.project.name, "P1");
        assert_eq!(found.session.id, "s1");
    }

    #[test]
    fn test_duplicate_id_prefers_first_project() {
        let projects = vec![project("first", &["dup"]), project("second", &["dup"])];
        let found = SessionRouter::new().locate("dup", &projects).unwrap();
        assert_eq!(found.project.name, "first");
    }

    #[test]
    fn test_route_tags_provider() {
        let projects = vec![project("P1", &["s1"])];
        let selection = SessionRouter::new()
            .route("s1", &projects, &Selection::default())
            .unwrap();

        assert_eq!(selection.project_name(), Some("P1"));
        let session = selection.session.unwrap();
        assert_eq!(session.id(), "s1");
        assert_eq!(session.provider, Some(Provider::Claude));
    }

    #[test]
    fn test_route_is_none_when_already_selected() {
        let projects = vec![project("P1", &["s1"])];
        let router = SessionRouter::new();
        let current = router.route("s1", &projects, &Selection::default()).unwrap();
        assert!(router.route("s1", &projects, &current).is_none());
    }

    #[test]
    fn test_route_missing_session() {
        let projects = vec![project("P1", &["s1"])];
        assert!(SessionRouter::new()
            .route("gone", &projects, &Selection::default())
            .is_none());
    }
}
