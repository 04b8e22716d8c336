use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::Project;

/// What a completed fetch did to the cached list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Replaced,
    Unchanged,
    Failed,
}

/// Cache of the canonical project list.
///
/// The list sits behind an `Arc` so consumers can tell "nothing changed" by
/// pointer identity: a refresh that returns the same content keeps the old
/// allocation.
#[derive(Debug)]
pub struct ProjectStore {
    projects: Arc<Vec<Project>>,
    loading: bool,
    loaded: bool,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore {
    /// Starts in the loading state; the first completed fetch clears it.
    pub fn new() -> Self {
        Self {
            projects: Arc::new(Vec::new()),
            loading: true,
            loaded: false,
        }
    }

    pub fn projects(&self) -> &Arc<Vec<Project>> {
        &self.projects
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// At least one fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn begin_refresh(&mut self, force_loading_indicator: bool) {
        if force_loading_indicator {
            self.loading = true;
        }
    }

    /// Fold a finished fetch into the cache. Errors leave the list untouched.
    pub fn complete_refresh(&mut self, result: Result<Vec<Project>>) -> RefreshOutcome {
        self.loading = false;
        match result {
            Ok(fresh) => {
                self.loaded = true;
                self.apply_snapshot(fresh)
            }
            Err(e) => {
                tracing::error!("Error fetching projects: {}", e);
                RefreshOutcome::Failed
            }
        }
    }

    /// Replace the list only when `fresh` differs structurally.
    pub fn apply_snapshot(&mut self, fresh: Vec<Project>) -> RefreshOutcome {
        if has_structural_changes(&self.projects, &fresh) {
            tracing::debug!(
                "Project list changed ({} -> {} projects)",
                self.projects.len(),
                fresh.len()
            );
            self.projects = Arc::new(fresh);
            RefreshOutcome::Replaced
        } else {
            tracing::trace!("Project list unchanged, keeping current snapshot");
            RefreshOutcome::Unchanged
        }
    }

    /// Drop `session_id` from every project holding it. Returns whether
    /// anything was removed.
    pub fn apply_optimistic_session_delete(&mut self, session_id: &str) -> bool {
        let affected = self
            .projects
            .iter()
            .any(|p| p.sessions.iter().any(|s| s.id == session_id));
        if !affected {
            return false;
        }

        let projects = Arc::make_mut(&mut self.projects);
        for project in projects.iter_mut() {
            let before = project.sessions.len();
            project.sessions.retain(|s| s.id != session_id);
            if project.sessions.len() != before {
                project.session_meta.total = project.session_meta.total.saturating_sub(1);
            }
        }
        true
    }

    pub fn apply_optimistic_project_delete(&mut self, name: &str) -> bool {
        if self.find(name).is_none() {
            return false;
        }
        Arc::make_mut(&mut self.projects).retain(|p| p.name != name);
        true
    }
}

/// Compare two project lists keyed by project name.
///
/// Order is part of the comparison since consumers render the list as given,
/// but matching happens by name so a moved project is reported as moved rather
/// than as two unrelated edits.
pub fn has_structural_changes(prev: &[Project], fresh: &[Project]) -> bool {
    if prev.len() != fresh.len() {
        return true;
    }

    let by_name: HashMap<&str, (usize, &Project)> = prev
        .iter()
        .enumerate()
        .map(|(index, project)| (project.name.as_str(), (index, project)))
        .collect();

    fresh.iter().enumerate().any(|(index, project)| {
        match by_name.get(project.name.as_str()) {
            Some((old_index, old)) => *old_index != index || !old.same_content(project),
            None => true,
        }
    })
}
