use anyhow::Result;

use crate::client::WorkspaceApi;
use crate::core::Project;

/// Progress of the one-time external id resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Resolving,
    Resolved,
    Failed,
}

/// Next thing to do after the server resolved the external id to a path.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveStep {
    /// An existing project matches; select it.
    Select(Project),
    /// Nothing matches; ask the server to create a workspace for the path.
    Provision(String),
    /// Stop without touching the selection.
    Abandon,
}

/// What to do once the create-workspace call has answered.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionStep {
    /// The workspace exists now and nothing is selected; refresh and select it.
    Select(Project),
    /// The workspace exists but a selection was made meanwhile; only refresh.
    Refresh,
    Abandon,
}

/// Turns the editor's external project id into a tracked workspace.
///
/// Runs at most once per process, except that a transport error on the path
/// lookup puts it back to `Unresolved` so the next successful list fetch tries
/// again. Every step re-checks the selection because one may have been made
/// while the previous network call was outstanding.
#[derive(Debug)]
pub struct WorkspaceResolver {
    external_id: Option<String>,
    state: ResolutionState,
}

impl WorkspaceResolver {
    pub fn new(external_id: Option<String>) -> Self {
        Self {
            external_id,
            state: ResolutionState::Unresolved,
        }
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    /// Claim the single attempt. Returns the id to send to the server, or
    /// `None` when resolution must not (or need not) run now.
    pub fn try_begin(&mut self, has_selection: bool, projects_loaded: bool) -> Option<String> {
        if self.state != ResolutionState::Unresolved || has_selection || !projects_loaded {
            return None;
        }
        let external_id = self.external_id.clone()?;

        tracing::info!("Resolving external project {}", external_id);
        self.state = ResolutionState::Resolving;
        Some(external_id)
    }

    pub fn on_path_resolved(
        &mut self,
        result: Result<Option<String>>,
        projects: &[Project],
        has_selection: bool,
    ) -> ResolveStep {
        if self.state != ResolutionState::Resolving {
            return ResolveStep::Abandon;
        }

        let resolved_path = match result {
            Ok(Some(path)) => path,
            Ok(None) => {
                tracing::debug!("External project {:?} is not resolvable", self.external_id);
                self.state = ResolutionState::Failed;
                return ResolveStep::Abandon;
            }
            Err(e) => {
                tracing::warn!("Could not resolve external project, will retry: {}", e);
                self.state = ResolutionState::Unresolved;
                return ResolveStep::Abandon;
            }
        };

        if has_selection {
            tracing::debug!("Selection made while resolving, dropping resolution result");
            self.state = ResolutionState::Resolved;
            return ResolveStep::Abandon;
        }

        match projects.iter().find(|p| p.matches_path(&resolved_path)) {
            Some(project) => {
                tracing::info!("External project maps to existing workspace {}", project.name);
                self.state = ResolutionState::Resolved;
                ResolveStep::Select(project.clone())
            }
            None => {
                tracing::info!("No workspace for {}, provisioning one", resolved_path);
                ResolveStep::Provision(resolved_path)
            }
        }
    }

    pub fn on_workspace_created(
        &mut self,
        result: Result<Project>,
        has_selection: bool,
    ) -> ProvisionStep {
        if self.state != ResolutionState::Resolving {
            return ProvisionStep::Abandon;
        }

        match result {
            Ok(project) if has_selection => {
                tracing::debug!(
                    "Workspace {} created but a selection already exists",
                    project.name
                );
                self.state = ResolutionState::Resolved;
                ProvisionStep::Refresh
            }
            Ok(project) => {
                self.state = ResolutionState::Resolved;
                ProvisionStep::Select(project)
            }
            Err(e) => {
                tracing::warn!("Workspace provisioning failed: {}", e);
                self.state = ResolutionState::Failed;
                ProvisionStep::Abandon
            }
        }
    }

    /// Drive the whole resolution inline against `api`. Used by one-shot
    /// callers that don't run an engine loop; the caller refreshes its own
    /// list afterwards if a workspace was created.
    pub async fn resolve<A: WorkspaceApi>(
        &mut self,
        api: &A,
        projects: &[Project],
    ) -> Option<Project> {
        let external_id = self.try_begin(false, true)?;

        let result = api.resolve_external_id(&external_id).await;
        match self.on_path_resolved(result, projects, false) {
            ResolveStep::Select(project) => Some(project),
            ResolveStep::Provision(path) => {
                let created = api.create_workspace(&path).await;
                match self.on_workspace_created(created, false) {
                    ProvisionStep::Select(project) => Some(project),
                    ProvisionStep::Refresh | ProvisionStep::Abandon => None,
                }
            }
            ResolveStep::Abandon => None,
        }
    }
}
