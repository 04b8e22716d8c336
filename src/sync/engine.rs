use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::dispatcher::{Dispatch, PushChannelDispatcher};
use super::hook::RefreshHook;
use super::resolver::{ProvisionStep, ResolutionState, ResolveStep, WorkspaceResolver};
use super::router::SessionRouter;
use super::store::{ProjectStore, RefreshOutcome};
use crate::client::WorkspaceApi;
use crate::core::{
    ActiveView, Config, LaunchContext, ProgressSnapshot, Project, PushEnvelope, PushReceiver,
    Route, SelectedSession, Selection,
};

/// Requests the engine accepts from the outside
#[derive(Debug)]
pub enum EngineCommand {
    Refresh { force_loading: bool },
    /// Refresh, then swap the selected project/session for their refreshed
    /// records.
    SidebarRefresh,
    SelectProject(String),
    SelectSession { project: String, session_id: String },
    NewSession(String),
    SetActiveView(ActiveView),
    Navigate(Route),
    DeleteSession(String),
    DeleteProject(String),
    Shutdown,
}

/// Results of network calls, fed back into the loop.
enum Completion {
    Fetched {
        result: Result<Vec<Project>>,
        reconcile: bool,
    },
    PathResolved(Result<Option<String>>),
    WorkspaceCreated(Result<Project>),
}

/// Read-only snapshot of the workspace published after every change.
#[derive(Debug, Clone)]
pub struct WorkspaceView {
    pub projects: Arc<Vec<Project>>,
    pub selection: Selection,
    pub active_view: ActiveView,
    pub route: Route,
    pub is_loading: bool,
    pub loading_progress: Option<ProgressSnapshot>,
    pub external_mode: bool,
    pub resolution: ResolutionState,
}

impl WorkspaceView {
    /// Projects to list in the sidebar. When embedded for one editor project,
    /// only workspaces at the selected project's path are shown.
    pub fn display_projects(&self) -> Vec<&Project> {
        let selected_path = match (&self.selection.project, self.external_mode) {
            (Some(project), true) => Some(project.full_path.as_deref()),
            _ => None,
        };

        self.projects
            .iter()
            .filter(|p| match selected_path {
                Some(path) => p.full_path.as_deref() == path,
                None => true,
            })
            .collect()
    }

    fn same_as(&self, other: &WorkspaceView) -> bool {
        Arc::ptr_eq(&self.projects, &other.projects)
            && self.selection == other.selection
            && self.active_view == other.active_view
            && self.route == other.route
            && self.is_loading == other.is_loading
            && self.loading_progress == other.loading_progress
            && self.external_mode == other.external_mode
            && self.resolution == other.resolution
    }
}

/// Cloneable handle used to drive and observe a running [`SyncEngine`]
#[derive(Clone)]
pub struct SyncHandle {
    command_tx: mpsc::UnboundedSender<EngineCommand>,
    view_rx: watch::Receiver<WorkspaceView>,
}

impl SyncHandle {
    fn send(&self, command: EngineCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| anyhow!("Sync engine has shut down"))
    }

    pub fn refresh(&self, force_loading: bool) -> Result<()> {
        self.send(EngineCommand::Refresh { force_loading })
    }

    pub fn sidebar_refresh(&self) -> Result<()> {
        self.send(EngineCommand::SidebarRefresh)
    }

    pub fn select_project(&self, name: impl Into<String>) -> Result<()> {
        self.send(EngineCommand::SelectProject(name.into()))
    }

    pub fn select_session(
        &self,
        project: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Result<()> {
        self.send(EngineCommand::SelectSession {
            project: project.into(),
            session_id: session_id.into(),
        })
    }

    pub fn new_session(&self, project: impl Into<String>) -> Result<()> {
        self.send(EngineCommand::NewSession(project.into()))
    }

    pub fn set_active_view(&self, view: ActiveView) -> Result<()> {
        self.send(EngineCommand::SetActiveView(view))
    }

    pub fn navigate(&self, route: Route) -> Result<()> {
        self.send(EngineCommand::Navigate(route))
    }

    pub fn delete_session(&self, session_id: impl Into<String>) -> Result<()> {
        self.send(EngineCommand::DeleteSession(session_id.into()))
    }

    pub fn delete_project(&self, name: impl Into<String>) -> Result<()> {
        self.send(EngineCommand::DeleteProject(name.into()))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(EngineCommand::Shutdown)
    }

    /// Current snapshot.
    pub fn view(&self) -> WorkspaceView {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkspaceView> {
        self.view_rx.clone()
    }
}

/// The workspace event loop.
///
/// Owns the project store, selection, resolver, router and push dispatcher.
/// All state changes happen on this one task; network calls run as futures
/// polled by the loop and only report back through [`Completion`]s, so
/// nothing else ever touches the state.
///
/// Refreshes may overlap. Whichever fetch *completes* last decides the list,
/// even if it was started first.
pub struct SyncEngine<A: WorkspaceApi> {
    api: Arc<A>,
    store: ProjectStore,
    resolver: WorkspaceResolver,
    dispatcher: PushChannelDispatcher,
    router: SessionRouter,
    selection: Selection,
    active_view: ActiveView,
    route: Route,
    external_mode: bool,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
    push_rx: Option<PushReceiver>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    view_tx: watch::Sender<WorkspaceView>,
}

impl<A: WorkspaceApi> SyncEngine<A> {
    pub fn new(
        api: Arc<A>,
        config: &Config,
        launch: LaunchContext,
        push_rx: Option<PushReceiver>,
        hook: &RefreshHook,
    ) -> (Self, SyncHandle) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        if let Err(e) = hook.install(command_tx.clone()) {
            tracing::warn!("{}", e);
        }

        let store = ProjectStore::new();
        let resolver = WorkspaceResolver::new(launch.external_project.clone());
        let external_mode = launch.is_external_mode();

        let initial_view = WorkspaceView {
            projects: Arc::clone(store.projects()),
            selection: Selection::default(),
            active_view: ActiveView::default(),
            route: launch.initial_route.clone(),
            is_loading: store.is_loading(),
            loading_progress: None,
            external_mode,
            resolution: resolver.state(),
        };
        let (view_tx, view_rx) = watch::channel(initial_view);

        let engine = Self {
            api,
            store,
            resolver,
            dispatcher: PushChannelDispatcher::new(config.progress_hide_delay()),
            router: SessionRouter::new(),
            selection: Selection::default(),
            active_view: ActiveView::default(),
            route: launch.initial_route,
            external_mode,
            commands,
            push_rx,
            in_flight: FuturesUnordered::new(),
            view_tx,
        };

        (engine, SyncHandle { command_tx, view_rx })
    }

    /// Build the engine and run it on its own task.
    pub fn spawn(
        api: Arc<A>,
        config: &Config,
        launch: LaunchContext,
        push_rx: Option<PushReceiver>,
        hook: &RefreshHook,
    ) -> (SyncHandle, JoinHandle<()>) {
        let (engine, handle) = Self::new(api, config, launch, push_rx, hook);
        let task = tokio::spawn(engine.run());
        (handle, task)
    }

    pub async fn run(mut self) {
        tracing::info!("Sync engine started");
        self.start_fetch(true, false);
        self.publish();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.handle_completion(completion);
                }
                push = next_push(&mut self.push_rx), if self.push_rx.is_some() => match push {
                    Some(envelope) => self.handle_push(&envelope),
                    None => {
                        tracing::info!("Push channel closed");
                        self.push_rx = None;
                    }
                },
                _ = self.dispatcher.hide_elapsed(), if self.dispatcher.has_pending_hide() => {}
            }
            self.publish();
        }

        self.dispatcher.teardown();
        tracing::info!("Sync engine stopped");
    }

    fn handle_command(&mut self, command: EngineCommand) {
        tracing::debug!("Engine command: {:?}", command);
        match command {
            EngineCommand::Refresh { force_loading } => self.start_fetch(force_loading, false),
            EngineCommand::SidebarRefresh => self.start_fetch(false, true),
            EngineCommand::SelectProject(name) => {
                let Some(project) = self.store.find(&name).cloned() else {
                    tracing::debug!("Cannot select unknown project {}", name);
                    return;
                };
                self.selection.project = Some(project);
                self.selection.session = None;
                self.route = Route::Root;
            }
            EngineCommand::SelectSession { project, session_id } => {
                let Some(owner) = self.store.find(&project) else {
                    tracing::debug!("Cannot select session in unknown project {}", project);
                    return;
                };
                let Some(session) = owner.find_session(&session_id) else {
                    tracing::debug!("Session {} not found in project {}", session_id, project);
                    return;
                };
                self.selection.session = Some(SelectedSession::claude(session.clone()));
                self.selection.project = Some(owner.clone());
                if self.active_view != ActiveView::Git {
                    self.active_view = ActiveView::Terminal;
                }
                self.route = Route::Session(session_id);
            }
            EngineCommand::NewSession(name) => {
                let Some(project) = self.store.find(&name).cloned() else {
                    tracing::debug!("Cannot start session in unknown project {}", name);
                    return;
                };
                self.selection.project = Some(project);
                self.selection.session = None;
                self.active_view = ActiveView::Terminal;
                self.route = Route::Root;
            }
            EngineCommand::SetActiveView(view) => self.active_view = view,
            EngineCommand::Navigate(route) => {
                self.route = route;
                self.apply_route();
            }
            EngineCommand::DeleteSession(session_id) => {
                if self.selection.session_id() == Some(session_id.as_str()) {
                    self.selection.session = None;
                    self.route = Route::Root;
                }
                if self.store.apply_optimistic_session_delete(&session_id) {
                    self.on_projects_changed();
                }
            }
            EngineCommand::DeleteProject(name) => {
                if self.selection.project_name() == Some(name.as_str()) {
                    self.selection.clear();
                    self.route = Route::Root;
                }
                if self.store.apply_optimistic_project_delete(&name) {
                    self.on_projects_changed();
                }
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Fetched { result, reconcile } => {
                let outcome = self.store.complete_refresh(result);
                if outcome == RefreshOutcome::Failed {
                    return;
                }
                if reconcile {
                    self.reconcile_selection();
                }
                if outcome == RefreshOutcome::Replaced {
                    self.on_projects_changed();
                } else {
                    self.maybe_start_resolution();
                }
            }
            Completion::PathResolved(result) => {
                let step = self.resolver.on_path_resolved(
                    result,
                    self.store.projects(),
                    self.selection.has_project(),
                );
                match step {
                    ResolveStep::Select(project) => self.select_resolved(project),
                    ResolveStep::Provision(path) => {
                        let api = Arc::clone(&self.api);
                        self.in_flight.push(Box::pin(async move {
                            Completion::WorkspaceCreated(api.create_workspace(&path).await)
                        }));
                    }
                    ResolveStep::Abandon => {}
                }
            }
            Completion::WorkspaceCreated(result) => {
                let step = self
                    .resolver
                    .on_workspace_created(result, self.selection.has_project());
                match step {
                    ProvisionStep::Select(project) => {
                        self.start_fetch(false, false);
                        self.select_resolved(project);
                    }
                    ProvisionStep::Refresh => self.start_fetch(false, false),
                    ProvisionStep::Abandon => {}
                }
            }
        }
    }

    fn handle_push(&mut self, envelope: &PushEnvelope) {
        match self.dispatcher.dispatch(envelope) {
            Dispatch::RefreshRequested => self.start_fetch(false, false),
            Dispatch::Ignored => {
                tracing::debug!("Ignoring push message of unknown type");
            }
            Dispatch::ProgressUpdated | Dispatch::Duplicate => {}
        }
    }

    fn start_fetch(&mut self, force_loading: bool, reconcile: bool) {
        self.store.begin_refresh(force_loading);
        let api = Arc::clone(&self.api);
        self.in_flight.push(Box::pin(async move {
            Completion::Fetched {
                result: api.list_projects().await,
                reconcile,
            }
        }));
    }

    fn on_projects_changed(&mut self) {
        self.apply_route();
        self.maybe_start_resolution();
    }

    fn apply_route(&mut self) {
        let Some(session_id) = self.route.session_id() else {
            return;
        };
        if let Some(routed) = self
            .router
            .route(session_id, self.store.projects(), &self.selection)
        {
            self.selection = routed;
            self.active_view = ActiveView::Terminal;
        }
    }

    fn maybe_start_resolution(&mut self) {
        let Some(external_id) = self
            .resolver
            .try_begin(self.selection.has_project(), self.store.is_loaded())
        else {
            return;
        };

        let api = Arc::clone(&self.api);
        self.in_flight.push(Box::pin(async move {
            Completion::PathResolved(api.resolve_external_id(&external_id).await)
        }));
    }

    fn select_resolved(&mut self, project: Project) {
        tracing::info!("Selected workspace {} for external project", project.name);
        self.selection.project = Some(project);
        self.selection.session = None;
        self.active_view = ActiveView::Terminal;
    }

    /// After a sidebar refresh, pick up newer copies of the selected records.
    fn reconcile_selection(&mut self) {
        let Some(selected) = self.selection.project.as_ref() else {
            return;
        };
        let Some(refreshed) = self.store.find(&selected.name) else {
            return;
        };

        let refreshed_session = self.selection.session.as_ref().and_then(|current| {
            refreshed
                .find_session(current.id())
                .filter(|session| **session != current.session)
                .map(|session| SelectedSession {
                    session: session.clone(),
                    provider: current.provider,
                })
        });
        let refreshed_project = (refreshed != selected).then(|| refreshed.clone());

        if let Some(project) = refreshed_project {
            self.selection.project = Some(project);
        }
        if let Some(session) = refreshed_session {
            self.selection.session = Some(session);
        }
    }

    fn publish(&self) {
        let next = WorkspaceView {
            projects: Arc::clone(self.store.projects()),
            selection: self.selection.clone(),
            active_view: self.active_view,
            route: self.route.clone(),
            is_loading: self.store.is_loading(),
            loading_progress: self.dispatcher.progress().cloned(),
            external_mode: self.external_mode,
            resolution: self.resolver.state(),
        };

        self.view_tx.send_if_modified(|current| {
            if current.same_as(&next) {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Next unseen envelope, or `None` once the writer side is gone.
async fn next_push(rx: &mut Option<PushReceiver>) -> Option<PushEnvelope> {
    let rx = rx.as_mut()?;
    loop {
        rx.changed().await.ok()?;
        let latest = rx.borrow_and_update().clone();
        if latest.is_some() {
            return latest;
        }
    }
}
