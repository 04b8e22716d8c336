use std::sync::Arc;

use crate::client::{PushListener, WorkspaceApi, WorkspaceClient};
use crate::core::{LaunchContext, PushSlot};
use crate::sync::{RefreshHook, SyncEngine, WorkspaceResolver, WorkspaceView};
use crate::utils::project_label;
use crate::{Config, Result};

pub async fn watch(config: Config, url: Option<String>, no_push: bool) -> Result<()> {
    let client = Arc::new(WorkspaceClient::from_config(&config)?);
    if !client.is_server_running().await {
        tracing::warn!(
            "Server at {} is not answering; the view stays empty until it does",
            client.base_url()
        );
    }

    let launch = match url {
        Some(url) => LaunchContext::capture(&url, &config.sync.router_basename)?,
        None => LaunchContext::default(),
    };
    if let Some(project) = &launch.external_project {
        tracing::info!("Embedded for editor project {}", project);
    }

    let push_rx = if no_push {
        None
    } else {
        let (slot, push_rx) = PushSlot::new();
        let listener = PushListener::new(config.push_url()?, config.push.clone());
        tokio::spawn(async move {
            if let Err(e) = listener.run(slot).await {
                tracing::error!("Push listener stopped: {}", e);
            }
        });
        Some(push_rx)
    };

    let hook = Arc::new(RefreshHook::new());
    let (handle, task) = SyncEngine::spawn(client, &config, launch, push_rx, &hook);
    let mut views = handle.subscribe();
    print_view(&views.borrow_and_update());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                handle.shutdown()?;
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&views.borrow_and_update());
            }
        }
    }

    task.await?;
    Ok(())
}

fn print_view(view: &WorkspaceView) {
    if view.is_loading {
        println!("Loading projects...");
        return;
    }

    println!("--- {} projects ---", view.projects.len());
    for project in view.display_projects() {
        let marker = if view.selection.project_name() == Some(project.name.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, project_label(project));
    }

    match (&view.selection.project, &view.selection.session) {
        (Some(project), Some(session)) => {
            println!(
                "Selected: {} / session {} [{:?}]",
                project.name,
                session.id(),
                view.active_view
            )
        }
        (Some(project), None) => println!("Selected: {} [{:?}]", project.name, view.active_view),
        _ => println!("Nothing selected"),
    }

    if let Some(progress) = &view.loading_progress {
        println!("Server: {}", progress.phase);
    }
}

pub async fn list_projects(config: Config) -> Result<()> {
    let client = WorkspaceClient::from_config(&config)?;
    let projects = client.list_projects().await?;

    if projects.is_empty() {
        println!("No projects found");
        return Ok(());
    }

    for project in &projects {
        println!("{}", project_label(project));
        for session in &project.sessions {
            println!("    {}  {}", session.id, client.get_session_url(&session.id));
        }
    }
    Ok(())
}

pub async fn resolve(config: Config, external_id: String) -> Result<()> {
    let client = WorkspaceClient::from_config(&config)?;
    let projects = client.list_projects().await?;

    let mut resolver = WorkspaceResolver::new(Some(external_id.clone()));
    match resolver.resolve(&client, &projects).await {
        Some(project) => {
            println!("{} -> {}", external_id, project_label(&project));
            Ok(())
        }
        None => anyhow::bail!("Could not resolve editor project {}", external_id),
    }
}
