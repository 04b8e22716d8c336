use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::core::{Config, Project};

/// REST surface the sync engine depends on.
///
/// Implementations must be cheap to share; the engine holds one behind an
/// `Arc` and calls into it from its own task.
pub trait WorkspaceApi: Send + Sync + 'static {
    /// `GET /api/projects`
    fn list_projects(&self) -> impl Future<Output = Result<Vec<Project>>> + Send;

    /// `GET /api/projects/resolve-overleaf?id=..`. `Ok(None)` when the server
    /// answers with a non-success status.
    fn resolve_external_id(
        &self,
        external_id: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// `POST /api/projects/create-workspace` for an existing directory.
    fn create_workspace(&self, path: &str) -> impl Future<Output = Result<Project>> + Send;
}

#[derive(Debug, Clone)]
pub struct WorkspaceClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    pub workspace_type: WorkspaceType,
    pub path: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceType {
    Existing,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    path: String,
}

#[derive(Debug, Deserialize)]
struct CreateWorkspaceResponse {
    project: Project,
}

impl WorkspaceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.server.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the server answers at all
    pub async fn is_server_running(&self) -> bool {
        self.client
            .get(format!("{}/api/projects", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .is_ok()
    }

    /// Web URL that opens a session in the browser client
    pub fn get_session_url(&self, session_id: &str) -> String {
        format!("{}/session/{}", self.base_url, session_id)
    }
}

impl WorkspaceApi for WorkspaceClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let url = format!("{}/api/projects", self.base_url);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Failed to list projects: {} - {}", status, error_text));
        }

        let response_text = response.text().await?;
        let projects: Vec<Project> = serde_json::from_str(&response_text)
            .map_err(|e| anyhow!("Failed to parse project list response: {}", e))?;

        tracing::debug!("GET /api/projects returned {} projects", projects.len());
        Ok(projects)
    }

    async fn resolve_external_id(&self, external_id: &str) -> Result<Option<String>> {
        let url = format!("{}/api/projects/resolve-overleaf", self.base_url);
        tracing::debug!("GET {}?id={}", url, external_id);

        let response = self
            .client
            .get(&url)
            .query(&[("id", external_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("External id {} not resolvable: {}", external_id, status);
            return Ok(None);
        }

        let response_text = response.text().await?;
        let resolved: ResolveResponse = serde_json::from_str(&response_text)
            .map_err(|e| anyhow!("Failed to parse resolve response: {}", e))?;
        Ok(Some(resolved.path))
    }

    async fn create_workspace(&self, path: &str) -> Result<Project> {
        let request = CreateWorkspaceRequest {
            workspace_type: WorkspaceType::Existing,
            path: path.to_string(),
        };

        let url = format!("{}/api/projects/create-workspace", self.base_url);
        tracing::debug!("POST {} request body: {:?}", url, request);

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        tracing::debug!("POST /api/projects/create-workspace response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                "Workspace creation failed with status {}: {}",
                status,
                error_text
            );
            return Err(anyhow!(
                "Failed to create workspace: {} - {}",
                status,
                error_text
            ));
        }

        let response_text = response.text().await?;
        let created: CreateWorkspaceResponse = serde_json::from_str(&response_text)
            .map_err(|e| anyhow!("Failed to parse create-workspace response: {}", e))?;

        tracing::debug!("Created workspace project: {}", created.project.name);
        Ok(created.project)
    }
}
