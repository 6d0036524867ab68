use crate::adapters::supabase::client::SupabaseClient;
use crate::adapters::supabase::errors::{
    normalize_rest_error, parse_postgrest_error, PGRST_NO_ROWS,
};
use crate::adapters::supabase::wire::{
    map_project_row, map_project_with_role, ProjectRow, ProjectWithMembersRow,
};
use crate::domain::model::{
    CreateProjectInput, Project, ProjectRole, ProjectWithRole, UpdateProjectInput,
};
use crate::domain::ports::ProjectRepository;
use crate::utils::error::{RepositoryError, Result};
use crate::utils::validation::validate_non_empty_string;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::json;
use std::sync::Arc;

const ENTITY: &str = "Project";

/// PostgREST media type for "exactly one row"; no-match comes back as a
/// PGRST116 error body instead of an empty array.
const PGRST_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct SupabaseProjectRepository {
    client: Arc<SupabaseClient>,
}

impl SupabaseProjectRepository {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Project>> {
        let filter = format!("eq.{}", id);
        let response = self
            .client
            .get(&self.client.table_url("projects"))
            .await
            .query(&[("select", "*"), ("id", filter.as_str())])
            .header(ACCEPT, PGRST_OBJECT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let row: ProjectRow = response.json().await?;
            return Ok(Some(map_project_row(row)));
        }

        let body = response.text().await.unwrap_or_default();
        if let Some(error) = parse_postgrest_error(&body) {
            if error.code.as_deref() == Some(PGRST_NO_ROWS) {
                return Ok(None);
            }
        }
        Err(normalize_rest_error(status, &body, ENTITY, None))
    }

    async fn rpc_bool(&self, function: &str, args: serde_json::Value) -> Result<bool> {
        tracing::debug!(function, "calling backend rpc");
        let response = self
            .client
            .post(&self.client.rpc_url(function))
            .await
            .json(&args)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_rest_error(status, &body, ENTITY, None));
        }

        // RPCs declared to return boolean can still yield null; treat it as false.
        let value: Option<bool> = response.json().await?;
        Ok(value.unwrap_or(false))
    }
}

#[async_trait]
impl ProjectRepository for SupabaseProjectRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        tracing::debug!(id, "fetching project");
        self.fetch_by_id(id).await
    }

    async fn list(&self) -> Result<Vec<ProjectWithRole>> {
        tracing::debug!("listing projects with membership roles");
        let response = self
            .client
            .get(&self.client.table_url("projects"))
            .await
            .query(&[
                ("select", "*,project_members!inner(role)"),
                ("order", "created_at.desc"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_rest_error(status, &body, ENTITY, None));
        }

        let rows: Vec<ProjectWithMembersRow> = response.json().await?;
        rows.into_iter().map(map_project_with_role).collect()
    }

    async fn create(&self, input: CreateProjectInput) -> Result<Project> {
        tracing::debug!(name = %input.name, "creating project");
        let response = self
            .client
            .post(&self.client.table_url("projects"))
            .await
            .header(ACCEPT, PGRST_OBJECT)
            .header("Prefer", "return=representation")
            .json(&json!({ "name": input.name }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_rest_error(status, &body, ENTITY, None));
        }

        let row: ProjectRow = response.json().await?;
        Ok(map_project_row(row))
    }

    async fn update(&self, id: &str, input: UpdateProjectInput) -> Result<Project> {
        let Some(name) = input.name else {
            // Nothing to change; confirm the row exists and return it.
            return self
                .fetch_by_id(id)
                .await?
                .ok_or_else(|| RepositoryError::not_found(ENTITY, id));
        };

        validate_non_empty_string("name", &name).map_err(|_| {
            RepositoryError::database("Project name cannot be empty")
        })?;

        tracing::debug!(id, "updating project");
        let filter = format!("eq.{}", id);
        let response = self
            .client
            .patch(&self.client.table_url("projects"))
            .await
            .query(&[("id", filter.as_str())])
            .header(ACCEPT, PGRST_OBJECT)
            .header("Prefer", "return=representation")
            .json(&json!({ "name": name }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_rest_error(status, &body, ENTITY, Some(id)));
        }

        let row: ProjectRow = response.json().await?;
        Ok(map_project_row(row))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        tracing::debug!(id, "deleting project");
        let filter = format!("eq.{}", id);
        let response = self
            .client
            .delete(&self.client.table_url("projects"))
            .await
            .query(&[("id", filter.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_rest_error(status, &body, ENTITY, None));
        }
        Ok(())
    }

    async fn add_current_user_as_member(
        &self,
        project_id: &str,
        role: ProjectRole,
    ) -> Result<Project> {
        let session = self
            .client
            .cached_session()
            .await
            .ok_or_else(|| RepositoryError::database("User must be authenticated"))?;

        // Existence check through an RPC that bypasses row-level security;
        // the table itself is invisible until the user is a member.
        let exists = self
            .rpc_bool("project_exists", json!({ "project_uuid": project_id }))
            .await
            .unwrap_or(false);
        if !exists {
            return Err(RepositoryError::not_found(ENTITY, project_id));
        }

        // The backend policy allows self-adding as viewer; any other role
        // requires admin rights and is rejected server-side.
        tracing::debug!(project_id, role = %role, "adding current user as member");
        let response = self
            .client
            .post(&self.client.table_url("project_members"))
            .await
            .header("Prefer", "return=minimal")
            .json(&json!({
                "project_id": project_id,
                "user_id": session.user_id,
                "role": role,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_rest_error(status, &body, ENTITY, None));
        }

        // Membership now satisfies the select policy, so the row is visible.
        self.fetch_by_id(project_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, project_id))
    }

    async fn has_project_access(&self) -> Result<bool> {
        self.rpc_bool("has_any_project_access", json!({})).await
    }
}
