//! Wire-format payloads for the Supabase REST and auth endpoints, plus the
//! row-to-domain mapping. Shapes here follow what PostgREST and GoTrue
//! actually return; the domain layer never sees them.

use crate::domain::model::{AuthSession, Project, ProjectRole, ProjectWithRole};
use crate::utils::error::{RepositoryError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A `projects` row with the embedded `project_members!inner(role)`
/// relationship. PostgREST returns the embedded rows as an array even for
/// an inner join that matches exactly one membership.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectWithMembersRow {
    #[serde(flatten)]
    pub project: ProjectRow,
    #[serde(default)]
    pub project_members: Vec<MemberRoleRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberRoleRow {
    pub role: String,
}

pub fn map_project_row(row: ProjectRow) -> Project {
    Project {
        id: row.id,
        name: row.name,
        created_at: row.created_at,
    }
}

pub fn map_project_with_role(row: ProjectWithMembersRow) -> Result<ProjectWithRole> {
    let role_value = row
        .project_members
        .first()
        .map(|m| m.role.as_str())
        .ok_or_else(|| RepositoryError::database("Project member role not found"))?;

    let role: ProjectRole = role_value.parse().map_err(RepositoryError::database)?;

    Ok(ProjectWithRole::from_project(
        map_project_row(row.project),
        role,
    ))
}

/// GoTrue session payload. `/auth/v1/signup` returns a bare user object
/// (no token) when email confirmation is pending, so both fields are
/// optional and callers decide what absence means.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionPayload {
    pub access_token: Option<String>,
    pub user: Option<UserPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub id: String,
    pub email: Option<String>,
}

/// Maps a GoTrue session to the domain session, falling back to the email
/// the caller submitted when the backend omits one.
pub fn map_session(payload: SessionPayload, fallback_email: &str) -> Result<AuthSession> {
    let access_token = payload
        .access_token
        .ok_or_else(|| RepositoryError::database("No session returned from auth provider"))?;
    let user = payload
        .user
        .ok_or_else(|| RepositoryError::database("No user returned from auth provider"))?;

    let email = user
        .email
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| fallback_email.to_string());

    Ok(AuthSession {
        user_id: user.id,
        email,
        access_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_project_row_is_lossless() {
        let row: ProjectRow = serde_json::from_value(serde_json::json!({
            "id": "123e4567-e89b-12d3-a456-426614174000",
            "name": "Website redesign",
            "created_at": "2024-03-01T12:00:00Z"
        }))
        .unwrap();

        let project = map_project_row(row);

        assert_eq!(project.id, "123e4567-e89b-12d3-a456-426614174000");
        assert_eq!(project.name, "Website redesign");
        assert_eq!(project.created_at.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_map_project_with_role() {
        let row: ProjectWithMembersRow = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Launch plan",
            "created_at": "2024-03-01T12:00:00Z",
            "project_members": [{"role": "admin"}]
        }))
        .unwrap();

        let with_role = map_project_with_role(row).unwrap();

        assert_eq!(with_role.id, "p1");
        assert_eq!(with_role.role, ProjectRole::Admin);
    }

    #[test]
    fn test_map_project_with_role_missing_membership() {
        let row: ProjectWithMembersRow = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Launch plan",
            "created_at": "2024-03-01T12:00:00Z",
            "project_members": []
        }))
        .unwrap();

        let err = map_project_with_role(row).unwrap_err();
        assert_eq!(err.to_string(), "Project member role not found");
    }

    #[test]
    fn test_map_project_with_role_invalid_role() {
        let row: ProjectWithMembersRow = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Launch plan",
            "created_at": "2024-03-01T12:00:00Z",
            "project_members": [{"role": "superuser"}]
        }))
        .unwrap();

        let err = map_project_with_role(row).unwrap_err();
        assert_eq!(err.to_string(), "Invalid project role: superuser");
    }

    #[test]
    fn test_map_session_uses_backend_email() {
        let payload: SessionPayload = serde_json::from_value(serde_json::json!({
            "access_token": "token-abc",
            "user": {"id": "u1", "email": "alice@example.com"}
        }))
        .unwrap();

        let session = map_session(payload, "fallback@example.com").unwrap();

        assert_eq!(session.user_id, "u1");
        assert_eq!(session.email, "alice@example.com");
        assert_eq!(session.access_token, "token-abc");
    }

    #[test]
    fn test_map_session_falls_back_to_submitted_email() {
        let payload: SessionPayload = serde_json::from_value(serde_json::json!({
            "access_token": "token-abc",
            "user": {"id": "u1"}
        }))
        .unwrap();

        let session = map_session(payload, "alice@example.com").unwrap();
        assert_eq!(session.email, "alice@example.com");
    }

    #[test]
    fn test_map_session_without_token_is_error() {
        let payload: SessionPayload = serde_json::from_value(serde_json::json!({
            "user": {"id": "u1", "email": "alice@example.com"}
        }))
        .unwrap();

        assert!(map_session(payload, "alice@example.com").is_err());
    }
}
