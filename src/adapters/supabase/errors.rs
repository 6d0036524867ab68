//! Normalizes backend failures into the domain error taxonomy. Every
//! adapter method funnels non-success responses through here so callers
//! only ever see `NotFound`, `Constraint`, or `Database`.

use crate::utils::error::RepositoryError;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

/// PostgREST single-object request matched no row.
pub const PGRST_NO_ROWS: &str = "PGRST116";

/// SQLSTATE for insufficient privilege; how PostgREST surfaces a
/// row-level-security rejection.
const SQLSTATE_INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Debug, Deserialize)]
pub struct PostgrestErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

pub fn parse_postgrest_error(body: &str) -> Option<PostgrestErrorBody> {
    serde_json::from_str(body).ok()
}

/// Maps a non-success PostgREST response to a domain error.
///
/// `entity_id` is the row the caller addressed, when there is one; it turns
/// a no-rows condition into `NotFound` instead of a generic failure.
pub fn normalize_rest_error(
    status: StatusCode,
    body: &str,
    entity_type: &str,
    entity_id: Option<&str>,
) -> RepositoryError {
    debug!(%status, entity_type, "backend table operation failed");

    let Some(error) = parse_postgrest_error(body) else {
        return RepositoryError::database(format!(
            "Unexpected backend response ({}): {}",
            status.as_u16(),
            body
        ));
    };

    let message = error.message.as_deref().unwrap_or("").to_string();

    match error.code.as_deref() {
        Some(PGRST_NO_ROWS) => match entity_id {
            Some(id) => RepositoryError::not_found(entity_type, id),
            None => RepositoryError::database(message),
        },
        // Integrity constraint violation class (unique, foreign key, check).
        Some(code) if code.starts_with("23") => {
            let constraint =
                extract_constraint_name(&message).unwrap_or_else(|| code.to_string());
            if message.is_empty() {
                RepositoryError::constraint(constraint)
            } else {
                RepositoryError::constraint_with_message(constraint, message)
            }
        }
        Some(SQLSTATE_INSUFFICIENT_PRIVILEGE) => {
            if message.is_empty() {
                RepositoryError::constraint("row_level_security")
            } else {
                RepositoryError::constraint_with_message("row_level_security", message)
            }
        }
        _ => {
            if message.is_empty() {
                RepositoryError::database(format!("Backend operation failed ({})", status.as_u16()))
            } else {
                RepositoryError::database(message)
            }
        }
    }
}

/// Maps a non-success GoTrue response to a domain error. The auth provider
/// has several error body dialects; pick the most descriptive field.
pub fn normalize_auth_error(status: StatusCode, body: &str) -> RepositoryError {
    debug!(%status, "auth operation failed");

    let message = serde_json::from_str::<AuthErrorBody>(body)
        .ok()
        .and_then(|e| {
            e.error_description
                .or(e.msg)
                .or(e.message)
                .or(e.error)
                .filter(|m| !m.is_empty())
        })
        .unwrap_or_else(|| format!("Authentication request failed ({})", status.as_u16()));

    RepositoryError::database(message)
}

/// Pulls the violated constraint name out of a Postgres error message,
/// e.g. `duplicate key value violates unique constraint "projects_name_key"`.
fn extract_constraint_name(message: &str) -> Option<String> {
    let re = regex::Regex::new(r#"constraint "([^"]+)""#).unwrap();
    re.captures(message).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_with_entity_id_is_not_found() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned","details":null,"hint":null}"#;

        let error = normalize_rest_error(StatusCode::NOT_ACCEPTABLE, body, "Project", Some("p1"));

        assert_eq!(error.to_string(), "Project with id p1 not found");
    }

    #[test]
    fn test_no_rows_without_entity_id_is_database() {
        let body = r#"{"code":"PGRST116","message":"no rows returned"}"#;

        let error = normalize_rest_error(StatusCode::NOT_ACCEPTABLE, body, "Project", None);

        assert!(matches!(error, RepositoryError::Database { .. }));
    }

    #[test]
    fn test_unique_violation_extracts_constraint_name() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"projects_name_key\"","details":"Key (name)=(Demo) already exists.","hint":null}"#;

        let error = normalize_rest_error(StatusCode::CONFLICT, body, "Project", None);

        match error {
            RepositoryError::Constraint {
                constraint,
                message,
            } => {
                assert_eq!(constraint, "projects_name_key");
                assert!(message.contains("duplicate key value"));
            }
            other => panic!("expected Constraint, got {:?}", other),
        }
    }

    #[test]
    fn test_foreign_key_violation_is_constraint() {
        let body = r#"{"code":"23503","message":"insert or update on table \"project_members\" violates foreign key constraint \"project_members_project_id_fkey\""}"#;

        let error = normalize_rest_error(StatusCode::CONFLICT, body, "Project", None);

        match error {
            RepositoryError::Constraint { constraint, .. } => {
                assert_eq!(constraint, "project_members_project_id_fkey");
            }
            other => panic!("expected Constraint, got {:?}", other),
        }
    }

    #[test]
    fn test_constraint_code_without_name_falls_back_to_sqlstate() {
        let body = r#"{"code":"23514","message":"new row violates check"}"#;

        let error = normalize_rest_error(StatusCode::CONFLICT, body, "Project", None);

        match error {
            RepositoryError::Constraint { constraint, .. } => assert_eq!(constraint, "23514"),
            other => panic!("expected Constraint, got {:?}", other),
        }
    }

    #[test]
    fn test_rls_rejection_is_constraint() {
        let body = r#"{"code":"42501","message":"new row violates row-level security policy for table \"project_members\""}"#;

        let error = normalize_rest_error(StatusCode::FORBIDDEN, body, "Project", None);

        match error {
            RepositoryError::Constraint {
                constraint,
                message,
            } => {
                assert_eq!(constraint, "row_level_security");
                assert!(message.contains("row-level security"));
            }
            other => panic!("expected Constraint, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_code_is_database() {
        let body = r#"{"code":"57014","message":"canceling statement due to statement timeout"}"#;

        let error = normalize_rest_error(StatusCode::INTERNAL_SERVER_ERROR, body, "Project", None);

        match error {
            RepositoryError::Database { message, .. } => {
                assert_eq!(message, "canceling statement due to statement timeout");
            }
            other => panic!("expected Database, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_body_is_database_with_status() {
        let error =
            normalize_rest_error(StatusCode::BAD_GATEWAY, "<html>gateway</html>", "Project", None);

        match error {
            RepositoryError::Database { message, .. } => {
                assert!(message.contains("502"));
            }
            other => panic!("expected Database, got {:?}", other),
        }
    }

    #[test]
    fn test_auth_error_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;

        let error = normalize_auth_error(StatusCode::BAD_REQUEST, body);

        assert_eq!(error.to_string(), "Invalid login credentials");
    }

    #[test]
    fn test_auth_error_msg_dialect() {
        let body = r#"{"code":422,"msg":"Password should be at least 6 characters"}"#;

        let error = normalize_auth_error(StatusCode::UNPROCESSABLE_ENTITY, body);

        assert_eq!(error.to_string(), "Password should be at least 6 characters");
    }

    #[test]
    fn test_auth_error_unparseable_body() {
        let error = normalize_auth_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");

        assert_eq!(error.to_string(), "Authentication request failed (500)");
    }
}
