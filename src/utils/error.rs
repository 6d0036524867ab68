use thiserror::Error;

/// Closed error taxonomy for the data-access layer.
///
/// Backend failures of any shape are normalized into `NotFound`,
/// `Constraint`, or `Database` before they reach callers; the config
/// variants cover local configuration loading only.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity_type} with id {entity_id} not found")]
    NotFound {
        entity_type: String,
        entity_id: String,
    },

    #[error("{message}")]
    Constraint { constraint: String, message: String },

    #[error("{message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration value: {field}")]
    MissingConfig { field: String },
}

impl RepositoryError {
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }

    /// Constraint violation with the default message.
    pub fn constraint(constraint: impl Into<String>) -> Self {
        let constraint = constraint.into();
        let message = format!("Database constraint violation: {}", constraint);
        RepositoryError::Constraint {
            constraint,
            message,
        }
    }

    pub fn constraint_with_message(
        constraint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RepositoryError::Constraint {
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        RepositoryError::Database {
            message: message.into(),
            source: None,
        }
    }

    pub fn database_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RepositoryError::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<reqwest::Error> for RepositoryError {
    fn from(error: reqwest::Error) -> Self {
        RepositoryError::database_with_source(format!("Backend request failed: {}", error), error)
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(error: serde_json::Error) -> Self {
        RepositoryError::database_with_source(
            format!("Backend response deserialization failed: {}", error),
            error,
        )
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
