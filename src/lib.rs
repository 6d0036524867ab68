pub mod adapters;
pub mod config;
pub mod domain;
pub mod utils;

pub use adapters::supabase::{SupabaseAuthRepository, SupabaseClient, SupabaseProjectRepository};
pub use config::{AuthContext, SupabaseConfig};
pub use domain::model::{
    AuthResult, AuthSession, CreateProjectInput, Project, ProjectRole, ProjectWithRole,
    SignInInput, SignUpInput, UpdateProjectInput,
};
pub use domain::ports::{AuthRepository, ProjectRepository};
pub use utils::error::{RepositoryError, Result};
