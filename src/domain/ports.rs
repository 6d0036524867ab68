use crate::domain::model::{
    AuthResult, AuthSession, CreateProjectInput, Project, ProjectRole, ProjectWithRole,
    SignInInput, SignUpInput, UpdateProjectInput,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Project persistence port. Authorization is enforced server-side by the
/// backend's row-level security; implementations only shape requests and
/// normalize errors.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>>;

    /// Projects visible to the current user, newest first, each with the
    /// user's membership role.
    async fn list(&self) -> Result<Vec<ProjectWithRole>>;

    async fn create(&self, input: CreateProjectInput) -> Result<Project>;

    async fn update(&self, id: &str, input: UpdateProjectInput) -> Result<Project>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Adds the current user as a member of the project. The backend policy
    /// decides whether the requested role is allowed (self-service joins are
    /// limited to `viewer` unless the user is an admin).
    async fn add_current_user_as_member(
        &self,
        project_id: &str,
        role: ProjectRole,
    ) -> Result<Project>;

    /// Whether the current user has any project membership at all.
    async fn has_project_access(&self) -> Result<bool>;
}

/// Authentication port over the hosted auth provider.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn sign_up(&self, input: SignUpInput) -> Result<AuthResult>;

    async fn sign_in(&self, input: SignInInput) -> Result<AuthResult>;

    async fn sign_out(&self) -> Result<()>;

    /// Current session, or `None` when unauthenticated. Browser-context
    /// implementations may trust a locally cached session; server-context
    /// implementations must re-validate with the auth provider.
    async fn get_session(&self) -> Result<Option<AuthSession>>;
}
