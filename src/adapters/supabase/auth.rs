use crate::adapters::supabase::client::SupabaseClient;
use crate::adapters::supabase::errors::normalize_auth_error;
use crate::adapters::supabase::wire::{map_session, SessionPayload, UserPayload};
use crate::config::AuthContext;
use crate::domain::model::{AuthResult, AuthSession, SignInInput, SignUpInput};
use crate::domain::ports::AuthRepository;
use crate::utils::error::{RepositoryError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct SupabaseAuthRepository {
    client: Arc<SupabaseClient>,
}

impl SupabaseAuthRepository {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }

    async fn request_session(&self, url: &str, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .client
            .post(url)
            .await
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_auth_error(status, &body));
        }

        let payload: SessionPayload = response.json().await?;
        let session = map_session(payload, email)?;
        self.client.store_session(Some(session.clone())).await;
        Ok(session)
    }

    /// Authoritative check: ask the auth provider whether the cached token
    /// still identifies a user. The user endpoint returns no tokens, so the
    /// resulting session carries an empty access token; server-side checks
    /// only need the identity.
    async fn validate_with_auth_server(&self) -> Result<Option<AuthSession>> {
        if self.client.cached_session().await.is_none() {
            return Ok(None);
        }

        let response = self
            .client
            .get(&self.client.auth_url("user"))
            .await
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // The token no longer validates; the authoritative answer is
            // "no session".
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_auth_error(status, &body));
        }

        let user: UserPayload = response.json().await?;
        let email = user.email.filter(|e| !e.is_empty()).ok_or_else(|| {
            RepositoryError::database("User email not found in authenticated user data")
        })?;

        Ok(Some(AuthSession {
            user_id: user.id,
            email,
            access_token: String::new(),
        }))
    }
}

#[async_trait]
impl AuthRepository for SupabaseAuthRepository {
    async fn sign_up(&self, input: SignUpInput) -> Result<AuthResult> {
        tracing::debug!(email = %input.email, "signing up");
        let session = self
            .request_session(
                &self.client.auth_url("signup"),
                &input.email,
                &input.password,
            )
            .await?;
        Ok(AuthResult { session })
    }

    async fn sign_in(&self, input: SignInInput) -> Result<AuthResult> {
        tracing::debug!(email = %input.email, "signing in");
        let url = format!("{}?grant_type=password", self.client.auth_url("token"));
        let session = self
            .request_session(&url, &input.email, &input.password)
            .await?;
        Ok(AuthResult { session })
    }

    async fn sign_out(&self) -> Result<()> {
        tracing::debug!("signing out");
        let response = self
            .client
            .post(&self.client.auth_url("logout"))
            .await
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_auth_error(status, &body));
        }

        self.client.store_session(None).await;
        Ok(())
    }

    /// Browser context trusts the locally cached session (fast, unverified);
    /// server context re-validates with the auth provider (slower,
    /// authoritative). The split is driven by the explicit `AuthContext`
    /// config flag, never by probing the runtime environment.
    async fn get_session(&self) -> Result<Option<AuthSession>> {
        match self.client.config().auth_context {
            AuthContext::Server => self.validate_with_auth_server().await,
            AuthContext::Browser => Ok(self.client.cached_session().await),
        }
    }
}
