use crate::config::SupabaseConfig;
use crate::domain::model::AuthSession;
use crate::utils::error::Result;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tokio::sync::RwLock;

/// Thin wrapper over the Supabase HTTP surface: PostgREST tables and RPCs
/// under `/rest/v1`, GoTrue under `/auth/v1`.
///
/// Holds the current session in memory so table requests run with the
/// user's token (row-level security applies per user) and so
/// browser-context session checks stay local. Nothing is persisted.
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
    session: RwLock<Option<AuthSession>>,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Client seeded with a session established out-of-band, e.g. a token
    /// extracted from a request cookie in a server context.
    pub fn with_session(config: SupabaseConfig, session: AuthSession) -> Result<Self> {
        Self::build(config, Some(session))
    }

    fn build(config: SupabaseConfig, session: Option<AuthSession>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            config,
            session: RwLock::new(session),
        })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    pub async fn cached_session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    pub async fn store_session(&self, session: Option<AuthSession>) {
        *self.session.write().await = session;
    }

    fn base(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base(), table)
    }

    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base(), function)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base(), path)
    }

    /// Applies the `apikey` header and a bearer token: the session's access
    /// token when signed in, otherwise the anonymous key.
    pub async fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = {
            let session = self.session.read().await;
            session
                .as_ref()
                .map(|s| s.access_token.clone())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.config.anon_key.clone())
        };

        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }

    pub async fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.get(url)).await
    }

    pub async fn post(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.post(url)).await
    }

    pub async fn patch(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.patch(url)).await
    }

    pub async fn delete(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.delete(url)).await
    }
}
