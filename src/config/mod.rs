use crate::utils::error::{RepositoryError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Which authentication check `get_session` performs.
///
/// This is an explicit configuration flag, never inferred from the runtime
/// environment: `Browser` trusts the locally cached session (fast,
/// unverified), `Server` re-validates the user against the auth provider
/// (slower, authoritative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthContext {
    #[default]
    Browser,
    Server,
}

impl std::str::FromStr for AuthContext {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "browser" => Ok(AuthContext::Browser),
            "server" => Ok(AuthContext::Server),
            other => Err(format!("Invalid auth context: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default)]
    pub auth_context: AuthContext,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

// On-disk layout: [backend] url/anon_key, optional [auth] context,
// optional [http] timeout_seconds.
#[derive(Debug, Deserialize)]
struct FileConfig {
    backend: BackendSection,
    auth: Option<AuthSection>,
    http: Option<HttpSection>,
}

#[derive(Debug, Deserialize)]
struct BackendSection {
    url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct AuthSection {
    context: Option<AuthContext>,
}

#[derive(Debug, Deserialize)]
struct HttpSection {
    timeout_seconds: Option<u64>,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            auth_context: AuthContext::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn with_auth_context(mut self, context: AuthContext) -> Self {
        self.auth_context = context;
        self
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            RepositoryError::database_with_source(
                format!("Failed to read config file {}", path.as_ref().display()),
                e,
            )
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);

        let file: FileConfig =
            toml::from_str(&processed).map_err(|e| RepositoryError::InvalidConfig {
                field: "toml".to_string(),
                value: String::new(),
                reason: format!("TOML parsing error: {}", e),
            })?;

        Ok(Self {
            url: file.backend.url,
            anon_key: file.backend.anon_key,
            auth_context: file.auth.and_then(|a| a.context).unwrap_or_default(),
            timeout_seconds: file
                .http
                .and_then(|h| h.timeout_seconds)
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    /// Load from `SUPABASE_URL`, `SUPABASE_ANON_KEY`, and optionally
    /// `SUPABASE_AUTH_CONTEXT` (`browser` | `server`).
    pub fn from_env() -> Result<Self> {
        let url = require_env("SUPABASE_URL")?;
        let anon_key = require_env("SUPABASE_ANON_KEY")?;

        let auth_context = match std::env::var("SUPABASE_AUTH_CONTEXT") {
            Ok(value) => value
                .parse()
                .map_err(|reason| RepositoryError::InvalidConfig {
                    field: "SUPABASE_AUTH_CONTEXT".to_string(),
                    value,
                    reason,
                })?,
            Err(_) => AuthContext::default(),
        };

        Ok(Self {
            url,
            anon_key,
            auth_context,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| RepositoryError::MissingConfig {
        field: name.to_string(),
    })
}

/// Replace `${VAR_NAME}` placeholders with environment values; unknown
/// variables are left as-is so validation reports them in context.
fn substitute_env_vars(content: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

impl Validate for SupabaseConfig {
    fn validate(&self) -> Result<()> {
        validate_url("backend.url", &self.url)?;
        validate_non_empty_string("backend.anon_key", &self.anon_key)?;
        validate_positive_number("http.timeout_seconds", self.timeout_seconds, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_config() {
        let toml_content = r#"
[backend]
url = "https://example.supabase.co"
anon_key = "anon-key-value"

[auth]
context = "server"

[http]
timeout_seconds = 10
"#;

        let config = SupabaseConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.url, "https://example.supabase.co");
        assert_eq!(config.anon_key, "anon-key-value");
        assert_eq!(config.auth_context, AuthContext::Server);
        assert_eq!(config.timeout_seconds, 10);
    }

    #[test]
    fn test_defaults_when_sections_omitted() {
        let toml_content = r#"
[backend]
url = "https://example.supabase.co"
anon_key = "anon-key-value"
"#;

        let config = SupabaseConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.auth_context, AuthContext::Browser);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_SUPABASE_URL", "https://test.supabase.co");

        let toml_content = r#"
[backend]
url = "${TEST_SUPABASE_URL}"
anon_key = "anon-key-value"
"#;

        let config = SupabaseConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.url, "https://test.supabase.co");

        std::env::remove_var("TEST_SUPABASE_URL");
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let config = SupabaseConfig::new("not-a-url", "anon-key-value");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_blank_anon_key() {
        let config = SupabaseConfig::new("https://example.supabase.co", "  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[backend]
url = "https://file.supabase.co"
anon_key = "file-anon-key"
"#;
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = SupabaseConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.url, "https://file.supabase.co");
        assert_eq!(config.anon_key, "file-anon-key");
    }

    #[test]
    fn test_auth_context_from_str() {
        assert_eq!("browser".parse::<AuthContext>(), Ok(AuthContext::Browser));
        assert_eq!("server".parse::<AuthContext>(), Ok(AuthContext::Server));
        assert!("edge".parse::<AuthContext>().is_err());
    }
}
