//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets as environment variables via secret bindings,
//! so everything is read once at startup and held in memory.

use std::env;

/// Workspace domain whose Google accounts may receive a `full_admin` session.
pub const DEFAULT_WORKSPACE_DOMAIN: &str = "434media.com";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    pub environment: Environment,
    /// Public site URL, used to build absolute redirects
    pub site_url: String,
    /// GCP project holding the primary Firestore database
    pub gcp_project_id: String,
    /// Firebase project that issues CRM-only ID tokens
    pub firebase_project_id: Option<String>,
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// OAuth callback registered with Google
    pub google_redirect_uri: String,
    /// Google Workspace domain allowed to become full admins
    pub workspace_domain: String,
    /// Origins allowed to call `/api/public/**`
    pub allowed_origins: Vec<String>,
    /// Firestore project being migrated away from
    pub legacy_firestore_project_id: Option<String>,
    /// Airtable base holding legacy records
    pub airtable_base_id: Option<String>,
    /// Server port
    pub port: u16,

    // --- Upstream endpoints (overridable for tests) ---
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,
    pub airtable_api_url: String,
    /// Signing keys for Firebase ID tokens
    pub firebase_jwks_url: String,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Optional key required in `x-api-key` on public routes
    pub public_api_key: Option<String>,
    pub airtable_api_key: Option<String>,

    // --- Analytics integrations (reported, not queried) ---
    pub ga4_property_id: Option<String>,
    pub mailchimp_api_key: Option<String>,
    pub linkedin_access_token: Option<String>,
    pub instagram_access_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env_value(env::var("APP_ENV").ok().as_deref());
        let site_url = env::var("SITE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let google_redirect_uri = env::var("GOOGLE_REDIRECT_URI")
            .unwrap_or_else(|_| format!("{}/api/auth/google/callback", site_url));

        Ok(Self {
            environment,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            firebase_project_id: optional_var("FIREBASE_PROJECT_ID"),
            google_client_id: optional_var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_redirect_uri,
            workspace_domain: optional_var("WORKSPACE_DOMAIN")
                .unwrap_or_else(|| DEFAULT_WORKSPACE_DOMAIN.to_string()),
            allowed_origins: parse_origins(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
            legacy_firestore_project_id: optional_var("LEGACY_FIRESTORE_PROJECT_ID"),
            airtable_base_id: optional_var("AIRTABLE_BASE_ID"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            google_auth_url: GOOGLE_AUTH_URL.to_string(),
            google_token_url: GOOGLE_TOKEN_URL.to_string(),
            google_userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            airtable_api_url: AIRTABLE_API_URL.to_string(),
            firebase_jwks_url: FIREBASE_JWKS_URL.to_string(),

            google_client_secret: optional_var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            public_api_key: optional_var("PUBLIC_API_KEY"),
            airtable_api_key: optional_var("AIRTABLE_API_KEY"),
            ga4_property_id: optional_var("GA4_PROPERTY_ID"),
            mailchimp_api_key: optional_var("MAILCHIMP_API_KEY"),
            linkedin_access_token: optional_var("LINKEDIN_ACCESS_TOKEN"),
            instagram_access_token: optional_var("INSTAGRAM_ACCESS_TOKEN"),
            site_url,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            site_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            firebase_project_id: Some("test-firebase".to_string()),
            google_client_id: "test_client_id".to_string(),
            google_redirect_uri: "http://localhost:3000/api/auth/google/callback".to_string(),
            workspace_domain: DEFAULT_WORKSPACE_DOMAIN.to_string(),
            allowed_origins: vec!["https://www.434media.com".to_string()],
            legacy_firestore_project_id: None,
            airtable_base_id: Some("appTestBase".to_string()),
            port: 8080,
            google_auth_url: GOOGLE_AUTH_URL.to_string(),
            google_token_url: "http://127.0.0.1:9/token".to_string(),
            google_userinfo_url: "http://127.0.0.1:9/userinfo".to_string(),
            airtable_api_url: "http://127.0.0.1:9/v0".to_string(),
            firebase_jwks_url: "http://127.0.0.1:9/jwks".to_string(),
            google_client_secret: "test_secret".to_string(),
            public_api_key: None,
            airtable_api_key: Some("test_airtable_key".to_string()),
            ga4_property_id: Some("properties/123".to_string()),
            mailchimp_api_key: None,
            linkedin_access_token: None,
            instagram_access_token: None,
        }
    }

    /// The server cannot start without OAuth credentials; the migrate CLI can.
    pub fn require_google_oauth(&self) -> Result<(), ConfigError> {
        if self.google_client_id.is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_ID"));
        }
        if self.google_client_secret.is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_SECRET"));
        }
        Ok(())
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("GOOGLE_CLIENT_ID", "test_id");
        env::set_var("GOOGLE_CLIENT_SECRET", " test_secret ");
        env::set_var("SITE_URL", "https://www.434media.com/");
        env::set_var("ALLOWED_ORIGINS", "https://devsa.community, https://txmx.com/");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.google_client_id, "test_id");
        assert_eq!(config.google_client_secret, "test_secret");
        assert_eq!(config.site_url, "https://www.434media.com");
        assert_eq!(
            config.google_redirect_uri,
            "https://www.434media.com/api/auth/google/callback"
        );
        assert_eq!(
            config.allowed_origins,
            vec!["https://devsa.community", "https://txmx.com"]
        );
    }

    #[test]
    fn test_require_google_oauth() {
        let mut config = Config::test_default();
        assert!(config.require_google_oauth().is_ok());

        config.google_client_secret.clear();
        assert!(matches!(
            config.require_google_oauth(),
            Err(ConfigError::Missing("GOOGLE_CLIENT_SECRET"))
        ));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_env_value(Some("production")),
            Environment::Production
        );
        assert_eq!(
            Environment::from_env_value(Some(" Production ")),
            Environment::Production
        );
        assert_eq!(
            Environment::from_env_value(Some("staging")),
            Environment::Development
        );
        assert_eq!(Environment::from_env_value(None), Environment::Development);
    }

    #[test]
    fn test_parse_origins_skips_empty() {
        assert!(parse_origins("").is_empty());
        assert_eq!(parse_origins(" a ,, b"), vec!["a", "b"]);
    }
}
