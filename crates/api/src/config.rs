use std::collections::HashMap;
use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Root directory under which per-job scratch directories are created.
    pub scratch_root: PathBuf,
    /// Per-presentation permission overrides: presentation name to the
    /// permission list it requires. Task lists are not configurable.
    pub presentation_permissions: HashMap<String, Vec<String>>,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                            |
    /// |----------------------------|------------------------------------|
    /// | `HOST`                     | `0.0.0.0`                          |
    /// | `PORT`                     | `3000`                             |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`            |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                               |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                               |
    /// | `SCRATCH_ROOT`             | `<temp dir>/presenta-scratch`      |
    /// | `PRESENTATION_PERMISSIONS` | `{}`                               |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let scratch_root = std::env::var("SCRATCH_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("presenta-scratch"));

        let presentation_permissions = parse_permission_overrides(
            &std::env::var("PRESENTATION_PERMISSIONS").unwrap_or_else(|_| "{}".into()),
        )
        .expect("PRESENTATION_PERMISSIONS must be a JSON object of name -> permission lists");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            scratch_root,
            presentation_permissions,
            jwt,
        }
    }
}

/// Parse the `PRESENTATION_PERMISSIONS` JSON map.
fn parse_permission_overrides(
    raw: &str,
) -> Result<HashMap<String, Vec<String>>, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_no_overrides() {
        let overrides = parse_permission_overrides("{}").unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn overrides_map_names_to_permission_lists() {
        let overrides =
            parse_permission_overrides(r#"{ "example": ["curator", "reader"], "open": [] }"#)
                .unwrap();
        assert_eq!(overrides["example"], vec!["curator", "reader"]);
        assert!(overrides["open"].is_empty());
    }

    #[test]
    fn non_object_input_is_rejected() {
        assert!(parse_permission_overrides(r#"["example"]"#).is_err());
        assert!(parse_permission_overrides("not json").is_err());
    }
}
