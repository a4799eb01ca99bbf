//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first, if present.

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase Web API key (public, identifies the project to Identity Toolkit)
    pub firebase_api_key: String,
    /// Firebase/GCP project ID (Firestore database)
    pub firebase_project_id: String,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Interface to bind; loopback by default
    pub bind_addr: String,
    /// Server port
    pub port: u16,
    /// Where the theme preference is stored
    pub theme_file: PathBuf,
    /// System theme preference used when nothing is stored
    pub prefers_dark: bool,
    /// `host:port` of the Firebase Auth emulator, if used
    pub auth_emulator_host: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            firebase_api_key: "test_api_key".to_string(),
            firebase_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            theme_file: env::temp_dir().join("engageperfect-theme-test"),
            prefers_dark: false,
            auth_emulator_host: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            theme_file: env::var("THEME_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".engageperfect-theme")),
            prefers_dark: env::var("PREFERS_DARK")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            auth_emulator_host: env::var("FIREBASE_AUTH_EMULATOR_HOST")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }

    /// Socket address to listen on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
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
        // Set required env vars for test
        env::set_var("FIREBASE_API_KEY", " test_key ");
        env::set_var("FIREBASE_PROJECT_ID", "test-project");
        env::set_var("PREFERS_DARK", "yes");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.firebase_api_key, "test_key");
        assert_eq!(config.firebase_project_id, "test-project");
        assert!(config.prefers_dark);
        assert_eq!(config.listen_addr(), format!("{}:{}", config.bind_addr, config.port));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("no"));
        assert!(!parse_flag(""));
    }
}
