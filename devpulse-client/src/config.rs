use std::path::PathBuf;

use devpulse_types::{UserId, is_http_url};

/// Who a signed-out session acts as.
pub const DEMO_USER_ID: &str = "me_demo";

const API_URL_VAR: &str = "DEVPULSE_API_URL";
const DATA_DIR_VAR: &str = "DEVPULSE_DATA_DIR";
const USER_ID_VAR: &str = "DEVPULSE_USER_ID";
const ACCESS_TOKEN_VAR: &str = "DEVPULSE_ACCESS_TOKEN";

const DEFAULT_DATA_DIR: &str = "devpulse-data";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is set but empty")]
    Empty(&'static str),

    #[error("{var} must be an http(s) URL, got `{value}`")]
    InvalidUrl { var: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// `None` runs the session offline.
    pub api_base_url: Option<String>,
    pub data_dir: PathBuf,
    pub user_id: Option<UserId>,
    pub access_token: Option<String>,
}

impl Config {
    /// Read configuration from the environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |var: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(var) {
                None => Ok(None),
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(var)),
                Some(value) => Ok(Some(value.trim().to_string())),
            }
        };

        let api_base_url = match read(API_URL_VAR)? {
            Some(url) if !is_http_url(&url) => {
                return Err(ConfigError::InvalidUrl {
                    var: API_URL_VAR,
                    value: url,
                });
            }
            Some(url) => Some(url.trim_end_matches('/').to_string()),
            None => default_api_base_url().map(str::to_string),
        };

        Ok(Self {
            api_base_url,
            data_dir: read(DATA_DIR_VAR)?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            user_id: read(USER_ID_VAR)?.map(UserId::new),
            access_token: read(ACCESS_TOKEN_VAR)?,
        })
    }

    /// The signed-in user, or the demo user when signed out.
    pub fn acting_user(&self) -> UserId {
        self.user_id
            .clone()
            .unwrap_or_else(|| UserId::from(DEMO_USER_ID))
    }
}

fn default_api_base_url() -> Option<&'static str> {
    if cfg!(feature = "local-backend") {
        Some("http://localhost:3000")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("devpulse-data"));
        assert_eq!(config.acting_user(), UserId::from("me_demo"));
        assert_eq!(config.access_token, None);
        if cfg!(feature = "local-backend") {
            assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:3000"));
        } else {
            assert_eq!(config.api_base_url, None);
        }
    }

    #[test]
    fn test_explicit_values() {
        let config = config(&[
            ("DEVPULSE_API_URL", "https://api.devpulse.test/"),
            ("DEVPULSE_DATA_DIR", "/tmp/devpulse"),
            ("DEVPULSE_USER_ID", "user_2x"),
        ])
        .unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("https://api.devpulse.test"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/devpulse"));
        assert_eq!(config.acting_user(), UserId::from("user_2x"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            config(&[("DEVPULSE_USER_ID", "  ")]),
            Err(ConfigError::Empty("DEVPULSE_USER_ID"))
        );
        assert_eq!(
            config(&[("DEVPULSE_API_URL", "localhost:3000")]),
            Err(ConfigError::InvalidUrl {
                var: "DEVPULSE_API_URL",
                value: "localhost:3000".to_string()
            })
        );
    }
}
