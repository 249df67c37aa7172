pub mod notification;
pub mod profile;
pub mod time;

use serde::{Deserialize, Serialize};

/// Identifies a user as the auth provider reports it.
#[derive(Clone, Debug, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// True for absolute `http://` or `https://` URLs with a host.
pub fn is_http_url(candidate: &str) -> bool {
    match url::Url::parse(candidate.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_urls() {
        assert!(is_http_url("https://github.com/alex_dev"));
        assert!(is_http_url("http://localhost:3000/u/alex"));
        assert!(!is_http_url("ftp://example.com/file"));
        assert!(!is_http_url("javascript:alert(1)"));
        assert!(!is_http_url("github.com/alex_dev"));
        assert!(!is_http_url(""));
    }

    #[test]
    fn test_user_id_is_a_plain_json_string() {
        let id = UserId::new("u_alex");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u_alex\"");
        assert_eq!(id.to_string(), "u_alex");
    }
}
