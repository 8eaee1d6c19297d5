//! Credentials carried inside a secret

use serde::Deserialize;

/// Database-style credentials stored as a JSON secret
///
/// Only `username` is required; any other field in the secret is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
}

impl Credentials {
    /// Parse credentials from a secret's string payload
    pub fn from_json(secret: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_username() {
        let credentials =
            Credentials::from_json(r#"{"username": "alice", "password": "hunter2"}"#).unwrap();
        assert_eq!(credentials.username, "alice");
    }

    #[test]
    fn test_missing_username_fails() {
        assert!(Credentials::from_json(r#"{"password": "hunter2"}"#).is_err());
    }

    #[test]
    fn test_non_json_fails() {
        assert!(Credentials::from_json("-1").is_err());
        assert!(Credentials::from_json("not json").is_err());
    }
}
