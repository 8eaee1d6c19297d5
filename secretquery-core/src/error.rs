//! Secrets Manager error kinds and formatting

use std::fmt;

use thiserror::Error;

/// Failure conditions when fetching a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretErrorKind {
    NotFound,
    InvalidRequest,
    InvalidParameter,
    DecryptionFailure,
    InternalServiceError,
    /// The service answered, but without a `SecretString`
    NoSecretString,
    /// Unmapped service code, or no code at all (transport failures)
    Unknown(Option<String>),
}

impl SecretErrorKind {
    /// Map a Secrets Manager error code to a kind
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("ResourceNotFoundException") => Self::NotFound,
            Some("InvalidRequestException") => Self::InvalidRequest,
            Some("InvalidParameterException") => Self::InvalidParameter,
            Some("DecryptionFailure") => Self::DecryptionFailure,
            Some("InternalServiceError") => Self::InternalServiceError,
            other => Self::Unknown(other.map(str::to_string)),
        }
    }

    /// The Secrets Manager error code this kind stands for
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::NotFound => Some("ResourceNotFoundException"),
            Self::InvalidRequest => Some("InvalidRequestException"),
            Self::InvalidParameter => Some("InvalidParameterException"),
            Self::DecryptionFailure => Some("DecryptionFailure"),
            Self::InternalServiceError => Some("InternalServiceError"),
            Self::NoSecretString => None,
            Self::Unknown(code) => code.as_deref(),
        }
    }

    /// Legacy sentinel code, as returned in place of a secret by older callers
    pub fn sentinel(&self) -> Option<&'static str> {
        match self {
            Self::NotFound => Some("-1"),
            Self::InvalidRequest => Some("-2"),
            Self::InvalidParameter => Some("-3"),
            Self::DecryptionFailure => Some("-4"),
            Self::InternalServiceError => Some("-5"),
            Self::NoSecretString => Some("-6"),
            Self::Unknown(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::InvalidRequest => "InvalidRequest",
            Self::InvalidParameter => "InvalidParameter",
            Self::DecryptionFailure => "DecryptionFailure",
            Self::InternalServiceError => "InternalServiceError",
            Self::NoSecretString => "NoSecretString",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for SecretErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(Some(code)) => write!(f, "Unknown({})", code),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// A failed secret fetch
#[derive(Debug, Error)]
#[error("{kind} for secret {secret_name}: {message}")]
pub struct FetchError {
    pub kind: SecretErrorKind,
    pub secret_name: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl FetchError {
    pub fn new(kind: SecretErrorKind, secret_name: impl Into<String>) -> Self {
        Self {
            kind,
            secret_name: secret_name.into(),
            message: String::new(),
            request_id: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Shorthand for `self.kind.sentinel()`
    pub fn sentinel(&self) -> Option<&'static str> {
        self.kind.sentinel()
    }
}
