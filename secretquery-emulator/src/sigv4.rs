//! SigV4 credential scope parsing
//!
//! Signatures are not verified; the emulator only needs to know which
//! region (and access key) a request was signed for.

use axum::http::{header, HeaderMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigV4Error {
    #[error("Invalid authorization header format")]
    InvalidAuthFormat,

    #[error("Missing credential")]
    MissingCredential,

    #[error("Invalid credential format")]
    InvalidCredentialFormat,
}

/// The `Credential=` scope of a SigV4 authorization header
#[derive(Debug, PartialEq, Eq)]
pub struct CredentialScope {
    pub access_key: String,
    pub date: String,
    pub region: String,
    pub service: String,
}

/// Parse the credential scope out of an AWS SigV4 authorization header
///
/// Format: AWS4-HMAC-SHA256 Credential=AKID/DATE/REGION/SERVICE/aws4_request,
///         SignedHeaders=host;x-amz-date, Signature=HEX
pub fn parse_credential_scope(header: &str) -> Result<CredentialScope, SigV4Error> {
    let (_algorithm, components) = header
        .split_once(' ')
        .ok_or(SigV4Error::InvalidAuthFormat)?;

    let credential = components
        .split(',')
        .filter_map(|component| component.trim().split_once('='))
        .find(|(key, _)| *key == "Credential")
        .map(|(_, value)| value)
        .ok_or(SigV4Error::MissingCredential)?;

    let parts: Vec<&str> = credential.split('/').collect();
    if parts.len() != 5 || parts[4] != "aws4_request" {
        return Err(SigV4Error::InvalidCredentialFormat);
    }

    Ok(CredentialScope {
        access_key: parts[0].to_string(),
        date: parts[1].to_string(),
        region: parts[2].to_string(),
        service: parts[3].to_string(),
    })
}

/// Region a request was signed for, if it was signed
pub fn request_region(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse_credential_scope(value).ok().map(|scope| scope.region)
}
