//! Core types for SecretQuery
//!
//! This crate provides the types shared by the secret fetcher, the Lambda
//! handler and the test emulator.

pub mod credentials;
pub mod envelope;
pub mod error;

pub use credentials::Credentials;
pub use envelope::ResponseEnvelope;
pub use error::{FetchError, SecretErrorKind};
