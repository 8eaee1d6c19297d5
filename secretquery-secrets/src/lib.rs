//! Secret retrieval for SecretQuery
//!
//! Provides:
//! - [`SecretSource`], the seam the query layer fetches through
//! - [`SecretFetcher`], the AWS Secrets Manager implementation

pub mod fetcher;
pub mod source;

pub use fetcher::{FetcherConfig, SecretFetcher, DEFAULT_REGION};
pub use source::{Secret, SecretSource};
