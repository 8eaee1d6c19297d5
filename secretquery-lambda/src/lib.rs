//! SecretQuery Lambda function
//!
//! Fetches database credentials from AWS Secrets Manager, simulates a query
//! with them, and answers in the API Gateway proxy response shape.
//!
//! Call chain: [`handler::handle`] → [`query::simulate`] →
//! [`secretquery_secrets::SecretSource::fetch`].

pub mod config;
pub mod handler;
pub mod query;

pub use config::{Overrides, Settings};
pub use handler::{handle, invoke, parse_event, query_argument};
pub use query::{simulate, QueryError};
