//! Account and region scoped state management

use dashmap::DashMap;
use std::hash::Hash;

/// Account used when a request carries no identity
pub const DEFAULT_ACCOUNT_ID: &str = "000000000000";

/// Region used when a request is unsigned
pub const DEFAULT_REGION: &str = "us-east-1";

/// Key for account and region scoped state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountRegionKey {
    pub account_id: String,
    pub region: String,
}

impl AccountRegionKey {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
        }
    }

    /// ARN of a secret in this scope
    pub fn secret_arn(&self, name: &str, suffix: &str) -> String {
        format!(
            "arn:aws:secretsmanager:{}:{}:secret:{}-{}",
            self.region, self.account_id, name, suffix
        )
    }
}

/// Thread-safe state store with account/region scoping
pub struct StateStore<T> {
    data: DashMap<AccountRegionKey, T>,
}

impl<T> Default for StateStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StateStore<T> {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Get or create state for an account/region
    pub fn get_or_create(
        &self,
        key: &AccountRegionKey,
    ) -> dashmap::mapref::one::RefMut<'_, AccountRegionKey, T>
    where
        T: Default,
    {
        self.data.entry(key.clone()).or_default()
    }

    /// Get state for an account/region if it exists
    pub fn get(
        &self,
        key: &AccountRegionKey,
    ) -> Option<dashmap::mapref::one::Ref<'_, AccountRegionKey, T>> {
        self.data.get(key)
    }
}
