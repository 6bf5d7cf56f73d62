//! # Inventory Module
//!
//! Per-user staging area that accumulates single accounts across several
//! submissions before they are exported together.
//!
//! Storage sits behind the [`InventoryStore`] trait so the in-memory table can
//! be swapped for the Postgres-backed one in [`crate::db`] without touching
//! the bot handlers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::credential_parser::CredentialRecord;
use crate::credential_patterns::{COOKIE_UID_REGEX, COOKIE_XS_REGEX, PASSWORD_REGEX, UID_REGEX};

/// One staged account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub uid: String,
    /// Empty when the user skipped the password step
    pub password: String,
    pub cookie: String,
    pub created_at: DateTime<Utc>,
}

impl From<&InventoryEntry> for CredentialRecord {
    fn from(entry: &InventoryEntry) -> Self {
        CredentialRecord {
            uid: entry.uid.clone(),
            password: entry.password.clone(),
            cookie: entry.cookie.clone(),
        }
    }
}

/// Summary of the latest input, shown by the info screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryMeta {
    pub last_uid: String,
    pub last_password_empty: bool,
    pub last_input_at: Option<DateTime<Utc>>,
}

/// Reasons a staged cookie or password is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("cookie must contain c_user=")]
    MissingCUser,
    #[error("cookie must contain xs=")]
    MissingXs,
    #[error("could not read a valid UID from c_user=")]
    UidNotDetected,
    #[error("password must be 6-64 characters without spaces")]
    InvalidPassword,
}

/// The inventory cookie check is looser than the document one: only the two keys matter
pub fn validate_inventory_cookie(cookie: &str) -> Result<(), InventoryError> {
    if !cookie.contains("c_user=") {
        return Err(InventoryError::MissingCUser);
    }
    if !COOKIE_XS_REGEX.is_match(cookie) {
        return Err(InventoryError::MissingXs);
    }
    Ok(())
}

/// The `c_user` value, if it is a well-formed UID
pub fn extract_uid(cookie: &str) -> Option<String> {
    let uid = COOKIE_UID_REGEX.captures(cookie)?.get(1)?.as_str().trim();
    UID_REGEX.is_match(uid).then(|| uid.to_string())
}

/// Validate a cookie and pull its UID in one step
pub fn accept_inventory_cookie(cookie: &str) -> Result<String, InventoryError> {
    validate_inventory_cookie(cookie)?;
    extract_uid(cookie).ok_or(InventoryError::UidNotDetected)
}

pub fn validate_inventory_password(password: &str) -> Result<(), InventoryError> {
    if PASSWORD_REGEX.is_match(password) {
        Ok(())
    } else {
        Err(InventoryError::InvalidPassword)
    }
}

/// Keyed per-user staging table
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn add_entry(
        &self,
        user_id: i64,
        uid: &str,
        password: &str,
        cookie: &str,
    ) -> anyhow::Result<InventoryEntry>;

    /// Entries in insertion order
    async fn entries(&self, user_id: i64) -> anyhow::Result<Vec<InventoryEntry>>;

    async fn meta(&self, user_id: i64) -> anyhow::Result<InventoryMeta>;

    async fn count(&self, user_id: i64) -> anyhow::Result<usize> {
        Ok(self.entries(user_id).await?.len())
    }

    /// Drop every entry and the meta for a user
    async fn clear(&self, user_id: i64) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
struct UserInventory {
    entries: Vec<InventoryEntry>,
    meta: InventoryMeta,
}

/// Process-local store; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    users: RwLock<HashMap<i64, UserInventory>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn add_entry(
        &self,
        user_id: i64,
        uid: &str,
        password: &str,
        cookie: &str,
    ) -> anyhow::Result<InventoryEntry> {
        let now = Utc::now();
        let entry = InventoryEntry {
            uid: uid.to_string(),
            password: password.to_string(),
            cookie: cookie.to_string(),
            created_at: now,
        };

        let mut users = self.users.write().await;
        let inventory = users.entry(user_id).or_default();
        inventory.entries.push(entry.clone());
        inventory.meta = InventoryMeta {
            last_uid: uid.to_string(),
            last_password_empty: password.is_empty(),
            last_input_at: Some(now),
        };

        debug!(user_id, total = inventory.entries.len(), "Inventory entry staged");
        Ok(entry)
    }

    async fn entries(&self, user_id: i64) -> anyhow::Result<Vec<InventoryEntry>> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .map(|inventory| inventory.entries.clone())
            .unwrap_or_default())
    }

    async fn meta(&self, user_id: i64) -> anyhow::Result<InventoryMeta> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .map(|inventory| inventory.meta.clone())
            .unwrap_or_default())
    }

    async fn clear(&self, user_id: i64) -> anyhow::Result<()> {
        if self.users.write().await.remove(&user_id).is_some() {
            info!(user_id, "Inventory cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_uid() {
        assert_eq!(
            extract_uid("datr=x; c_user=100012345678;xs=abc"),
            Some("100012345678".to_string())
        );
        assert_eq!(extract_uid("c_user=123;xs=abc"), None);
        assert_eq!(extract_uid("xs=abc"), None);
    }

    #[test]
    fn test_inventory_cookie_rules() {
        assert_eq!(
            validate_inventory_cookie("xs=abc;"),
            Err(InventoryError::MissingCUser)
        );
        // xs= must start a key, not sit inside another value
        assert_eq!(
            validate_inventory_cookie("c_user=12345678;fooxs=abc"),
            Err(InventoryError::MissingXs)
        );
        assert!(validate_inventory_cookie("c_user=12345678; xs=abc").is_ok());
    }
}
