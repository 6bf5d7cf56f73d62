//! # Access Control Module
//!
//! Admin identities, the whitelist with optional expiry, the block list and
//! usage statistics. State lives in a flat JSON document that is rewritten
//! atomically after every change.
//!
//! ```json
//! {
//!   "users": { "123456789": { "whitelisted": true, "access_expires_at": null,
//!                             "created_docs": 2, "last_seen_at": "..." } },
//!   "blocked": [987654321],
//!   "stats": { "total_docs_created": 2, "total_messages_processed": 40,
//!              "last_broadcast_at": null }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Telegram user ids allowed to use the admin panel
#[derive(Debug, Clone, Default)]
pub struct AdminIds(HashSet<u64>);

impl AdminIds {
    /// Comma separated ids; entries that are not plain digits are skipped
    pub fn parse(raw: &str) -> Self {
        let ids = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
            .filter_map(|part| part.parse().ok())
            .collect();
        Self(ids)
    }

    pub fn contains(&self, user_id: u64) -> bool {
        self.0.contains(&user_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub whitelisted: bool,
    /// `None` means permanent access once whitelisted
    #[serde(default)]
    pub access_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_docs: u64,
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total_docs_created: u64,
    #[serde(default)]
    pub total_messages_processed: u64,
    #[serde(default)]
    pub last_broadcast_at: Option<DateTime<Utc>>,
}

/// The persisted document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub users: BTreeMap<u64, UserRecord>,
    #[serde(default)]
    pub blocked: BTreeSet<u64>,
    #[serde(default)]
    pub stats: Stats,
}

/// Result of an access check, in the order the rules are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Blocked,
    NotWhitelisted,
    Expired,
}

impl AccessDecision {
    pub fn is_granted(self) -> bool {
        self == AccessDecision::Granted
    }
}

/// Snapshot for the admin statistics screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSummary {
    pub total_users: usize,
    pub active_whitelisted: usize,
    pub blocked: usize,
    pub total_docs_created: u64,
    pub total_messages_processed: u64,
    pub last_broadcast_at: Option<DateTime<Utc>>,
}

/// Malformed admin panel input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("user id must be digits only")]
    InvalidUserId,
    #[error("expected `<user_id> <days>`")]
    InvalidDuration,
}

pub fn parse_user_id(raw: &str) -> Result<u64, AccessError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(AccessError::InvalidUserId);
    }
    trimmed.parse().map_err(|_| AccessError::InvalidUserId)
}

/// `<user_id> <days>`; zero days grants permanent access
pub fn parse_duration_input(raw: &str) -> Result<(u64, u32), AccessError> {
    let mut parts = raw.split_whitespace();
    let (Some(user), Some(days), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AccessError::InvalidDuration);
    };
    let user_id = parse_user_id(user)?;
    let days = days.parse().map_err(|_| AccessError::InvalidDuration)?;
    Ok((user_id, days))
}

impl StoreData {
    fn ensure_user(&mut self, user_id: u64, now: DateTime<Utc>) -> &mut UserRecord {
        self.users.entry(user_id).or_insert_with(|| UserRecord {
            last_seen_at: Some(now),
            ..UserRecord::default()
        })
    }

    pub fn is_blocked(&self, user_id: u64) -> bool {
        self.blocked.contains(&user_id)
    }

    pub fn decision(&self, admins: &AdminIds, user_id: u64, now: DateTime<Utc>) -> AccessDecision {
        if admins.contains(user_id) {
            return AccessDecision::Granted;
        }
        if self.is_blocked(user_id) {
            return AccessDecision::Blocked;
        }
        match self.users.get(&user_id) {
            Some(user) if user.whitelisted => match user.access_expires_at {
                Some(expires) if now > expires => AccessDecision::Expired,
                _ => AccessDecision::Granted,
            },
            _ => AccessDecision::NotWhitelisted,
        }
    }

    pub fn touch(&mut self, user_id: u64, now: DateTime<Utc>) {
        self.ensure_user(user_id, now).last_seen_at = Some(now);
        self.stats.total_messages_processed += 1;
    }

    /// Flip the whitelist flag; removing access also clears any expiry
    pub fn toggle_whitelist(&mut self, user_id: u64, now: DateTime<Utc>) -> bool {
        let user = self.ensure_user(user_id, now);
        user.whitelisted = !user.whitelisted;
        if !user.whitelisted {
            user.access_expires_at = None;
        }
        user.whitelisted
    }

    pub fn grant_for_days(
        &mut self,
        user_id: u64,
        days: u32,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let expires = (days > 0).then(|| now + Duration::days(i64::from(days)));
        let user = self.ensure_user(user_id, now);
        user.whitelisted = true;
        user.access_expires_at = expires;
        expires
    }

    /// Returns whether the user is blocked after the toggle
    pub fn toggle_block(&mut self, user_id: u64) -> bool {
        if self.blocked.remove(&user_id) {
            false
        } else {
            self.blocked.insert(user_id);
            true
        }
    }

    pub fn record_document(&mut self, user_id: u64, now: DateTime<Utc>) {
        self.ensure_user(user_id, now).created_docs += 1;
        self.stats.total_docs_created += 1;
    }

    pub fn record_broadcast(&mut self, now: DateTime<Utc>) {
        self.stats.last_broadcast_at = Some(now);
    }

    /// Every known user who is not blocked
    pub fn broadcast_targets(&self) -> Vec<u64> {
        self.users
            .keys()
            .copied()
            .filter(|id| !self.is_blocked(*id))
            .collect()
    }

    pub fn summary(&self, now: DateTime<Utc>) -> StatsSummary {
        let active_whitelisted = self
            .users
            .values()
            .filter(|u| u.whitelisted && u.access_expires_at.map_or(true, |exp| now <= exp))
            .count();
        StatsSummary {
            total_users: self.users.len(),
            active_whitelisted,
            blocked: self.blocked.len(),
            total_docs_created: self.stats.total_docs_created,
            total_messages_processed: self.stats.total_messages_processed,
            last_broadcast_at: self.stats.last_broadcast_at,
        }
    }
}

/// Read the document; a missing file yields defaults, a corrupt one is logged and replaced by defaults
pub fn load_store_data(path: &Path) -> Result<StoreData> {
    if !path.exists() {
        debug!(path = %path.display(), "Access store missing, starting empty");
        return Ok(StoreData::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read access store {}", path.display()))?;
    match serde_json::from_str(&raw) {
        Ok(data) => Ok(data),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to parse access store, falling back to default");
            Ok(StoreData::default())
        }
    }
}

/// Write via a sibling temp file and rename so readers never see a half-written document
pub fn save_store_data(path: &Path, data: &StoreData) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let json = serde_json::to_string_pretty(data).context("Failed to serialize access store")?;
    let mut temp = NamedTempFile::new_in(dir).context("Failed to create temp file")?;
    temp.write_all(json.as_bytes())
        .context("Failed to write access store")?;
    temp.persist(path)
        .with_context(|| format!("Failed to replace access store {}", path.display()))?;
    Ok(())
}

/// Shared, file-backed access state
#[derive(Debug)]
pub struct AccessStore {
    path: PathBuf,
    admins: AdminIds,
    data: Mutex<StoreData>,
}

impl AccessStore {
    pub fn open(path: impl Into<PathBuf>, admins: AdminIds) -> Result<Self> {
        let path = path.into();
        let data = load_store_data(&path)?;
        info!(
            path = %path.display(),
            users = data.users.len(),
            blocked = data.blocked.len(),
            admins = admins.len(),
            "Access store loaded"
        );
        Ok(Self {
            path,
            admins,
            data: Mutex::new(data),
        })
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admins.contains(user_id)
    }

    /// Apply a change and persist the result
    async fn mutate<T>(&self, change: impl FnOnce(&mut StoreData) -> T) -> Result<T> {
        let mut data = self.data.lock().await;
        let out = change(&mut data);
        save_store_data(&self.path, &data)?;
        Ok(out)
    }

    /// Record the visit and decide whether the user may proceed
    pub async fn guard(&self, user_id: u64) -> Result<AccessDecision> {
        let now = Utc::now();
        let admins = &self.admins;
        let decision = self
            .mutate(|data| {
                data.touch(user_id, now);
                data.decision(admins, user_id, now)
            })
            .await?;
        if !decision.is_granted() {
            warn!(user_id, decision = ?decision, "Access denied");
        }
        Ok(decision)
    }

    pub async fn decision(&self, user_id: u64) -> AccessDecision {
        self.data
            .lock()
            .await
            .decision(&self.admins, user_id, Utc::now())
    }

    pub async fn toggle_whitelist(&self, user_id: u64) -> Result<bool> {
        let now = Utc::now();
        let whitelisted = self.mutate(|d| d.toggle_whitelist(user_id, now)).await?;
        info!(user_id, whitelisted, "Whitelist updated");
        Ok(whitelisted)
    }

    pub async fn grant_for_days(&self, user_id: u64, days: u32) -> Result<Option<DateTime<Utc>>> {
        let now = Utc::now();
        let expires = self.mutate(|d| d.grant_for_days(user_id, days, now)).await?;
        info!(user_id, days, expires_at = ?expires, "Access duration set");
        Ok(expires)
    }

    pub async fn toggle_block(&self, user_id: u64) -> Result<bool> {
        let blocked = self.mutate(|d| d.toggle_block(user_id)).await?;
        info!(user_id, blocked, "Block list updated");
        Ok(blocked)
    }

    pub async fn record_document(&self, user_id: u64) -> Result<()> {
        let now = Utc::now();
        self.mutate(|d| d.record_document(user_id, now)).await
    }

    pub async fn record_broadcast(&self) -> Result<()> {
        let now = Utc::now();
        self.mutate(|d| d.record_broadcast(now)).await
    }

    pub async fn broadcast_targets(&self) -> Vec<u64> {
        self.data.lock().await.broadcast_targets()
    }

    pub async fn summary(&self) -> StatsSummary {
        self.data.lock().await.summary(Utc::now())
    }
}
