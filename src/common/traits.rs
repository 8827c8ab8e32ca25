//! Shared traits and interfaces
//!
//! Seams for the parts of the service that touch the outside world, so tests
//! can substitute deterministic versions.

use crate::errors::CasinoResult;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::{
    collections::HashSet,
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Source of wall-clock time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;

    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_ms() as i64)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Answers whether a Telegram user is subscribed to the project channel
#[async_trait]
pub trait ChannelMembership: Send + Sync {
    async fn is_member(&self, telegram_id: i64) -> CasinoResult<bool>;
}

/// Membership from a fixed list, loaded from configuration
#[derive(Debug, Default, Clone)]
pub struct StaticMembership {
    members: HashSet<i64>,
}

impl StaticMembership {
    pub fn new(members: impl IntoIterator<Item = i64>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ChannelMembership for StaticMembership {
    async fn is_member(&self, telegram_id: i64) -> CasinoResult<bool> {
        Ok(self.members.contains(&telegram_id))
    }
}
