use super::io::{atomic_write, decode, encode, read_optional};
use super::layout::StoreLayout;
use crate::core::{InstanceId, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;

/// Instance id -> pending timer deadline, ordered by deadline.
///
/// Each id appears at most once. Expired lookups return the earliest deadline
/// first; equal deadlines are ordered by ascending instance id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<InstanceId, DateTime<Utc>>",
    into = "BTreeMap<InstanceId, DateTime<Utc>>"
)]
pub struct TimerTable {
    by_id: BTreeMap<InstanceId, DateTime<Utc>>,
    by_deadline: BTreeSet<(DateTime<Utc>, InstanceId)>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears the deadline of `id`. Returns whether the table changed.
    pub fn set(&mut self, id: InstanceId, expires_at: Option<DateTime<Utc>>) -> bool {
        let previous = match expires_at {
            Some(at) => self.by_id.insert(id, at),
            None => self.by_id.remove(&id),
        };
        if let Some(old) = previous {
            self.by_deadline.remove(&(old, id));
        }
        if let Some(at) = expires_at {
            self.by_deadline.insert((at, id));
        }
        previous != expires_at
    }

    pub fn get(&self, id: InstanceId) -> Option<DateTime<Utc>> {
        self.by_id.get(&id).copied()
    }

    /// First instance whose deadline is strictly before `now`.
    pub fn first_expired(&self, now: DateTime<Utc>) -> Option<InstanceId> {
        self.by_deadline
            .first()
            .filter(|(at, _)| *at < now)
            .map(|(_, id)| *id)
    }

    /// Entries in deadline order.
    pub fn entries(&self) -> Vec<(InstanceId, DateTime<Utc>)> {
        self.by_deadline.iter().map(|(at, id)| (*id, *at)).collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl From<BTreeMap<InstanceId, DateTime<Utc>>> for TimerTable {
    fn from(by_id: BTreeMap<InstanceId, DateTime<Utc>>) -> Self {
        let by_deadline = by_id.iter().map(|(id, at)| (*at, *id)).collect();
        Self { by_id, by_deadline }
    }
}

impl From<TimerTable> for BTreeMap<InstanceId, DateTime<Utc>> {
    fn from(table: TimerTable) -> Self {
        table.by_id
    }
}

/// Index of instances waiting on a timer.
#[async_trait]
pub trait TimerIndex: Send + Sync {
    /// Records the deadline of `id`, or clears it when `expires_at` is `None`.
    async fn record_timer(&self, id: InstanceId, expires_at: Option<DateTime<Utc>>) -> Result<()>;

    async fn remove(&self, id: InstanceId) -> Result<()> {
        self.record_timer(id, None).await
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Option<InstanceId>>;

    async fn entries(&self) -> Result<Vec<(InstanceId, DateTime<Utc>)>>;
}

/// Timer index persisted as a single `TimerTable` JSON blob.
///
/// Every change re-reads the blob, applies the change and rewrites it whole.
/// A missing file reads as an empty table.
#[derive(Debug)]
pub struct FileTimerIndex {
    layout: StoreLayout,
    pretty: bool,
    write_lock: Mutex<()>,
}

impl FileTimerIndex {
    pub fn new(layout: StoreLayout, pretty: bool) -> Self {
        Self {
            layout,
            pretty,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Result<TimerTable> {
        let path = self.layout.timer_table_path();
        match read_optional(&path).await? {
            Some(bytes) => decode(&path, &bytes),
            None => Ok(TimerTable::new()),
        }
    }

    async fn store(&self, table: &TimerTable) -> Result<()> {
        let bytes = encode(table, self.pretty)?;
        atomic_write(&self.layout.timer_table_path(), &bytes).await
    }
}

#[async_trait]
impl TimerIndex for FileTimerIndex {
    async fn record_timer(&self, id: InstanceId, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.load().await?;
        if table.set(id, expires_at) {
            self.store(&table).await?;
        }
        Ok(())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Option<InstanceId>> {
        Ok(self.load().await?.first_expired(now))
    }

    async fn entries(&self) -> Result<Vec<(InstanceId, DateTime<Utc>)>> {
        Ok(self.load().await?.entries())
    }
}
