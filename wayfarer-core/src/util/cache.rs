use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, Utc};
use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{MemberId, RoomId};

pub type ArcedCache = Arc<dyn ClientCache>;

/// Identifies an entry in the client cache.
/// Answers are scoped per member, everything else per room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Answers { room_id: RoomId, member_id: MemberId },
    Questions(RoomId),
    Suggestions(RoomId),
}

/// A cached value along with the time it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub written_at: DateTime<Utc>,
}

/// Durable storage local to one member's device.
///
/// Implementations never fail loudly. A value that cannot be read is a miss.
pub trait ClientCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;
    fn put(&self, key: CacheKey, entry: CacheEntry);
    fn remove(&self, key: &CacheKey);
}

/// Typed helpers on top of [ClientCache]
pub trait ClientCacheExt {
    /// Reads and deserializes a value if it was written within `ttl` of `now`.
    fn read_fresh<T>(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Option<T>
    where
        T: DeserializeOwned;

    /// Serializes and stores a value, stamped with `now`.
    fn write<T>(&self, key: CacheKey, value: &T, now: DateTime<Utc>)
    where
        T: Serialize;
}

impl CacheKey {
    /// A flat representation, safe to use as a file name.
    pub fn as_flat(&self) -> String {
        match self {
            CacheKey::Answers { room_id, member_id } => format!("answers-{room_id}-{member_id}"),
            CacheKey::Questions(room_id) => format!("questions-{room_id}"),
            CacheKey::Suggestions(room_id) => format!("suggestions-{room_id}"),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_flat())
    }
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.written_at < ttl
    }
}

impl<C> ClientCacheExt for C
where
    C: ClientCache + ?Sized,
{
    fn read_fresh<T>(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let entry = self.get(key)?;

        if !entry.is_fresh(now, ttl) {
            self.remove(key);
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.remove(key);
                None
            }
        }
    }

    fn write<T>(&self, key: CacheKey, value: &T, now: DateTime<Utc>)
    where
        T: Serialize,
    {
        match serde_json::to_value(value) {
            Ok(value) => self.put(
                key,
                CacheEntry {
                    value,
                    written_at: now,
                },
            ),
            Err(e) => warn!("Could not serialize cache entry {}: {}", key, e),
        }
    }
}

/// An in-process cache for tests within this crate
#[cfg(test)]
#[derive(Default)]
pub(crate) struct TestCache {
    entries: parking_lot::Mutex<std::collections::HashMap<CacheKey, CacheEntry>>,
}

#[cfg(test)]
impl ClientCache for TestCache {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) {
        self.entries.lock().insert(key, entry);
    }

    fn remove(&self, key: &CacheKey) {
        self.entries.lock().remove(key);
    }
}
