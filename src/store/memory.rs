// ABOUTME: In-memory key-value backend with TTL support for tests and single-node development
// ABOUTME: Matches RedisStore semantics including cursor-paged scans over a sorted key snapshot
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::KeyValueStore;
use crate::errors::AppResult;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }
}

/// In-process backend mirroring the Redis semantics the token store relies on.
///
/// Expired entries are dropped lazily on access; there is no background
/// sweeper. A scan cursor resumes strictly after the last key the previous
/// page returned, so deleting a page's keys before fetching the next never
/// shifts later keys out of the scan - the Redis SCAN guarantee that keys
/// present for the whole scan are visited.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    scan_cursors: DashMap<u64, String>,
    next_cursor: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        // Cursor ids start at 1; 0 means "fresh scan" / "scan finished"
        Self {
            entries: DashMap::new(),
            scan_cursors: DashMap::new(),
            next_cursor: AtomicU64::new(1),
        }
    }
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simple glob match supporting a single trailing `*`
    fn matches(pattern: &str, key: &str) -> bool {
        pattern.strip_suffix('*').map_or_else(
            || pattern == key,
            |prefix| key.starts_with(prefix),
        )
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()> {
        self.entries
            .insert(key.to_owned(), Entry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.data.clone()));
            }
        }
        // Drop expired entries on access
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired() => {
                entry.expires_at = Instant::now() + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        match self.entries.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn scan_page(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> AppResult<(u64, Vec<String>)> {
        let resume_after = if cursor == 0 {
            None
        } else {
            self.scan_cursors.get(&cursor).map(|e| e.value().clone())
        };

        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired() && Self::matches(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .filter(|key| match &resume_after {
                Some(after) => key > after,
                None => true,
            })
            .collect();
        keys.sort_unstable();

        let page: Vec<String> = keys.into_iter().take(count.max(1)).collect();
        let next_cursor = match page.last() {
            Some(last) if page.len() >= count.max(1) => {
                let id = if cursor == 0 {
                    self.next_cursor.fetch_add(1, Ordering::Relaxed)
                } else {
                    cursor
                };
                self.scan_cursors.insert(id, last.clone());
                id
            }
            _ => {
                if cursor != 0 {
                    self.scan_cursors.remove(&cursor);
                }
                0
            }
        };
        Ok((next_cursor, page))
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        Ok(self
            .entries
            .get(key)
            .and_then(|entry| entry.remaining_ttl()))
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let store = MemoryStore::new();
        store
            .set_ex("k", b"v", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.get("k").await.unwrap().is_none());
        assert!(!store.expire("k", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn scan_pages_cover_all_matching_keys() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store
                .set_ex(&format!("p:{i:02}"), b"x", Duration::from_secs(5))
                .await
                .unwrap();
        }
        store
            .set_ex("other:0", b"x", Duration::from_secs(5))
            .await
            .unwrap();

        let mut seen = Vec::new();
        let mut cursor = 0;
        loop {
            let (next, page) = store.scan_page(cursor, "p:*", 10).await.unwrap();
            seen.extend(page);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        assert_eq!(seen.len(), 25);
        assert!(seen.iter().all(|k| k.starts_with("p:")));
    }

    #[tokio::test]
    async fn scan_visits_every_key_when_pages_are_deleted_mid_scan() {
        let store = MemoryStore::new();
        for i in 0..30 {
            store
                .set_ex(&format!("p:{i:02}"), b"x", Duration::from_secs(5))
                .await
                .unwrap();
        }

        // Delete each page before fetching the next, the way bulk revocation
        // does; later keys must not shift out of the scan.
        let mut seen = Vec::new();
        let mut cursor = 0;
        loop {
            let (next, page) = store.scan_page(cursor, "p:*", 10).await.unwrap();
            for key in &page {
                assert!(store.delete(key).await.unwrap());
            }
            seen.extend(page);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 30);
    }
}
