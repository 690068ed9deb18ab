pub mod entry;

use crate::error::{MinidisError, MinidisResult};
use crate::glob::glob_match;
use crate::types::RedisValue;
use crate::types::hash::RedisHash;
use crate::types::list::RedisList;
use entry::{Entry, now_millis};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The whole keyspace: every key, its typed value and its deadline.
///
/// Expired keys are evicted lazily: every accessor checks the deadline first
/// and treats a passed one as absence, removing the entry on the way.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Keyspace {
    data: HashMap<String, Entry>,
}

impl Keyspace {
    pub fn new() -> Self {
        Keyspace {
            data: HashMap::new(),
        }
    }

    /// Number of entries held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn flush(&mut self) {
        self.data.clear();
    }

    /// Drop `key` if its deadline has passed. Returns true if it was evicted.
    fn evict_if_expired(&mut self, key: &str) -> bool {
        if self.data.get(key).is_some_and(Entry::is_expired) {
            self.data.remove(key);
            true
        } else {
            false
        }
    }

    fn live(&mut self, key: &str) -> Option<&Entry> {
        self.evict_if_expired(key);
        self.data.get(key)
    }

    fn live_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.evict_if_expired(key);
        self.data.get_mut(key)
    }

    // --- Generic key operations ---

    pub fn exists(&mut self, key: &str) -> bool {
        self.live(key).is_some()
    }

    /// The type label of `key`, or "none" when absent.
    pub fn key_type(&mut self, key: &str) -> &'static str {
        self.live(key).map_or("none", |e| e.value.type_name())
    }

    /// All live keys, optionally filtered by a glob pattern.
    pub fn keys(&mut self, pattern: Option<&str>) -> Vec<String> {
        self.purge_expired();
        self.data
            .keys()
            .filter(|key| pattern.is_none_or(|p| glob_match(p, key)))
            .cloned()
            .collect()
    }

    /// Delete a key of any type. Returns true if a live key was removed.
    pub fn del(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some_and(|e| !e.is_expired())
    }

    /// Set the deadline `seconds` from now. A non-positive TTL deletes the key
    /// immediately. Returns false if the key does not exist.
    pub fn expire(&mut self, key: &str, seconds: i64) -> bool {
        if seconds <= 0 {
            return self.del(key);
        }
        let ttl_ms = (seconds as u64).saturating_mul(1000);
        self.set_expiry(key, now_millis().saturating_add(ttl_ms))
    }

    /// Set an absolute deadline in milliseconds since the epoch.
    pub fn set_expiry(&mut self, key: &str, expires_at: u64) -> bool {
        match self.live_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(expires_at);
                true
            }
            None => false,
        }
    }

    pub fn get_expiry(&mut self, key: &str) -> Option<u64> {
        self.live(key).and_then(|e| e.expires_at)
    }

    /// Move the value and deadline of `old` to `new`, replacing whatever
    /// `new` held.
    pub fn rename(&mut self, old: &str, new: &str) -> MinidisResult<()> {
        self.evict_if_expired(old);
        let entry = self.data.remove(old).ok_or(MinidisError::NoSuchKey)?;
        self.data.insert(new.to_string(), entry);
        Ok(())
    }

    // --- Strings ---

    /// Store a string value, replacing any existing value and deadline.
    pub fn set_string(&mut self, key: &str, value: Vec<u8>) {
        self.data
            .insert(key.to_string(), Entry::new(RedisValue::String(value)));
    }

    pub fn get_string(&mut self, key: &str) -> MinidisResult<Option<&Vec<u8>>> {
        match self.live(key) {
            Some(entry) => entry.value.as_string().map(Some).ok_or(MinidisError::WrongType),
            None => Ok(None),
        }
    }

    // --- Lists ---

    fn list(&mut self, key: &str) -> MinidisResult<Option<&RedisList>> {
        match self.live(key) {
            Some(entry) => entry.value.as_list().map(Some).ok_or(MinidisError::WrongType),
            None => Ok(None),
        }
    }

    fn list_mut(&mut self, key: &str) -> MinidisResult<Option<&mut RedisList>> {
        match self.live_mut(key) {
            Some(entry) => entry
                .value
                .as_list_mut()
                .map(Some)
                .ok_or(MinidisError::WrongType),
            None => Ok(None),
        }
    }

    fn list_or_create(&mut self, key: &str) -> MinidisResult<&mut RedisList> {
        self.evict_if_expired(key);
        self.data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(RedisValue::List(RedisList::new())))
            .value
            .as_list_mut()
            .ok_or(MinidisError::WrongType)
    }

    pub fn llen(&mut self, key: &str) -> MinidisResult<usize> {
        Ok(self.list(key)?.map_or(0, RedisList::len))
    }

    /// Prepend each value in turn. Returns the new length.
    pub fn lpush(&mut self, key: &str, values: Vec<Vec<u8>>) -> MinidisResult<usize> {
        let list = self.list_or_create(key)?;
        for value in values {
            list.lpush(value);
        }
        Ok(list.len())
    }

    /// Append each value in turn. Returns the new length.
    pub fn rpush(&mut self, key: &str, values: Vec<Vec<u8>>) -> MinidisResult<usize> {
        let list = self.list_or_create(key)?;
        for value in values {
            list.rpush(value);
        }
        Ok(list.len())
    }

    pub fn lpop(&mut self, key: &str) -> MinidisResult<Option<Vec<u8>>> {
        Ok(self.list_mut(key)?.and_then(RedisList::lpop))
    }

    pub fn rpop(&mut self, key: &str) -> MinidisResult<Option<Vec<u8>>> {
        Ok(self.list_mut(key)?.and_then(RedisList::rpop))
    }

    pub fn lrem(&mut self, key: &str, count: i64, value: &[u8]) -> MinidisResult<usize> {
        Ok(self.list_mut(key)?.map_or(0, |l| l.lrem(count, value)))
    }

    pub fn lindex(&mut self, key: &str, index: i64) -> MinidisResult<Option<Vec<u8>>> {
        Ok(self.list(key)?.and_then(|l| l.lindex(index)).cloned())
    }

    pub fn lset(&mut self, key: &str, index: i64, value: Vec<u8>) -> MinidisResult<()> {
        let list = self.list_mut(key)?.ok_or(MinidisError::NoSuchKey)?;
        if list.lset(index, value) {
            Ok(())
        } else {
            Err(MinidisError::IndexOutOfRange)
        }
    }

    // --- Hashes ---

    fn hash(&mut self, key: &str) -> MinidisResult<Option<&RedisHash>> {
        match self.live(key) {
            Some(entry) => entry.value.as_hash().map(Some).ok_or(MinidisError::WrongType),
            None => Ok(None),
        }
    }

    fn hash_mut(&mut self, key: &str) -> MinidisResult<Option<&mut RedisHash>> {
        match self.live_mut(key) {
            Some(entry) => entry
                .value
                .as_hash_mut()
                .map(Some)
                .ok_or(MinidisError::WrongType),
            None => Ok(None),
        }
    }

    fn hash_or_create(&mut self, key: &str) -> MinidisResult<&mut RedisHash> {
        self.evict_if_expired(key);
        self.data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(RedisValue::Hash(RedisHash::new())))
            .value
            .as_hash_mut()
            .ok_or(MinidisError::WrongType)
    }

    /// Set each field. Returns how many fields were newly created.
    pub fn hset(&mut self, key: &str, pairs: Vec<(String, Vec<u8>)>) -> MinidisResult<usize> {
        let hash = self.hash_or_create(key)?;
        Ok(pairs
            .into_iter()
            .map(|(field, value)| hash.set(field, value))
            .filter(|&created| created)
            .count())
    }

    pub fn hget(&mut self, key: &str, field: &str) -> MinidisResult<Option<Vec<u8>>> {
        Ok(self.hash(key)?.and_then(|h| h.get(field)).cloned())
    }

    pub fn hexists(&mut self, key: &str, field: &str) -> MinidisResult<bool> {
        Ok(self.hash(key)?.is_some_and(|h| h.exists(field)))
    }

    /// Remove fields. Returns how many existed.
    pub fn hdel(&mut self, key: &str, fields: &[String]) -> MinidisResult<usize> {
        Ok(self
            .hash_mut(key)?
            .map_or(0, |h| fields.iter().filter(|f| h.del(f)).count()))
    }

    pub fn hgetall(&mut self, key: &str) -> MinidisResult<Vec<(String, Vec<u8>)>> {
        Ok(self
            .hash(key)?
            .map(|h| h.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    pub fn hkeys(&mut self, key: &str) -> MinidisResult<Vec<String>> {
        Ok(self
            .hash(key)?
            .map(|h| h.iter().map(|(f, _)| f.clone()).collect())
            .unwrap_or_default())
    }

    pub fn hvals(&mut self, key: &str) -> MinidisResult<Vec<Vec<u8>>> {
        Ok(self
            .hash(key)?
            .map(|h| h.iter().map(|(_, v)| v.clone()).collect())
            .unwrap_or_default())
    }

    pub fn hlen(&mut self, key: &str) -> MinidisResult<usize> {
        Ok(self.hash(key)?.map_or(0, RedisHash::len))
    }

    // --- Expiration and persistence support ---

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = now_millis();
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired_at(now));
        before - self.data.len()
    }

    /// Sample up to `sample_size` keys carrying a deadline and evict the
    /// expired ones. Returns (sampled, evicted).
    pub fn active_expire(&mut self, sample_size: usize) -> (usize, usize) {
        use rand::seq::IteratorRandom;
        let mut rng = rand::thread_rng();
        let now = now_millis();

        let sample: Vec<(String, bool)> = self
            .data
            .iter()
            .filter(|(_, e)| e.expires_at.is_some())
            .choose_multiple(&mut rng, sample_size)
            .into_iter()
            .map(|(key, e)| (key.clone(), e.is_expired_at(now)))
            .collect();

        let mut evicted = 0;
        for (key, expired) in &sample {
            if *expired {
                self.data.remove(key);
                evicted += 1;
            }
        }
        (sample.len(), evicted)
    }

    /// Every entry, expired or not, for the snapshot encoder.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.data.iter()
    }

    /// Install an entry as-is (used when loading a snapshot).
    pub fn insert(&mut self, key: String, entry: Entry) {
        self.data.insert(key, entry);
    }
}

/// The keyspace behind its single exclusive lock, shared by every connection
/// and background task.
pub type SharedStore = Arc<Mutex<Keyspace>>;

pub fn new_shared_store() -> SharedStore {
    Arc::new(Mutex::new(Keyspace::new()))
}
