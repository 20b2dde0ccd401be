use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// The key-value surface the remote store needs from its backing store.
/// The distributed store itself is an external collaborator; anything
/// that can get/set strings with a TTL and keep string sets satisfies
/// this trait.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>)
        -> Result<(), StoreError>;

    /// Add `member` to the set at `key`, refreshing the set's TTL when
    /// one is given.
    async fn sadd(&self, key: &str, member: &str, ttl: Option<Duration>)
        -> Result<(), StoreError>;

    /// Members of the set at `key`; empty when absent or expired.
    /// Deterministic order.
    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError>;
}

#[derive(Clone, Debug)]
enum KvValue {
    Text(String),
    Set(BTreeSet<String>),
}

#[derive(Clone, Debug)]
struct KvEntry {
    value: KvValue,
    expires_at: Option<Instant>,
}

impl KvEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process `KvBackend` used by tests, benches and the seeder.
#[derive(Default)]
pub struct MemoryKv {
    entries: DashMap<String, KvEntry>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.value().is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entries.get(key) {
            Some(entry) if !entry.value().is_expired() => match &entry.value().value {
                KvValue::Text(text) => Ok(Some(text.clone())),
                KvValue::Set(_) => {
                    Err(StoreError::Unavailable(format!("wrong value type at key {key}")))
                }
            },
            _ => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .insert(key.to_string(), KvEntry { value: KvValue::Text(value), expires_at });
        Ok(())
    }

    async fn sadd(
        &self,
        key: &str,
        member: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| KvEntry {
            value: KvValue::Set(BTreeSet::new()),
            expires_at,
        });

        // An expired set is replaced rather than extended.
        if entry.value().is_expired() {
            *entry.value_mut() = KvEntry { value: KvValue::Set(BTreeSet::new()), expires_at };
        }

        match &mut entry.value_mut().value {
            KvValue::Set(members) => {
                members.insert(member.to_string());
            }
            KvValue::Text(_) => {
                return Err(StoreError::Unavailable(format!("wrong value type at key {key}")));
            }
        }
        if ttl.is_some() {
            entry.value_mut().expires_at = expires_at;
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.entries.get(key) {
            Some(entry) if !entry.value().is_expired() => match &entry.value().value {
                KvValue::Set(members) => Ok(members.iter().cloned().collect()),
                KvValue::Text(_) => {
                    Err(StoreError::Unavailable(format!("wrong value type at key {key}")))
                }
            },
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_put_round_trip() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("missing").await.unwrap(), None);

        kv.put("k", "v".to_string(), None).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_expiry() {
        let kv = MemoryKv::new();
        kv.put("k", "v".to_string(), Some(Duration::from_millis(0))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_members_are_sorted_and_deduplicated() {
        let kv = MemoryKv::new();
        kv.sadd("s", "b", None).await.unwrap();
        kv.sadd("s", "a", None).await.unwrap();
        kv.sadd("s", "a", None).await.unwrap();

        assert_eq!(kv.smembers("s").await.unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_wrong_type_is_an_error() {
        let kv = MemoryKv::new();
        kv.put("k", "v".to_string(), None).await.unwrap();

        assert!(kv.sadd("k", "m", None).await.is_err());
        assert!(kv.smembers("k").await.is_err());
    }
}
