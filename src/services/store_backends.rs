// src/services/store_backends.rs
use async_trait::async_trait;
use redis::Client;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::services::store_service::{StoreError, StoreOperations, WriteBatch, WriteOp};

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Operation(err.to_string())
        }
    }
}

// ------------------------------
// Redis
// ------------------------------

/// Each batch runs on its own connection: WATCH the guarded keys, check them,
/// then MULTI/EXEC the ops. A nil EXEC means a watched key moved underneath.
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let instance = Self { client };
        let mut conn = instance.get_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        Ok(instance)
    }

    async fn get_connection(&self) -> Result<redis::aio::Connection, StoreError> {
        self.client
            .get_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl StoreOperations for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.get_connection().await?;
        let data: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(data)
    }

    async fn members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.get_connection().await?;
        let mut members: Vec<String> = redis::cmd("SMEMBERS").arg(set).query_async(&mut conn).await?;
        members.sort();
        Ok(members)
    }

    async fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;

        if !batch.guards.is_empty() {
            let keys: Vec<&str> = batch.guards.iter().map(|g| g.key.as_str()).collect();
            let _: () = redis::cmd("WATCH").arg(&keys[..]).query_async(&mut conn).await?;

            for guard in &batch.guards {
                let current: Option<String> =
                    redis::cmd("GET").arg(&guard.key).query_async(&mut conn).await?;
                if !guard.expect.matches(current.as_deref()) {
                    let _: () = redis::cmd("UNWATCH").query_async(&mut conn).await?;
                    return Err(StoreError::GuardFailed { key: guard.key.clone() });
                }
            }
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in &batch.ops {
            match op {
                WriteOp::Set { key, value } => {
                    pipe.cmd("SET").arg(key).arg(value).ignore();
                }
                WriteOp::Delete { key } => {
                    pipe.cmd("DEL").arg(key).ignore();
                }
                WriteOp::AddMember { set, member } => {
                    pipe.cmd("SADD").arg(set).arg(member).ignore();
                }
                WriteOp::RemoveMember { set, member } => {
                    pipe.cmd("SREM").arg(set).arg(member).ignore();
                }
            }
        }

        let committed: Option<()> = pipe.query_async(&mut conn).await?;
        match committed {
            Some(()) => Ok(()),
            None => {
                tracing::warn!("Redis transaction aborted by a concurrent writer");
                Err(StoreError::Contended)
            }
        }
    }
}

// ------------------------------
// Memory
// ------------------------------

#[derive(Default)]
struct MemoryData {
    values: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
}

/// In-process store for development and tests. A batch holds the write lock
/// from the first guard check to the last op.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreOperations for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let data = self.data.read().await;
        Ok(data.values.get(key).cloned())
    }

    async fn members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .sets
            .get(set)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        // Let concurrent requests interleave here as they would on a Redis round trip.
        tokio::task::yield_now().await;
        let mut data = self.data.write().await;

        for guard in &batch.guards {
            let current = data.values.get(&guard.key).map(String::as_str);
            if !guard.expect.matches(current) {
                return Err(StoreError::GuardFailed { key: guard.key.clone() });
            }
        }

        for op in batch.ops {
            match op {
                WriteOp::Set { key, value } => {
                    data.values.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    data.values.remove(&key);
                }
                WriteOp::AddMember { set, member } => {
                    data.sets.entry(set).or_default().insert(member);
                }
                WriteOp::RemoveMember { set, member } => {
                    if let Some(members) = data.sets.get_mut(&set) {
                        members.remove(&member);
                        if members.is_empty() {
                            data.sets.remove(&set);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
