//! 键值存储 - 业务能力层
//!
//! 题库、资源、主题表、统计各是一个"集合"，整存整取（读-改-写，后写者覆盖）。
//! 只有单用户单会话使用，不做加锁或版本控制。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StorageError;

/// 集合名
pub mod collections {
    pub const QUESTIONS: &str = "questions";
    pub const RESOURCES: &str = "resources";
    pub const TOPIC_SCHEMA: &str = "topic_schema";
    pub const USER_STATS: &str = "user_stats";
}

/// 持久化键值存储
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 读取集合，不存在时返回 None
    async fn get(&self, collection: &str) -> Result<Option<JsonValue>, StorageError>;

    /// 整体写入集合
    async fn set(&self, collection: &str, value: JsonValue) -> Result<(), StorageError>;
}

/// 读取并反序列化集合，不存在时返回默认值（空集合）
pub async fn load_collection<T>(store: &dyn KeyValueStore, collection: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    match store.get(collection).await? {
        Some(value) => serde_json::from_value(value).map_err(|source| StorageError::Malformed {
            collection: collection.to_string(),
            source,
        }),
        None => Ok(T::default()),
    }
}

/// 序列化并写入集合
pub async fn save_collection<T>(
    store: &dyn KeyValueStore,
    collection: &str,
    value: &T,
) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_value(value).map_err(|source| StorageError::Malformed {
        collection: collection.to_string(),
        source,
    })?;
    store.set(collection, json).await
}

/// JSON 文件存储：每个集合一个 `<dir>/<collection>.json`
///
/// 先写临时文件再改名，写到一半失败不会破坏旧数据。
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.json", collection))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, collection: &str) -> Result<Option<JsonValue>, StorageError> {
        let path = self.path_for(collection);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::read_failed(collection, e)),
        };
        let value = serde_json::from_str(&content).map_err(|source| StorageError::Malformed {
            collection: collection.to_string(),
            source,
        })?;
        Ok(Some(value))
    }

    async fn set(&self, collection: &str, value: JsonValue) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::write_failed(collection, e))?;

        let data = serde_json::to_vec_pretty(&value).map_err(|source| StorageError::Malformed {
            collection: collection.to_string(),
            source,
        })?;

        let path = self.path_for(collection);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| StorageError::write_failed(collection, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::write_failed(collection, e))?;

        debug!("已写入集合 {} ({} 字节)", collection, data.len());
        Ok(())
    }
}

/// 内存存储，用于测试和临时会话
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, collection: &str) -> Result<Option<JsonValue>, StorageError> {
        Ok(self.data.lock().await.get(collection).cloned())
    }

    async fn set(&self, collection: &str, value: JsonValue) -> Result<(), StorageError> {
        self.data.lock().await.insert(collection.to_string(), value);
        Ok(())
    }
}
