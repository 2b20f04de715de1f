//! 主题掌握度统计

use std::sync::Arc;
use tracing::info;

use crate::error::StorageError;
use crate::models::question::QuestionRecord;
use crate::models::staging::DEFAULT_TOPIC;
use crate::models::stats::UserStats;
use crate::services::store::{collections, load_collection, save_collection, KeyValueStore};

pub struct StatsService {
    store: Arc<dyn KeyValueStore>,
}

impl StatsService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<UserStats, StorageError> {
        load_collection(self.store.as_ref(), collections::USER_STATS).await
    }

    /// 记录一次考试结果
    ///
    /// `awarded[i]` 是第 i 道题的得分，缺失按 0 分；超过满分的按满分计。
    pub async fn record_exam(
        &self,
        questions: &[QuestionRecord],
        awarded: &[u32],
    ) -> Result<UserStats, StorageError> {
        let mut stats = self.load().await?;
        for (i, q) in questions.iter().enumerate() {
            let topic = if q.topic.is_empty() { DEFAULT_TOPIC } else { q.topic.as_str() };
            let entry = stats.entry(topic.to_string()).or_default();
            entry.correct += awarded.get(i).copied().unwrap_or(0).min(q.marks);
            entry.total += q.marks;
        }
        save_collection(self.store.as_ref(), collections::USER_STATS, &stats).await?;
        info!("📈 已记录 {} 道题的考试结果", questions.len());
        Ok(stats)
    }
}
