//! 题库服务 - 业务能力层
//!
//! 负责题库、试卷资源、主题表三个集合的读写，以及基于题库的筛选、分组、导入导出。
//! 每个操作都是"读取整个集合 → 修改 → 整体写回"。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, StorageError};
use crate::models::file_ref::FileRef;
use crate::models::question::{BatchMetadata, QuestionRecord};
use crate::models::resource::{resource_key, PaperResource, ResourceKind, ResourceMap};
use crate::models::schema::TopicSchema;
use crate::models::staging::DEFAULT_TOPIC;
use crate::services::analyzer::{BoardContext, QuestionAnalyzer, FALLBACK_TOPIC};
use crate::services::store::{collections, load_collection, save_collection, KeyValueStore};
use crate::staging::{commit_staging, StagingGrid};

/// 题库筛选条件，`None` 表示不限
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    pub subject: Option<String>,
    pub year: Option<u16>,
    pub paper: Option<String>,
}

impl LibraryFilter {
    pub fn matches(&self, question: &QuestionRecord) -> bool {
        self.subject.as_deref().map_or(true, |s| question.subject == s)
            && self.year.map_or(true, |y| question.year == y)
            && self.paper.as_deref().map_or(true, |p| question.paper == p)
    }
}

/// 导出文件格式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryBundle {
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
    #[serde(default)]
    pub resources: ResourceMap,
    #[serde(default)]
    pub schema: TopicSchema,
}

/// 批量分类的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    /// 已分类的题目数
    pub processed: usize,
    /// 符合条件的题目总数
    pub total: usize,
    /// 图片无法读取而跳过的题目数
    pub failed: usize,
    /// 是否被中途取消
    pub cancelled: bool,
}

/// 导入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub questions: usize,
    pub resources: usize,
    pub schema_entries: usize,
}

/// 题库服务
pub struct QuestionLibrary {
    store: Arc<dyn KeyValueStore>,
}

impl QuestionLibrary {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // ========== 题目 ==========

    /// 读取全部题目，集合不存在时为空
    pub async fn load(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        load_collection(self.store.as_ref(), collections::QUESTIONS).await
    }

    async fn save(&self, questions: &[QuestionRecord]) -> Result<(), StorageError> {
        save_collection(self.store.as_ref(), collections::QUESTIONS, questions).await
    }

    /// 把暂存表提交到题库
    ///
    /// 只有写入成功才清空暂存表；写入失败时暂存表原样保留，错误返回给调用方。
    pub async fn commit_staging(
        &self,
        grid: &mut StagingGrid,
        batch: &BatchMetadata,
    ) -> Result<usize, StorageError> {
        let records = commit_staging(grid, batch);
        let count = records.len();

        let mut questions = self.load().await?;
        questions.extend(records);
        self.save(&questions).await?;

        grid.clear();
        info!(
            "✓ 已提交 {} 道题到题库 ({} {} {} {})",
            count, batch.board, batch.subject, batch.year, batch.paper
        );
        Ok(count)
    }

    pub async fn add(&self, question: QuestionRecord) -> Result<(), StorageError> {
        let mut questions = self.load().await?;
        questions.push(question);
        self.save(&questions).await
    }

    /// 删除题目，返回是否找到
    pub async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let mut questions = self.load().await?;
        let before = questions.len();
        questions.retain(|q| q.id != id);
        if questions.len() == before {
            return Ok(false);
        }
        self.save(&questions).await?;
        Ok(true)
    }

    /// 重新识别单道题的主题，返回新主题；题目不存在时返回 None
    pub async fn reclassify(
        &self,
        id: &str,
        analyzer: &dyn QuestionAnalyzer,
    ) -> AppResult<Option<String>> {
        let mut questions = self.load().await?;
        let Some(index) = questions.iter().position(|q| q.id == id) else {
            return Ok(None);
        };

        let schema = self.load_schema().await?;
        let topic = detect_record_topic(&questions[index], &schema, analyzer).await?;
        questions[index].topic = topic.clone();
        self.save(&questions).await?;
        Ok(Some(topic))
    }

    /// 按筛选条件逐题重新分类
    ///
    /// 严格串行，每题之间等待 `delay`；`cancel` 置位后在下一题开始前停止，
    /// 已完成的结果照样写回。单题图片无法读取时跳过该题，不影响其余题目。
    pub async fn classify_all(
        &self,
        filter: &LibraryFilter,
        analyzer: &dyn QuestionAnalyzer,
        delay: Duration,
        cancel: &AtomicBool,
    ) -> AppResult<ClassifyStats> {
        let mut questions = self.load().await?;
        let schema = self.load_schema().await?;

        let targets: Vec<usize> = questions
            .iter()
            .enumerate()
            .filter(|(_, q)| filter.matches(q))
            .map(|(i, _)| i)
            .collect();
        let mut stats = ClassifyStats {
            total: targets.len(),
            ..Default::default()
        };

        for (n, &index) in targets.iter().enumerate() {
            if n > 0 && !delay.is_zero() && !cancel.load(Ordering::SeqCst) {
                sleep(delay).await;
            }
            if cancel.load(Ordering::SeqCst) {
                warn!("⏹️ 批量分类已取消 ({}/{})", stats.processed, stats.total);
                stats.cancelled = true;
                break;
            }

            match detect_record_topic(&questions[index], &schema, analyzer).await {
                Ok(topic) => {
                    debug!("题目 {} → {}", questions[index].id, topic);
                    questions[index].topic = topic;
                    stats.processed += 1;
                }
                Err(e) => {
                    warn!("⚠️ 题目 {} 分类失败，已跳过: {}", questions[index].id, e);
                    stats.failed += 1;
                }
            }
        }

        if stats.processed > 0 {
            self.save(&questions).await?;
        }
        info!(
            "✓ 批量分类完成: {}/{}，跳过 {}",
            stats.processed, stats.total, stats.failed
        );
        Ok(stats)
    }

    // ========== 主题表 ==========

    pub async fn load_schema(&self) -> Result<TopicSchema, StorageError> {
        load_collection(self.store.as_ref(), collections::TOPIC_SCHEMA).await
    }

    /// 合并新的主题表并保存，返回合并后的条目数
    pub async fn merge_schema(&self, schema: TopicSchema) -> Result<usize, StorageError> {
        let mut current = self.load_schema().await?;
        current.merge(schema);
        save_collection(self.store.as_ref(), collections::TOPIC_SCHEMA, &current).await?;
        Ok(current.len())
    }

    /// 读取 CSV 主题表并合并，同时在资源表中登记文件名
    pub async fn import_schema_csv(
        &self,
        file: &FileRef,
        batch: &BatchMetadata,
    ) -> AppResult<usize> {
        let text = String::from_utf8_lossy(file.bytes());
        let parsed = TopicSchema::parse_csv(&text);
        if parsed.is_empty() {
            warn!("⚠️ 主题表 {} 中没有可用的行", file.name());
        }
        let total = self.merge_schema(parsed).await?;

        let mut resources = self.load_resources().await?;
        resources.insert(
            resource_key(&batch.board, &batch.subject, batch.year, &batch.paper, ResourceKind::Schema),
            PaperResource {
                file_name: file.name().to_string(),
                file: None,
                board: batch.board.clone(),
                kind: ResourceKind::Schema,
            },
        );
        save_collection(self.store.as_ref(), collections::RESOURCES, &resources).await?;
        Ok(total)
    }

    /// 分类时使用的试卷上下文
    pub async fn board_context(&self, batch: &BatchMetadata) -> Result<BoardContext, StorageError> {
        let schema = self.load_schema().await?;
        Ok(BoardContext {
            board: batch.board.clone(),
            subject: batch.subject.clone(),
            paper: batch.paper.clone(),
            valid_topics: schema
                .valid_topics(&batch.board, &batch.subject, &batch.paper)
                .to_vec(),
        })
    }

    // ========== 试卷资源 ==========

    pub async fn load_resources(&self) -> Result<ResourceMap, StorageError> {
        load_collection(self.store.as_ref(), collections::RESOURCES).await
    }

    /// 登记整卷资源（评分指南或题目 PDF），同 key 覆盖
    pub async fn add_resource(
        &self,
        file: &FileRef,
        batch: &BatchMetadata,
        kind: ResourceKind,
    ) -> Result<String, StorageError> {
        let key = resource_key(&batch.board, &batch.subject, batch.year, &batch.paper, kind);
        let mut resources = self.load_resources().await?;
        resources.insert(key.clone(), PaperResource::from_file(file, &batch.board, kind));
        save_collection(self.store.as_ref(), collections::RESOURCES, &resources).await?;
        Ok(key)
    }

    /// 查找题目所属试卷的整卷评分指南
    pub async fn global_scheme_for(&self, question: &QuestionRecord) -> AppResult<Option<FileRef>> {
        let key = resource_key(
            &question.board,
            &question.subject,
            question.year,
            &question.paper,
            ResourceKind::Scheme,
        );
        let resources = self.load_resources().await?;
        resources
            .get(&key)
            .and_then(|r| r.file.as_deref().map(|data| (r.file_name.clone(), data)))
            .map(|(name, data)| FileRef::from_data_url(name, data))
            .transpose()
    }

    // ========== 导入导出 ==========

    pub async fn export_bundle(&self) -> Result<LibraryBundle, StorageError> {
        Ok(LibraryBundle {
            questions: self.load().await?,
            resources: self.load_resources().await?,
            schema: self.load_schema().await?,
        })
    }

    /// 导入：题目追加，资源和主题表按 key 合并
    pub async fn import_bundle(&self, bundle: LibraryBundle) -> Result<ImportSummary, StorageError> {
        let summary = ImportSummary {
            questions: bundle.questions.len(),
            resources: bundle.resources.len(),
            schema_entries: bundle.schema.len(),
        };

        let mut questions = self.load().await?;
        questions.extend(bundle.questions);
        self.save(&questions).await?;

        let mut resources = self.load_resources().await?;
        resources.extend(bundle.resources);
        save_collection(self.store.as_ref(), collections::RESOURCES, &resources).await?;

        self.merge_schema(bundle.schema).await?;

        info!(
            "✓ 导入完成: {} 道题, {} 份资源, {} 条主题表",
            summary.questions, summary.resources, summary.schema_entries
        );
        Ok(summary)
    }

    pub async fn export_to_file(&self, path: &Path) -> AppResult<()> {
        let bundle = self.export_bundle().await?;
        let data = serde_json::to_vec_pretty(&bundle).map_err(|source| StorageError::Malformed {
            collection: "bundle".to_string(),
            source,
        })?;
        tokio::fs::write(path, data)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        info!("💾 题库已导出至: {}", path.display());
        Ok(())
    }

    pub async fn import_from_file(&self, path: &Path) -> AppResult<ImportSummary> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let bundle: LibraryBundle =
            serde_json::from_str(&content).map_err(|source| StorageError::Malformed {
                collection: "bundle".to_string(),
                source,
            })?;
        Ok(self.import_bundle(bundle).await?)
    }
}

async fn detect_record_topic(
    question: &QuestionRecord,
    schema: &TopicSchema,
    analyzer: &dyn QuestionAnalyzer,
) -> AppResult<String> {
    let images = question.image_files()?;
    let context = BoardContext {
        board: question.board.clone(),
        subject: question.subject.clone(),
        paper: question.paper.clone(),
        valid_topics: schema
            .valid_topics(&question.board, &question.subject, &question.paper)
            .to_vec(),
    };
    Ok(analyzer.detect_topic(&images, &context).await)
}

// ========== 题库视图 ==========

pub fn filter_questions<'a>(
    questions: &'a [QuestionRecord],
    filter: &LibraryFilter,
) -> Vec<&'a QuestionRecord> {
    questions.iter().filter(|q| filter.matches(q)).collect()
}

/// 还没有有效主题的题目数（空、General、Uncategorized）
pub fn untagged_count(questions: &[QuestionRecord]) -> usize {
    questions
        .iter()
        .filter(|q| q.topic.is_empty() || q.topic == DEFAULT_TOPIC || q.topic == FALLBACK_TOPIC)
        .count()
}

/// 按主题分组某科目的题目，空主题归入 General
pub fn topic_groups<'a>(
    questions: &'a [QuestionRecord],
    subject: &str,
) -> BTreeMap<String, Vec<&'a QuestionRecord>> {
    let mut groups: BTreeMap<String, Vec<&QuestionRecord>> = BTreeMap::new();
    for q in questions.iter().filter(|q| q.subject == subject) {
        let topic = if q.topic.is_empty() { DEFAULT_TOPIC } else { q.topic.as_str() };
        groups.entry(topic.to_string()).or_default().push(q);
    }
    groups
}

/// 一套试卷的全部题目，保持题库中的顺序
pub fn paper_questions<'a>(
    questions: &'a [QuestionRecord],
    subject: &str,
    year: u16,
    paper: &str,
) -> Vec<&'a QuestionRecord> {
    questions
        .iter()
        .filter(|q| q.subject == subject && q.year == year && q.paper == paper)
        .collect()
}
