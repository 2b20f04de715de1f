//! 批量配对处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一批题目从文件到题库的全过程。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建日志文件、读取试卷信息、打开题库存储、创建 LLM 服务
//! 2. **加载文件**：题目图片、评分标准图片、可选的主题分类表
//! 3. **配对**：生成暂存表，记录被忽略的评分标准文件
//! 4. **补全**：逐行调用 AI，Ctrl-C 在两行之间取消
//! 5. **提交**：写入题库；写入失败时把待提交的题目另存到 `pending_commit.json`
//! 6. **全局统计**
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单行的细节
//! - **资源所有者**：唯一持有存储和 LLM 服务的模块
//! - **向下委托**：配对交给 staging，补全交给 workflow，持久化交给 services

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::StagingError;
use crate::models::{load_batch_metadata, load_files_from_dir, BatchMetadata, FileRef};
use crate::services::{
    untagged_count, JsonFileStore, KeyValueStore, LlmService, QuestionAnalyzer, QuestionLibrary,
};
use crate::staging::{build_staging_grid, commit_staging, incomplete_rows, StagingGrid};
use crate::utils::logging::{
    init_log_file, log_files_loaded, log_naming_rules, log_staging_summary, log_startup,
    print_final_stats,
};
use crate::workflow::EnrichFlow;

/// 应用主结构
pub struct App {
    config: Config,
    batch: BatchMetadata,
    library: QuestionLibrary,
    analyzer: Arc<dyn QuestionAnalyzer>,
    cancel: Arc<AtomicBool>,
}

/// 提交失败时保存待提交题目的文件名（位于数据目录下）
pub const PENDING_COMMIT_FILE: &str = "pending_commit.json";

/// 一次运行的结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// AI 补全的行数
    pub enriched: usize,
    /// 提交到题库的题数
    pub committed: usize,
    /// 提交后题库的总题数
    pub library_total: usize,
    /// 提交失败时另存的待提交文件
    pub pending_file: Option<PathBuf>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        let batch = load_batch_metadata(&config.batch_file).await?;
        log_startup(&batch.board, &batch.subject, batch.year, &batch.paper);
        if config.verbose_logging {
            log_naming_rules();
        }

        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&config.data_dir));
        let analyzer: Arc<dyn QuestionAnalyzer> = Arc::new(LlmService::new(&config));

        Ok(Self::with_parts(config, batch, store, analyzer))
    }

    /// 用现成的存储和分析服务组装应用
    pub fn with_parts(
        config: Config,
        batch: BatchMetadata,
        store: Arc<dyn KeyValueStore>,
        analyzer: Arc<dyn QuestionAnalyzer>,
    ) -> Self {
        Self {
            config,
            batch,
            library: QuestionLibrary::new(store),
            analyzer,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 取消标志，置位后补全在下一行开始前停止
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        self.import_topic_schema().await?;

        let (question_files, scheme_files) = self.load_files().await?;
        log_files_loaded(question_files.len(), scheme_files.len());

        // 配对
        let mut grid = match build_staging_grid(&question_files, &scheme_files) {
            Ok(outcome) => {
                log_staging_summary(&outcome);
                outcome.grid
            }
            Err(e @ (StagingError::NoSchemeFiles | StagingError::NoRecognizedSchemes { .. })) => {
                warn!("⚠️ {}，程序结束", e);
                return Ok(RunStats::default());
            }
            Err(e) => return Err(e.into()),
        };

        // 补全
        let enriched = if self.config.auto_enrich {
            self.enrich(&mut grid).await?
        } else {
            info!("⏭️ 未开启自动补全，直接提交");
            0
        };

        let incomplete = incomplete_rows(&grid);
        if !incomplete.is_empty() {
            warn!(
                "⚠️ {} 行缺少分值或评分标准，仍按草稿提交: {:?}",
                incomplete.len(),
                incomplete.iter().map(|i| grid.rows()[*i].id.as_str()).collect::<Vec<_>>()
            );
        }

        // 提交
        let committed = match self.library.commit_staging(&mut grid, &self.batch).await {
            Ok(count) => count,
            Err(e) => {
                error!("❌ 提交失败，暂存表保留 {} 行: {}", grid.len(), e);
                let path = self.save_pending(&grid).await?;
                warn!("⚠️ 待提交的题目已另存至: {}", path.display());
                return Ok(RunStats {
                    enriched,
                    pending_file: Some(path),
                    ..Default::default()
                });
            }
        };

        let questions = self.library.load().await?;
        let stats = RunStats {
            enriched,
            committed,
            library_total: questions.len(),
            pending_file: None,
        };
        info!("🏷️ 尚未分类的题目: {}", untagged_count(&questions));

        // 输出最终统计
        print_final_stats(
            stats.committed,
            stats.enriched,
            stats.library_total,
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    /// 把暂存表转换成题库记录写到数据目录，供之后重新导入
    async fn save_pending(&self, grid: &StagingGrid) -> Result<PathBuf> {
        let records = commit_staging(grid, &self.batch);
        let data = serde_json::to_vec_pretty(&records).context("序列化待提交题目失败")?;

        tokio::fs::create_dir_all(&self.config.data_dir)
            .await
            .with_context(|| format!("无法创建数据目录: {}", self.config.data_dir.display()))?;
        let path = self.config.data_dir.join(PENDING_COMMIT_FILE);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("无法写入待提交文件: {}", path.display()))?;
        Ok(path)
    }

    /// 加载题目和评分标准文件
    async fn load_files(&self) -> Result<(Vec<FileRef>, Vec<FileRef>)> {
        info!("\n📁 正在扫描题目和评分标准文件...");
        let questions = load_files_from_dir(&self.config.question_dir).await?;
        let schemes = load_files_from_dir(&self.config.scheme_dir).await?;
        Ok((questions, schemes))
    }

    /// 导入可选的主题分类表
    async fn import_topic_schema(&self) -> Result<()> {
        let Some(path) = &self.config.topic_schema_csv else {
            return Ok(());
        };
        let file = FileRef::from_path(path).await?;
        let total = self.library.import_schema_csv(&file, &self.batch).await?;
        info!("📑 已导入主题分类表 {}，共 {} 张试卷", file.name(), total);
        Ok(())
    }

    /// 逐行补全，Ctrl-C 触发取消
    async fn enrich(&self, grid: &mut StagingGrid) -> Result<usize> {
        let context = self.library.board_context(&self.batch).await?;
        if context.valid_topics.is_empty() {
            info!("💡 没有该试卷的主题分类表，AI 将自由分类");
        }

        let cancel = self.cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⏹️ 收到 Ctrl-C，当前行完成后停止补全");
                cancel.store(true, Ordering::SeqCst);
            }
        });

        let flow = EnrichFlow::new(
            self.analyzer.clone(),
            self.config.enrich_delay(),
            self.config.verbose_logging,
        );
        let stats = flow.enrich_all(grid, &context, &self.cancel).await;
        watcher.abort();

        Ok(stats.processed)
    }
}
