use crate::error::ConfigError;
use crate::models::question::BatchMetadata;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载批次元数据（考试局 / 科目 / 年份 / 试卷）
pub async fn load_batch_metadata(toml_file_path: &Path) -> Result<BatchMetadata> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取批次文件: {}", toml_file_path.display()))?;

    let meta: BatchMetadata =
        toml::from_str(&content).map_err(|source| ConfigError::BatchParseFailed {
            path: toml_file_path.display().to_string(),
            source,
        })?;

    tracing::info!(
        "批次: {} {} {} {}",
        meta.board,
        meta.subject,
        meta.year,
        meta.paper
    );

    Ok(meta)
}
