use crate::error::FileError;
use crate::models::file_ref::FileRef;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 加载文件夹中的所有普通文件
///
/// 目录遍历顺序不稳定，这里按文件名排序，作为"用户选择顺序"的替代。
/// 隐藏文件（以 `.` 开头）跳过。
pub async fn load_files_from_dir(folder_path: &Path) -> Result<Vec<FileRef>> {
    if !folder_path.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.display().to_string(),
        }
        .into());
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    let mut entries = fs::read_dir(folder_path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if entry.file_type().await?.is_file() && !hidden {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let file = FileRef::from_path(path)
            .await
            .with_context(|| format!("无法加载文件: {}", path.display()))?;
        files.push(file);
    }

    tracing::info!(
        "从 {} 加载了 {} 个文件",
        folder_path.display(),
        files.len()
    );

    Ok(files)
}
