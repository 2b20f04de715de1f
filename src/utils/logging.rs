use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::staging::naming::{CONTEXT_MARKER, NAMING_RULES};
use crate::staging::StagingOutcome;

/// 初始化 tracing 订阅者
///
/// 优先使用 `RUST_LOG`，否则默认 `info`（详细模式为 `debug`）。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题目暂存日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(board: &str, subject: &str, year: u16, paper: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量题目配对模式");
    info!("📋 试卷: {} {} {} {}", board, subject, year, paper);
    info!("{}", "=".repeat(60));
}

/// 输出文件命名约定
pub fn log_naming_rules() {
    info!("📝 文件命名约定:");
    for rule in NAMING_RULES {
        info!("  {:<10} {:<24} 例: {}", rule.name, rule.pattern, rule.example);
    }
    info!("  {:<10} 文件名含 \"{}\"", "context", CONTEXT_MARKER);
}

/// 记录文件加载信息
///
/// # 参数
/// - `questions`: 题目图片数量
/// - `schemes`: 评分标准图片数量
pub fn log_files_loaded(questions: usize, schemes: usize) {
    info!("✓ 找到 {} 张题目图片", questions);
    info!("✓ 找到 {} 张评分标准图片", schemes);
}

/// 记录配对结果：每一行的图片，以及被忽略 / 被覆盖的评分标准文件
pub fn log_staging_summary(outcome: &StagingOutcome) {
    info!("\n{}", "─".repeat(60));
    info!("📦 暂存表共 {} 行", outcome.grid.len());
    for row in outcome.grid.rows() {
        let scheme = row.scheme.as_ref().map(|s| s.name()).unwrap_or("-");
        info!(
            "  {:<8} 图片: [{}]  评分标准: {}",
            row.id.as_str(),
            row.image_names().join(", "),
            scheme
        );
        if row.images.is_empty() {
            warn!("  ⚠️ 题号 {} 没有匹配到任何题目图片", row.id);
        }
    }
    for name in &outcome.ignored_schemes {
        warn!("⚠️ 无法识别题号，已忽略评分标准文件: {}", name);
    }
    for name in &outcome.overwritten_schemes {
        warn!("⚠️ 题号重复，评分标准文件被后者覆盖: {}", name);
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `committed`: 提交的题目数
/// - `enriched`: AI 补全的行数
/// - `library_total`: 题库总题数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    committed: usize,
    enriched: usize,
    library_total: usize,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🤖 AI 补全: {} 行", enriched);
    info!("✅ 已提交: {} 道题", committed);
    info!("📚 题库总数: {}", library_total);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("能量守恒定律", 4), "能量守恒...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_init_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.txt");
        init_log_file(path.to_str().unwrap()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("题目暂存日志"));
    }
}
