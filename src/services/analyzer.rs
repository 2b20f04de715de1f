//! 题目分析能力的抽象
//!
//! 暂存表补全、题库重新分类都只依赖这个 trait，不关心背后是哪家模型。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::file_ref::FileRef;
use crate::models::staging::DEFAULT_LINES;

/// 分类失败时使用的主题
pub const FALLBACK_TOPIC: &str = "Uncategorized";

/// 分类时的试卷上下文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardContext {
    pub board: String,
    pub subject: String,
    pub paper: String,
    /// 主题表中该试卷允许的主题，为空时不限制
    pub valid_topics: Vec<String>,
}

/// 一次分析的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub topic: String,
    pub marks: u32,
    pub lines: u32,
    pub question_text: String,
    pub scheme_text: String,
}

impl Enrichment {
    /// 远程服务失败时的安全默认值
    pub fn fallback() -> Self {
        Self {
            topic: FALLBACK_TOPIC.to_string(),
            marks: 1,
            lines: DEFAULT_LINES,
            question_text: String::new(),
            scheme_text: String::new(),
        }
    }
}

/// 题目分析服务
///
/// 两个方法都不返回错误：网络失败、响应格式不对等情况由实现方吞掉并返回默认值。
#[async_trait]
pub trait QuestionAnalyzer: Send + Sync {
    /// 识别主题、分值、线数，并转写题目和评分标准文字
    async fn analyze(
        &self,
        images: &[FileRef],
        scheme: Option<&FileRef>,
        context: &BoardContext,
    ) -> Enrichment;

    /// 只识别主题
    async fn detect_topic(&self, images: &[FileRef], context: &BoardContext) -> String;
}
