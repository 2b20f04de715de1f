use std::fmt;
use std::str::FromStr;

use crate::models::file_ref::FileRef;
use crate::models::identifier::Identifier;

/// 新行默认主题（占位，等待 AI 识别或人工填写）
pub const DEFAULT_TOPIC: &str = "General";
/// 新行默认答题线数
pub const DEFAULT_LINES: u32 = 4;

/// 暂存行：一个题号对应的待提交题目
#[derive(Debug, Clone, PartialEq)]
pub struct StagingRow {
    pub id: Identifier,
    /// 顺序固定：整题图 → 共享上下文图 → 本题专属图
    pub images: Vec<FileRef>,
    pub scheme: Option<FileRef>,
    pub topic: String,
    pub marks: u32,
    pub lines: u32,
    pub question_text: String,
    pub scheme_text: String,
}

impl StagingRow {
    pub fn new(id: Identifier, scheme: Option<FileRef>) -> Self {
        Self {
            id,
            images: Vec::new(),
            scheme,
            topic: DEFAULT_TOPIC.to_string(),
            marks: 0,
            lines: DEFAULT_LINES,
            question_text: String::new(),
            scheme_text: String::new(),
        }
    }

    pub fn image_names(&self) -> Vec<&str> {
        self.images.iter().map(|f| f.name()).collect()
    }
}

/// 可直接编辑的行字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    Topic,
    Marks,
    Lines,
    QuestionText,
    SchemeText,
}

impl FromStr for RowField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topic" => Ok(RowField::Topic),
            "marks" => Ok(RowField::Marks),
            "lines" => Ok(RowField::Lines),
            "questionText" | "question_text" => Ok(RowField::QuestionText),
            "schemeText" | "scheme_text" => Ok(RowField::SchemeText),
            other => Err(format!("未知字段: {}", other)),
        }
    }
}

impl fmt::Display for RowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowField::Topic => "topic",
            RowField::Marks => "marks",
            RowField::Lines => "lines",
            RowField::QuestionText => "questionText",
            RowField::SchemeText => "schemeText",
        };
        f.write_str(name)
    }
}
