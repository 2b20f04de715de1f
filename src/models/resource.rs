use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::file_ref::FileRef;

/// 试卷级资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// 整卷评分指南（PDF），判分时作为全局参考
    Scheme,
    /// 整卷题目 PDF
    Paper,
    /// 主题分类表（CSV），只记录文件名
    Schema,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Scheme => "scheme",
            ResourceKind::Paper => "paper",
            ResourceKind::Schema => "schema",
        };
        f.write_str(s)
    }
}

/// 一份试卷资源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperResource {
    pub file_name: String,
    /// data URL；分类表只登记文件名，不保存内容
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub board: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

impl PaperResource {
    pub fn from_file(file: &FileRef, board: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            file_name: file.name().to_string(),
            file: Some(file.to_data_url()),
            board: board.into(),
            kind,
        }
    }
}

/// 资源表：`BOARD-SUBJECT-YEAR-PAPER-KIND` → 资源
pub type ResourceMap = BTreeMap<String, PaperResource>;

pub fn resource_key(board: &str, subject: &str, year: u16, paper: &str, kind: ResourceKind) -> String {
    format!("{}-{}-{}-{}-{}", board, subject, year, paper, kind)
}
