//! 题号（点分数字标识）
//!
//! 例如 `"1"`、`"2.1"`、`"3.2.1"`。排序按数字逐段比较：`"1.10"` 排在 `"1.2"` 之后。
//! 每段按去掉前导零的数字串比较，位数不受整数类型限制。

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 点分数字题号
///
/// 只能由评分标准文件名解析得到，`segments` 与 `raw` 在构造时一次算好。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Identifier {
    raw: String,
    segments: Vec<String>,
}

impl Identifier {
    /// 解析点分数字串，任意一段不是纯数字时返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let segments = raw
            .split('.')
            .map(|seg| {
                if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let digits = seg.trim_start_matches('0');
                Some(if digits.is_empty() { "0" } else { digits }.to_string())
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 主题号：第一段（`"1.2.3"` → `"1"`）
    pub fn major(&self) -> &str {
        self.raw.split('.').next().unwrap_or(&self.raw)
    }

    /// 各段去掉前导零后的数字串
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

// 无前导零的数字串：位数少的更小，位数相同按字典序
fn cmp_segment(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        // 数值相同但写法不同（"1.02" 与 "1.2"）时按原串区分，保持与 Eq 一致
        self.segments
            .iter()
            .zip(&other.segments)
            .map(|(a, b)| cmp_segment(a, b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| self.segments.len().cmp(&other.segments.len()))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.raw
    }
}

impl TryFrom<String> for Identifier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Identifier::parse(&value).ok_or_else(|| format!("无效题号: {}", value))
    }
}
