//! 主题分类表（Topic Schema）
//!
//! 一张 CSV：`board,subject,paper,topic1;topic2;...`，按
//! `BOARD-SUBJECT-PAPER` 归类出每张试卷允许使用的主题列表。
//! 分类时 LLM 只能从对应列表中选择。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// 试卷 → 合法主题列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicSchema {
    entries: BTreeMap<String, Vec<String>>,
}

/// 组合查找键，三个部分统一转大写
pub fn schema_key(board: &str, subject: &str, paper: &str) -> String {
    format!(
        "{}-{}-{}",
        board.to_uppercase(),
        subject.to_uppercase(),
        paper.to_uppercase()
    )
}

impl TopicSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 CSV 文本
    ///
    /// - 空行跳过；首行以 `board` 开头时视为表头
    /// - 少于 4 列的行忽略
    /// - 试卷列含 `1` 归为 `P1`，含 `2` 归为 `P2`（都含时取 `P2`）
    /// - 第 4 列起的内容按 `,` / `;` 拆分成主题
    /// - 同一个键出现多次时后者覆盖前者
    pub fn parse_csv(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = match lines.first() {
            Some(first) if first.trim_start().to_lowercase().starts_with("board") => 1,
            _ => 0,
        };

        let mut schema = Self::new();
        for line in lines.iter().skip(start) {
            let row = parse_csv_record(line);
            if row.len() < 4 {
                debug!("跳过列数不足的行: {}", line);
                continue;
            }

            let board = row[0].trim().to_uppercase();
            let subject = row[1].trim().to_uppercase();
            let paper = normalize_paper(&row[2].trim().to_uppercase());

            let topics: Vec<String> = row[3..]
                .join(",")
                .split([',', ';'])
                .map(|t| t.trim().trim_matches('"').trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();

            schema
                .entries
                .insert(format!("{}-{}-{}", board, subject, paper), topics);
        }
        schema
    }

    /// 合并另一张表，同键以 `other` 为准
    pub fn merge(&mut self, other: TopicSchema) {
        self.entries.extend(other.entries);
    }

    /// 某张试卷的合法主题，没有配置时返回空切片
    pub fn valid_topics(&self, board: &str, subject: &str, paper: &str) -> &[String] {
        self.entries
            .get(&schema_key(board, subject, paper))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_paper(raw: &str) -> String {
    let mut code = raw.to_string();
    if raw.contains('1') {
        code = "P1".to_string();
    }
    if raw.contains('2') {
        code = "P2".to_string();
    }
    code
}

/// 按逗号切分一行，双引号内的逗号不切分，`""` 表示一个引号
fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}
