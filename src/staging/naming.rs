//! 文件命名约定
//!
//! 批量导入完全依赖文件名来配对题目图片和评分标准。老师上传前必须按下表命名：
//!
//! | 规则 | 作用对象 | 约定 | 例子 |
//! |---|---|---|---|
//! | `scheme-id` | 评分标准 | 字母 `m`（不区分大小写）后紧跟点分数字 | `m1.2.png` → `1.2` |
//! | `line-hint` | 题目图片 | `-数字.`，表示答题线数 | `q1-6.png` → 6 |
//! | `context` | 题目图片 | 文件名含 `plus`，表示本小题及之后同大题小题共用 | `2.1-plus.png` |
//! | `root` | 题目图片 | 文件名主体恰为大题号或 `Q`+大题号 | `2.png`、`Q2.jpg` |
//! | `specific` | 题目图片 | 文件名以题号开头（不检查边界） | `1.2a.png` 属于 `1.2` |
//!
//! 所有函数对任意字符串都有定义，不匹配只是返回 None / false。

use regex::Regex;
use std::sync::LazyLock;

use crate::models::identifier::Identifier;

/// 一条命名规则
#[derive(Debug, Clone, Copy)]
pub struct NamingRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub example: &'static str,
}

pub const SCHEME_ID_RULE: NamingRule = NamingRule {
    name: "scheme-id",
    pattern: r"(?i)m(\d+(?:\.\d+)*)",
    example: "m1.2.png",
};

pub const LINE_HINT_RULE: NamingRule = NamingRule {
    name: "line-hint",
    pattern: r"-(\d+)\.",
    example: "q1-6.png",
};

/// 共享上下文标记（区分大小写的子串）
pub const CONTEXT_MARKER: &str = "plus";

/// 根图片允许的前缀（区分大小写）
pub const ROOT_PREFIXES: [&str; 2] = ["", "Q"];

/// 所有正则规则，便于日志和文档输出
pub const NAMING_RULES: [NamingRule; 2] = [SCHEME_ID_RULE, LINE_HINT_RULE];

static SCHEME_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SCHEME_ID_RULE.pattern).expect("scheme-id 正则无效"));

static LINE_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LINE_HINT_RULE.pattern).expect("line-hint 正则无效"));

/// 从评分标准文件名提取题号：`m1.2.png` → `1.2`，`M3.PNG` → `3`
pub fn extract_scheme_id(filename: &str) -> Option<Identifier> {
    SCHEME_ID_RE
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Identifier::parse(m.as_str()))
}

/// 从题目文件名提取答题线数：`q1-4.png` → 4
pub fn extract_line_count_hint(filename: &str) -> Option<u32> {
    LINE_HINT_RE
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 一组图片的线数提示，多个提示时取最后一个
pub fn line_count_hint_for<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<u32> {
    names
        .into_iter()
        .filter_map(extract_line_count_hint)
        .last()
}

/// 是否为共享上下文图片
pub fn is_context_file(filename: &str) -> bool {
    filename.contains(CONTEXT_MARKER)
}

/// 是否为某大题的整题图片：`{major}.<ext>` 或 `Q{major}.<ext>`
pub fn is_root_image(filename: &str, major: &str) -> bool {
    let Some((stem, ext)) = filename.rsplit_once('.') else {
        return false;
    };
    !ext.is_empty()
        && ROOT_PREFIXES
            .iter()
            .any(|prefix| stem.strip_prefix(prefix) == Some(major))
}

/// 是否为某题号的专属图片（纯前缀匹配，`1.20.png` 也会命中 `1.2`）
pub fn is_specific_image(filename: &str, id: &Identifier) -> bool {
    filename.starts_with(id.as_str())
}
