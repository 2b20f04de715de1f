//! 暂存行处理上下文
//!
//! 封装"我正在补全暂存表的第几行"这一信息

use std::fmt::Display;

use crate::models::identifier::Identifier;

/// 暂存行上下文（仅用于日志显示）
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 行号（从1开始）
    pub row_index: usize,

    /// 总行数
    pub total_rows: usize,

    /// 题号
    pub id: Identifier,
}

impl RowCtx {
    pub fn new(row_index: usize, total_rows: usize, id: Identifier) -> Self {
        Self {
            row_index,
            total_rows,
            id,
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[行 {}/{} 题号 {}]", self.row_index, self.total_rows, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = RowCtx::new(2, 5, Identifier::parse("3.1").unwrap());
        assert_eq!(ctx.to_string(), "[行 2/5 题号 3.1]");
    }
}
