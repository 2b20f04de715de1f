use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个主题的累计得分
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStat {
    pub correct: u32,
    pub total: u32,
}

impl TopicStat {
    /// 掌握度百分比（四舍五入），没有作答记录时为 0
    pub fn mastery_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// 主题 → 累计得分
pub type UserStats = BTreeMap<String, TopicStat>;
