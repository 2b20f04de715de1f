//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一批题目的完整调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量配对处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载题目图片、评分标准图片、主题分类表
//! - 生成暂存表并输出配对结果
//! - 调度 AI 补全（可取消）
//! - 提交题库并输出全局统计
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一批文件 → 题库)
//!     ↓
//! staging (配对：纯计算)
//!     ↓
//! workflow::EnrichFlow (逐行补全)
//!     ↓
//! services (能力层：llm / library / store)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有存储和 LLM 服务
//! 2. **向下依赖**：编排层 → workflow → services
//! 3. **无业务逻辑**：只做调度和统计，不做具体配对判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, RunStats, PENDING_COMMIT_FILE};
