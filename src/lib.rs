//! # Exam Studio
//!
//! 把成批扫描的试题图片和评分标准图片自动配对，整理成可编辑的暂存表，
//! 经 AI 补全主题、分值、答题线数后写入题库。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据模型（Models）
//! - `models/` - 文件、题号、暂存行、题库记录、主题表、统计
//! - `loaders` - 从目录读取图片、从 TOML 读取试卷信息
//!
//! ### ② 配对层（Staging）
//! - `staging/` - 纯同步计算，文件名 → 暂存表
//! - `SchemeIndex` - 评分标准题号索引
//! - `ContextSet` - 共享上下文图的累积
//! - `StagingGrid` - 暂存表及编辑操作
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LlmService` - 识别主题、分值、线数，判分
//! - `QuestionLibrary` - 题库、资源、主题表的持久化
//! - `StatsService` - 主题掌握度
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"补全一张暂存表"的流程
//! - `EnrichFlow` - 逐行补全，可取消
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 加载 → 配对 → 补全 → 提交
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod staging;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{BatchMetadata, FileRef, Identifier, QuestionRecord};
pub use orchestrator::{App, RunStats};
pub use staging::{build_staging_grid, StagingGrid, StagingOutcome};
pub use workflow::{EnrichFlow, EnrichStats};
