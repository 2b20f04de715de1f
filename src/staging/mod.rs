//! 批量配对层（Staging）
//!
//! ## 职责
//!
//! 把两组无序文件（题目图片、评分标准图片）配成可编辑的暂存表，再转成题库记录。
//! 全部是同步的纯内存计算，不访问网络和存储。
//!
//! ## 流程
//!
//! ```text
//! 评分标准文件 ──▶ scheme_index (题号 → 文件, 升序题号)
//!                        │
//!                        ▼ 逐个题号
//! 题目图片 ──▶ context (累积共享图) ──▶ assembler (整题图 → 共享图 → 专属图)
//!                                              │
//!                                              ▼
//!                                      grid (人工 / AI 编辑)
//!                                              │
//!                                              ▼
//!                                      commit (QuestionRecord)
//! ```

pub mod assembler;
pub mod commit;
pub mod context;
pub mod grid;
pub mod naming;
pub mod scheme_index;

pub use assembler::{
    assemble_row, build_staging_grid, find_root_image, find_specific_images, StagingOutcome,
};
pub use commit::{commit_staging, incomplete_rows};
pub use context::ContextSet;
pub use grid::StagingGrid;
pub use naming::{extract_line_count_hint, extract_scheme_id, line_count_hint_for};
pub use scheme_index::SchemeIndex;
