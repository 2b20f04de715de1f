use chrono::Utc;
use uuid::Uuid;

use crate::models::question::{BatchMetadata, QuestionRecord, QuestionType, StoredImage};
use crate::staging::grid::StagingGrid;

/// 把暂存表转换成题库记录，每行一条，顺序不变
///
/// 不检查完整性（0 分、没有评分标准的行照样生成），相当于"存草稿"；
/// 是否提醒用户由调用方决定。这里不修改暂存表，清空由题库在写入成功后完成。
pub fn commit_staging(grid: &StagingGrid, batch: &BatchMetadata) -> Vec<QuestionRecord> {
    let created_at = Utc::now();
    grid.rows()
        .iter()
        .map(|row| QuestionRecord {
            id: format!("c-{}", Uuid::new_v4()),
            kind: QuestionType::Image,
            board: batch.board.clone(),
            subject: batch.subject.clone(),
            year: batch.year,
            paper: batch.paper.clone(),
            topic: row.topic.clone(),
            marks: row.marks,
            lines: row.lines,
            images: row.images.iter().map(StoredImage::from).collect(),
            scheme: row.scheme.as_ref().map(StoredImage::from),
            question_text: row.question_text.clone(),
            scheme_text: row.scheme_text.clone(),
            created_at,
        })
        .collect()
}

/// 统计不完整的行（0 分或没有评分标准），供提交前提醒
pub fn incomplete_rows(grid: &StagingGrid) -> Vec<usize> {
    grid.rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row.marks == 0 || row.scheme.is_none())
        .map(|(i, _)| i)
        .collect()
}
