use tracing::debug;

use crate::error::StagingError;
use crate::models::file_ref::FileRef;
use crate::models::staging::{RowField, StagingRow};

/// 可编辑的暂存表
///
/// 只属于创建它的那次导入会话。行顺序在组装时确定（题号升序），
/// 之后的任何编辑都不会改变顺序。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagingGrid {
    rows: Vec<StagingRow>,
}

impl StagingGrid {
    pub fn from_rows(rows: Vec<StagingRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[StagingRow] {
        &self.rows
    }

    pub fn row(&self, row_index: usize) -> Result<&StagingRow, StagingError> {
        let len = self.rows.len();
        self.rows
            .get(row_index)
            .ok_or(StagingError::RowOutOfRange { index: row_index, len })
    }

    fn row_mut(&mut self, row_index: usize) -> Result<&mut StagingRow, StagingError> {
        let len = self.rows.len();
        self.rows
            .get_mut(row_index)
            .ok_or(StagingError::RowOutOfRange { index: row_index, len })
    }

    /// 给某行追加图片
    ///
    /// 只在本行内追加，不检查其他行：同一张图可以同时出现在多行。
    pub fn add_images_to_row(
        &mut self,
        row_index: usize,
        new_files: impl IntoIterator<Item = FileRef>,
    ) -> Result<(), StagingError> {
        let row = self.row_mut(row_index)?;
        for file in new_files {
            debug!("第 {} 行追加图片: {}", row_index, file.name());
            row.images.push(file);
        }
        Ok(())
    }

    /// 删除某行的一张图片，返回被删除的文件
    pub fn remove_image_from_row(
        &mut self,
        row_index: usize,
        image_index: usize,
    ) -> Result<FileRef, StagingError> {
        let row = self.row_mut(row_index)?;
        let len = row.images.len();
        if image_index >= len {
            return Err(StagingError::ImageOutOfRange {
                row: row_index,
                index: image_index,
                len,
            });
        }
        Ok(row.images.remove(image_index))
    }

    /// 替换（或清空）某行的评分标准
    pub fn set_row_scheme(
        &mut self,
        row_index: usize,
        scheme: Option<FileRef>,
    ) -> Result<(), StagingError> {
        self.row_mut(row_index)?.scheme = scheme;
        Ok(())
    }

    /// 直接修改字段；`marks` / `lines` 非数字输入按 0 处理
    pub fn set_row_field(
        &mut self,
        row_index: usize,
        field: RowField,
        value: &str,
    ) -> Result<(), StagingError> {
        let row = self.row_mut(row_index)?;
        match field {
            RowField::Topic => row.topic = value.to_string(),
            RowField::Marks => row.marks = coerce_count(value),
            RowField::Lines => row.lines = coerce_count(value),
            RowField::QuestionText => row.question_text = value.to_string(),
            RowField::SchemeText => row.scheme_text = value.to_string(),
        }
        Ok(())
    }

    /// 用新内容替换整行（AI 补全后写回），题号不变
    pub fn replace_row(&mut self, row_index: usize, row: StagingRow) -> Result<(), StagingError> {
        *self.row_mut(row_index)? = row;
        Ok(())
    }

    /// 清空（重置或提交成功后）
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 取开头的数字部分："3.5" → 3，"12 marks" → 12；没有数字或超出范围时为 0
fn coerce_count(value: &str) -> u32 {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().unwrap_or(0)
}
