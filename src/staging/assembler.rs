//! 暂存行组装
//!
//! 每个题号一行，图片顺序固定为：整题图 → 共享上下文图 → 本题专属图，
//! 三类之间按文件名去重。行的全集只来自评分标准文件名。

use tracing::{debug, info, warn};

use crate::error::StagingError;
use crate::models::file_ref::FileRef;
use crate::models::identifier::Identifier;
use crate::models::staging::{StagingRow, DEFAULT_LINES};
use crate::staging::context::ContextSet;
use crate::staging::grid::StagingGrid;
use crate::staging::naming::{is_root_image, is_specific_image, line_count_hint_for};
use crate::staging::scheme_index::SchemeIndex;

/// 批量配对结果
#[derive(Debug, Clone)]
pub struct StagingOutcome {
    pub grid: StagingGrid,
    /// 无法解析题号的评分标准文件
    pub ignored_schemes: Vec<String>,
    /// 因重复题号被覆盖的评分标准文件
    pub overwritten_schemes: Vec<String>,
}

/// 找某大题的整题图（第一个匹配的文件）
pub fn find_root_image<'a>(question_files: &'a [FileRef], major: &str) -> Option<&'a FileRef> {
    question_files.iter().find(|f| is_root_image(f.name(), major))
}

/// 找某题号的专属图，保持输入顺序
pub fn find_specific_images(question_files: &[FileRef], id: &Identifier) -> Vec<FileRef> {
    question_files
        .iter()
        .filter(|f| is_specific_image(f.name(), id))
        .cloned()
        .collect()
}

/// 组装一行
///
/// `context` 必须是已经为本题号累积过的快照。
pub fn assemble_row(
    id: &Identifier,
    scheme_index: &SchemeIndex,
    question_files: &[FileRef],
    context: &ContextSet,
) -> StagingRow {
    let major = id.major();
    let mut images: Vec<FileRef> = Vec::new();

    let root = find_root_image(question_files, major).into_iter();
    let shared = context.snapshot(major).iter();
    let specific = find_specific_images(question_files, id);

    for file in root.chain(shared).chain(specific.iter()) {
        if images.iter().any(|placed| placed.name() == file.name()) {
            continue;
        }
        images.push(file.clone());
    }

    let mut row = StagingRow::new(id.clone(), scheme_index.get(id).cloned());
    row.lines = line_count_hint_for(images.iter().map(|f| f.name())).unwrap_or(DEFAULT_LINES);
    row.images = images;

    debug!("题号 {} 组装完成: {:?}", id, row.image_names());
    row
}

/// 由两组文件生成暂存表
///
/// 没有评分标准文件，或者没有一个评分标准能解析出题号时返回错误，
/// 不会退化成按题目文件名建表。
pub fn build_staging_grid(
    question_files: &[FileRef],
    scheme_files: &[FileRef],
) -> Result<StagingOutcome, StagingError> {
    if scheme_files.is_empty() {
        warn!("⚠️ 没有评分标准文件，拒绝生成暂存表");
        return Err(StagingError::NoSchemeFiles);
    }

    let index = SchemeIndex::build(scheme_files);
    if index.is_empty() {
        return Err(StagingError::NoRecognizedSchemes {
            ignored: index.ignored().to_vec(),
        });
    }

    let (_, rows) = index.sorted_identifiers().iter().fold(
        (ContextSet::new(), Vec::new()),
        |(context, mut rows), id| {
            let specific = find_specific_images(question_files, id);
            let context = context.accumulate(&specific, id.major());
            rows.push(assemble_row(id, &index, question_files, &context));
            (context, rows)
        },
    );

    info!(
        "✓ 暂存表生成完成: {} 行, 忽略 {} 个评分标准文件",
        rows.len(),
        index.ignored().len()
    );

    Ok(StagingOutcome {
        grid: StagingGrid::from_rows(rows),
        ignored_schemes: index.ignored().to_vec(),
        overwritten_schemes: index.overwritten().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<FileRef> {
        names.iter().map(|n| FileRef::new(*n, n.as_bytes().to_vec())).collect()
    }

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    fn row_images(grid: &StagingGrid, index: usize) -> Vec<&str> {
        grid.rows()[index].image_names()
    }

    #[test]
    fn test_end_to_end_pairing() {
        let schemes = files(&["m1.png", "m2.1.png", "m2.2.png"]);
        let questions = files(&["1.png", "2.png", "2.1.png", "2.1-plus.png", "2.2.png"]);

        let outcome = build_staging_grid(&questions, &schemes).unwrap();
        let grid = &outcome.grid;

        let ids: Vec<&str> = grid.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2.1", "2.2"]);

        assert_eq!(row_images(grid, 0), vec!["1.png"]);
        // 上下文在组装本行之前已经累积，所以 2.1 自己也能看到
        assert_eq!(row_images(grid, 1), vec!["2.png", "2.1-plus.png", "2.1.png"]);
        assert_eq!(row_images(grid, 2), vec!["2.png", "2.1-plus.png", "2.2.png"]);

        assert_eq!(grid.rows()[1].scheme.as_ref().unwrap().name(), "m2.1.png");
        assert!(outcome.ignored_schemes.is_empty());
    }

    #[test]
    fn test_context_is_forward_only() {
        let schemes = files(&["m1.3.png", "m1.1.png", "m1.2.png"]);
        let questions = files(&["1.1.png", "1.2.png", "1.2-plus.png", "1.3.png"]);

        let grid = build_staging_grid(&questions, &schemes).unwrap().grid;

        assert_eq!(row_images(&grid, 0), vec!["1.1.png"]);
        assert_eq!(row_images(&grid, 1), vec!["1.2-plus.png", "1.2.png"]);
        assert_eq!(row_images(&grid, 2), vec!["1.2-plus.png", "1.3.png"]);
    }

    #[test]
    fn test_assemble_row_order_and_dedup() {
        let schemes = files(&["m1.2.png"]);
        let index = SchemeIndex::build(&schemes);
        let questions = files(&["1.2.png", "1-plus.png", "1.png", "1.2-plus.png"]);

        // 1-plus.png 在 1.1 时已经进入上下文，1.2-plus.png 在本行累积
        let context = ContextSet::new()
            .accumulate(&files(&["1-plus.png"]), "1")
            .accumulate(&find_specific_images(&questions, &id("1.2")), "1");

        let row = assemble_row(&id("1.2"), &index, &questions, &context);
        assert_eq!(
            row.image_names(),
            vec!["1.png", "1-plus.png", "1.2-plus.png", "1.2.png"]
        );
    }

    #[test]
    fn test_prefix_overmatch_is_preserved() {
        let schemes = files(&["m1.2.png", "m1.20.png"]);
        let questions = files(&["1.2.png", "1.20.png"]);

        let grid = build_staging_grid(&questions, &schemes).unwrap().grid;
        assert_eq!(row_images(&grid, 0), vec!["1.2.png", "1.20.png"]);
        assert_eq!(row_images(&grid, 1), vec!["1.20.png"]);
    }

    #[test]
    fn test_line_hint_sets_lines() {
        let schemes = files(&["m3.1.png", "m3.2.png"]);
        let questions = files(&["3.1-6.png", "3.2.png"]);

        let grid = build_staging_grid(&questions, &schemes).unwrap().grid;
        assert_eq!(grid.rows()[0].lines, 6);
        assert_eq!(grid.rows()[1].lines, DEFAULT_LINES);
        assert_eq!(grid.rows()[0].marks, 0);
        assert_eq!(grid.rows()[0].topic, "General");
    }

    #[test]
    fn test_empty_scheme_set_is_rejected() {
        let questions = files(&["1.png", "1.1.png"]);
        let err = build_staging_grid(&questions, &[]).unwrap_err();
        assert!(matches!(err, StagingError::NoSchemeFiles));
    }

    #[test]
    fn test_no_recognized_scheme_is_rejected() {
        let questions = files(&["1.png"]);
        let err = build_staging_grid(&questions, &files(&["answers.png"])).unwrap_err();
        match err {
            StagingError::NoRecognizedSchemes { ignored } => {
                assert_eq!(ignored, vec!["answers.png".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_row_without_question_images() {
        let grid = build_staging_grid(&[], &files(&["m5.png"])).unwrap().grid;
        assert_eq!(grid.len(), 1);
        assert!(grid.rows()[0].images.is_empty());
    }
}
