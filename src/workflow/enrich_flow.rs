//! 暂存表补全流程 - 流程层
//!
//! 核心职责：把每一行交给分析服务，识别主题、分值、线数并转写文字
//!
//! 流程顺序：
//! 1. 逐行（严格按表内顺序，一次只处理一行）调用 `QuestionAnalyzer::analyze`
//! 2. 写回主题、分值、题目文字、评分标准文字
//! 3. 文件名里已经带了线数提示的行，保留文件名给出的线数
//! 4. 行与行之间固定等待，取消标志在两行之间检查

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::models::staging::StagingRow;
use crate::services::analyzer::{BoardContext, QuestionAnalyzer};
use crate::staging::{line_count_hint_for, StagingGrid};
use crate::utils::logging::truncate_text;
use crate::workflow::row_ctx::RowCtx;

/// 补全统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// 已补全的行数
    pub processed: usize,
    /// 总行数
    pub total: usize,
    /// 是否被中途取消
    pub cancelled: bool,
}

/// 暂存表补全流程
///
/// - 不持有暂存表，只借用
/// - 不访问存储
/// - 分析失败由分析服务兜底，这里永远不会失败
pub struct EnrichFlow {
    analyzer: Arc<dyn QuestionAnalyzer>,
    delay: Duration,
    verbose_logging: bool,
}

impl EnrichFlow {
    pub fn new(analyzer: Arc<dyn QuestionAnalyzer>, delay: Duration, verbose_logging: bool) -> Self {
        Self {
            analyzer,
            delay,
            verbose_logging,
        }
    }

    /// 补全单行，返回新行（题号、图片、评分标准不变）
    pub async fn enrich_row(&self, row: &StagingRow, context: &BoardContext) -> StagingRow {
        let enrichment = self
            .analyzer
            .analyze(&row.images, row.scheme.as_ref(), context)
            .await;

        let mut enriched = row.clone();
        enriched.topic = enrichment.topic;
        enriched.marks = enrichment.marks;
        enriched.question_text = enrichment.question_text;
        enriched.scheme_text = enrichment.scheme_text;

        // 文件名给出的线数优先
        if line_count_hint_for(row.image_names()).is_none() {
            enriched.lines = enrichment.lines;
        }
        enriched
    }

    /// 逐行补全整张暂存表
    ///
    /// 最后一行之后不再等待。`cancel` 置位后，下一行开始前停止，已补全的行保留。
    pub async fn enrich_all(
        &self,
        grid: &mut StagingGrid,
        context: &BoardContext,
        cancel: &AtomicBool,
    ) -> EnrichStats {
        let total = grid.len();
        let mut stats = EnrichStats {
            total,
            ..Default::default()
        };

        info!("🤖 开始补全暂存表，共 {} 行", total);

        for index in 0..total {
            if index > 0 && !self.delay.is_zero() && !cancel.load(Ordering::SeqCst) {
                sleep(self.delay).await;
            }
            // 等待期间也可能收到取消
            if cancel.load(Ordering::SeqCst) {
                warn!("⏹️ 补全已取消 ({}/{})", stats.processed, total);
                stats.cancelled = true;
                break;
            }

            let Ok(row) = grid.row(index) else {
                break;
            };
            let ctx = RowCtx::new(index + 1, total, row.id.clone());
            let enriched = self.enrich_row(row, context).await;

            info!(
                "{} ✓ 主题: {}, 分值: {}, 线数: {}",
                ctx, enriched.topic, enriched.marks, enriched.lines
            );
            if self.verbose_logging {
                debug!("{} 题目文字: {}", ctx, truncate_text(&enriched.question_text, 80));
            }

            if let Err(e) = grid.replace_row(index, enriched) {
                warn!("{} ⚠️ 写回失败: {}", ctx, e);
                continue;
            }
            stats.processed += 1;
        }

        info!("✓ 补全完成: {}/{}", stats.processed, total);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::file_ref::FileRef;
    use crate::services::analyzer::Enrichment;
    use crate::staging::build_staging_grid;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录调用顺序的假分析服务
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Vec<String>>>,
        cancel_after: Option<(usize, Arc<AtomicBool>)>,
    }

    #[async_trait]
    impl QuestionAnalyzer for Recorder {
        async fn analyze(
            &self,
            images: &[FileRef],
            scheme: Option<&FileRef>,
            _context: &BoardContext,
        ) -> Enrichment {
            let count = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(images.iter().map(|f| f.name().to_string()).collect());
                seen.len()
            };
            if let Some((limit, flag)) = &self.cancel_after {
                if count >= *limit {
                    flag.store(true, Ordering::SeqCst);
                }
            }
            Enrichment {
                topic: "Energy".to_string(),
                marks: count as u32,
                lines: 9,
                question_text: format!("q{}", count),
                scheme_text: scheme.map(|s| s.name().to_string()).unwrap_or_default(),
            }
        }

        async fn detect_topic(&self, _: &[FileRef], _: &BoardContext) -> String {
            "Energy".to_string()
        }
    }

    fn grid() -> StagingGrid {
        let schemes: Vec<FileRef> = ["m1.png", "m2.png", "m3.png"]
            .iter()
            .map(|n| FileRef::new(*n, vec![0u8]))
            .collect();
        let questions: Vec<FileRef> = ["1.png", "2-6.png", "3.png"]
            .iter()
            .map(|n| FileRef::new(*n, vec![1u8]))
            .collect();
        build_staging_grid(&questions, &schemes).unwrap().grid
    }

    #[tokio::test]
    async fn test_enrich_all_in_order() {
        let recorder = Arc::new(Recorder::default());
        let flow = EnrichFlow::new(recorder.clone(), Duration::ZERO, false);
        let mut grid = grid();

        let stats = flow
            .enrich_all(&mut grid, &BoardContext::default(), &AtomicBool::new(false))
            .await;

        assert_eq!(stats, EnrichStats { processed: 3, total: 3, cancelled: false });
        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![vec!["1.png"], vec!["2-6.png"], vec!["3.png"]]);

        let rows = grid.rows();
        assert_eq!(rows[0].marks, 1);
        assert_eq!(rows[2].marks, 3);
        assert_eq!(rows[1].scheme_text, "m2.png");
        assert_eq!(rows[0].question_text, "q1");
    }

    #[tokio::test]
    async fn test_filename_line_hint_wins() {
        let flow = EnrichFlow::new(Arc::new(Recorder::default()), Duration::ZERO, false);
        let mut grid = grid();
        flow.enrich_all(&mut grid, &BoardContext::default(), &AtomicBool::new(false))
            .await;

        assert_eq!(grid.rows()[0].lines, 9);
        assert_eq!(grid.rows()[1].lines, 6);
    }

    #[tokio::test]
    async fn test_cancel_between_rows() {
        let cancel = Arc::new(AtomicBool::new(false));
        let recorder = Arc::new(Recorder {
            cancel_after: Some((2, cancel.clone())),
            ..Default::default()
        });
        let flow = EnrichFlow::new(recorder.clone(), Duration::ZERO, false);
        let mut grid = grid();

        let stats = flow.enrich_all(&mut grid, &BoardContext::default(), &cancel).await;

        assert!(stats.cancelled);
        assert_eq!(stats.processed, 2);
        assert_eq!(grid.rows()[1].topic, "Energy");
        assert_eq!(grid.rows()[2].topic, "General");
        assert_eq!(grid.rows()[2].marks, 0);
    }

    #[tokio::test]
    async fn test_cancel_during_delay_stops_next_row() {
        let cancel = Arc::new(AtomicBool::new(false));
        let recorder = Arc::new(Recorder::default());
        let flow = EnrichFlow::new(recorder.clone(), Duration::from_millis(300), false);
        let mut grid = grid();

        let flag = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
        });

        let stats = flow.enrich_all(&mut grid, &BoardContext::default(), &cancel).await;

        assert!(stats.cancelled);
        assert_eq!(stats.processed, 1);
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
        assert_eq!(grid.rows()[1].topic, "General");
    }

    #[tokio::test]
    async fn test_delay_between_rows_only() {
        let flow = EnrichFlow::new(
            Arc::new(Recorder::default()),
            Duration::from_millis(20),
            false,
        );
        let mut grid = grid();
        let start = std::time::Instant::now();
        flow.enrich_all(&mut grid, &BoardContext::default(), &AtomicBool::new(false))
            .await;
        assert!(start.elapsed() >= Duration::from_millis(40));

        // 单行不等待
        let slow = EnrichFlow::new(Arc::new(Recorder::default()), Duration::from_secs(30), false);
        let mut single = StagingGrid::from_rows(grid.rows()[..1].to_vec());
        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            slow.enrich_all(&mut single, &BoardContext::default(), &AtomicBool::new(false)),
        )
        .await;
        assert!(finished.is_ok());
    }
}
