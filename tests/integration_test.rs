use async_trait::async_trait;
use exam_studio::config::Config;
use exam_studio::error::StorageError;
use exam_studio::models::{BatchMetadata, FileRef, QuestionRecord, QuestionType};
use exam_studio::services::{
    BoardContext, Enrichment, KeyValueStore, MemoryStore, QuestionAnalyzer, QuestionLibrary,
    StatsService,
};
use exam_studio::staging::build_staging_grid;
use exam_studio::workflow::EnrichFlow;
use exam_studio::orchestrator::PENDING_COMMIT_FILE;
use exam_studio::App;
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// 按题目图片数量给分的假分析服务
struct StubAnalyzer;

#[async_trait]
impl QuestionAnalyzer for StubAnalyzer {
    async fn analyze(
        &self,
        images: &[FileRef],
        scheme: Option<&FileRef>,
        context: &BoardContext,
    ) -> Enrichment {
        Enrichment {
            topic: context
                .valid_topics
                .first()
                .cloned()
                .unwrap_or_else(|| "Forces".to_string()),
            marks: images.len() as u32,
            lines: 2,
            question_text: images
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join("+"),
            scheme_text: scheme.map(|s| s.name().to_string()).unwrap_or_default(),
        }
    }

    async fn detect_topic(&self, _images: &[FileRef], _context: &BoardContext) -> String {
        "Waves".to_string()
    }
}

/// 只能读不能写的存储
struct ReadOnlyStore;

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _collection: &str) -> Result<Option<JsonValue>, StorageError> {
        Ok(None)
    }

    async fn set(&self, collection: &str, _value: JsonValue) -> Result<(), StorageError> {
        Err(StorageError::write_failed(
            collection,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        ))
    }
}

fn files(names: &[&str]) -> Vec<FileRef> {
    names
        .iter()
        .map(|n| FileRef::new(*n, n.as_bytes().to_vec()))
        .collect()
}

fn batch() -> BatchMetadata {
    BatchMetadata {
        board: "AQA".to_string(),
        subject: "PHYSICS".to_string(),
        year: 2023,
        paper: "P2".to_string(),
    }
}

#[tokio::test]
async fn test_stage_enrich_commit_export_import() {
    let questions = files(&["2.png", "2.1-plus.png", "2.1.png", "2.2-5.png", "3.png"]);
    let schemes = files(&["m3.png", "m2.1.png", "m2.2.png", "readme.txt"]);

    let outcome = build_staging_grid(&questions, &schemes).unwrap();
    assert_eq!(outcome.ignored_schemes, vec!["readme.txt"]);
    let mut grid = outcome.grid;
    let ids: Vec<&str> = grid.rows().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["2.1", "2.2", "3"]);
    assert_eq!(grid.rows()[1].image_names(), vec!["2.png", "2.1-plus.png", "2.2-5.png"]);

    let flow = EnrichFlow::new(Arc::new(StubAnalyzer), Duration::ZERO, false);
    let stats = flow
        .enrich_all(&mut grid, &BoardContext::default(), &AtomicBool::new(false))
        .await;
    assert_eq!(stats.processed, 3);
    assert_eq!(grid.rows()[0].marks, 3);
    // 文件名线数提示优先于 AI 结果
    assert_eq!(grid.rows()[1].lines, 5);
    assert_eq!(grid.rows()[2].lines, 2);

    let store = Arc::new(MemoryStore::new());
    let library = QuestionLibrary::new(store.clone());
    let committed = library.commit_staging(&mut grid, &batch()).await.unwrap();
    assert_eq!(committed, 3);
    assert!(grid.is_empty());

    let stored = library.load().await.unwrap();
    assert!(stored.iter().all(|q| q.kind == QuestionType::Image && q.year == 2023));
    assert_eq!(stored[0].question_text, "2.png+2.1-plus.png+2.1.png");
    assert_eq!(stored[2].scheme.as_ref().unwrap().name, "m3.png");
    let restored = stored[0].image_files().unwrap();
    assert_eq!(restored[1].bytes(), b"2.1-plus.png");

    // 导出再导入到空题库
    let dir = tempfile::tempdir().unwrap();
    let backup = dir.path().join("library.json");
    library.export_to_file(&backup).await.unwrap();

    let other = QuestionLibrary::new(Arc::new(MemoryStore::new()));
    let summary = other.import_from_file(&backup).await.unwrap();
    assert_eq!(summary.questions, 3);
    assert_eq!(other.load().await.unwrap(), stored);

    // 考试统计
    let stats_service = StatsService::new(store);
    let user_stats = stats_service.record_exam(&stored, &[3, 1, 0]).await.unwrap();
    assert_eq!(user_stats["Forces"].total, 3 + 3 + 1);
    assert_eq!(user_stats["Forces"].correct, 4);
}

#[tokio::test]
async fn test_commit_failure_keeps_staging_grid() {
    let questions = files(&["1.png", "2.png"]);
    let schemes = files(&["m1.png", "m2.png"]);
    let mut grid = build_staging_grid(&questions, &schemes).unwrap().grid;

    let library = QuestionLibrary::new(Arc::new(ReadOnlyStore));
    let result = library.commit_staging(&mut grid, &batch()).await;

    assert!(result.is_err());
    assert_eq!(grid.len(), 2);
    assert_eq!(grid.rows()[0].image_names(), vec!["1.png"]);
}

fn write_file(path: &Path, content: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[tokio::test]
async fn test_app_run_with_topic_schema() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_file(&root.join("q/1.png"), b"q1");
    write_file(&root.join("q/1.1-plus.png"), b"ctx");
    write_file(&root.join("q/1.1.png"), b"q11");
    write_file(&root.join("s/m1.1.png"), b"s11");
    write_file(&root.join("s/m1.2.png"), b"s12");
    write_file(
        &root.join("topics.csv"),
        b"board,subject,paper,topics\nAQA,Physics,Paper 2,\"Energy; Particle model\"\n",
    );

    let config = Config {
        question_dir: root.join("q"),
        scheme_dir: root.join("s"),
        data_dir: root.join("data"),
        topic_schema_csv: Some(root.join("topics.csv")),
        enrich_delay_ms: 0,
        output_log_file: root.join("run.txt").to_string_lossy().to_string(),
        ..Config::default()
    };
    let store = Arc::new(MemoryStore::new());
    let app = App::with_parts(config, batch(), store.clone(), Arc::new(StubAnalyzer));

    let stats = app.run().await.unwrap();
    assert_eq!(stats.committed, 2);
    assert_eq!(stats.enriched, 2);
    assert_eq!(stats.library_total, 2);

    let library = QuestionLibrary::new(store);
    let stored = library.load().await.unwrap();
    assert!(stored.iter().all(|q| q.topic == "Energy"));
    let names: Vec<&str> = stored[1].images.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["1.png", "1.1-plus.png"]);
}

#[tokio::test]
async fn test_app_run_without_recognized_schemes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_file(&root.join("q/1.png"), b"q1");
    write_file(&root.join("s/scan.png"), b"?");

    let config = Config {
        question_dir: root.join("q"),
        scheme_dir: root.join("s"),
        output_log_file: root.join("run.txt").to_string_lossy().to_string(),
        ..Config::default()
    };
    let store = Arc::new(MemoryStore::new());
    let app = App::with_parts(config, batch(), store.clone(), Arc::new(StubAnalyzer));

    let stats = app.run().await.unwrap();
    assert_eq!(stats.committed, 0);
    assert!(QuestionLibrary::new(store).load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_app_run_commit_failure_saves_pending_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_file(&root.join("q/1.png"), b"q1");
    write_file(&root.join("s/m1.png"), b"s1");

    let config = Config {
        question_dir: root.join("q"),
        scheme_dir: root.join("s"),
        data_dir: root.join("data"),
        enrich_delay_ms: 0,
        output_log_file: root.join("run.txt").to_string_lossy().to_string(),
        ..Config::default()
    };
    let app = App::with_parts(config, batch(), Arc::new(ReadOnlyStore), Arc::new(StubAnalyzer));

    let stats = app.run().await.unwrap();
    assert_eq!(stats.committed, 0);
    assert_eq!(stats.enriched, 1);
    let pending = stats.pending_file.unwrap();
    assert_eq!(pending, root.join("data").join(PENDING_COMMIT_FILE));

    // 补全结果保存在待提交文件里
    let content = std::fs::read_to_string(&pending).unwrap();
    let records: Vec<QuestionRecord> = serde_json::from_str(&content).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].topic, "Forces");
    assert_eq!(records[0].question_text, "1.png");
    assert_eq!(records[0].scheme.as_ref().unwrap().name, "m1.png");
}
