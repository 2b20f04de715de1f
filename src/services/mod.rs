pub mod analyzer;
pub mod library;
pub mod llm_service;
pub mod stats_service;
pub mod store;

pub use analyzer::{BoardContext, Enrichment, QuestionAnalyzer, FALLBACK_TOPIC};
pub use library::{
    filter_questions, paper_questions, topic_groups, untagged_count, ClassifyStats,
    ImportSummary, LibraryBundle, LibraryFilter, QuestionLibrary,
};
pub use llm_service::{LlmService, MARKING_FAILED};
pub use stats_service::StatsService;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
