pub mod file_ref;
pub mod identifier;
pub mod loaders;
pub mod question;
pub mod resource;
pub mod schema;
pub mod staging;
pub mod stats;

pub use file_ref::FileRef;
pub use identifier::Identifier;
pub use loaders::{load_batch_metadata, load_files_from_dir};
pub use question::{BatchMetadata, QuestionRecord, QuestionType, StoredImage};
pub use resource::{resource_key, PaperResource, ResourceKind, ResourceMap};
pub use schema::{schema_key, TopicSchema};
pub use staging::{RowField, StagingRow, DEFAULT_LINES, DEFAULT_TOPIC};
pub use stats::{TopicStat, UserStats};
