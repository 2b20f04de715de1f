pub mod file_loader;
pub mod toml_loader;

pub use file_loader::load_files_from_dir;
pub use toml_loader::load_batch_metadata;
