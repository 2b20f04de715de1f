pub mod enrich_flow;
pub mod row_ctx;

pub use enrich_flow::{EnrichFlow, EnrichStats};
pub use row_ctx::RowCtx;
