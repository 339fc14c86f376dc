pub mod compose;
pub mod dedup;
pub mod output;
pub mod pipeline;
pub mod rank;
pub mod recency;
pub mod schema;

pub use compose::BriefingComposer;
pub use output::BriefingWriter;
pub use pipeline::{BriefingPipeline, RunStats};
pub use recency::{Admission, RecencyFilter};
pub use schema::SchemaValidator;
