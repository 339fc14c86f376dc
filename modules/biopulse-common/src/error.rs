use thiserror::Error;

/// Top-level error for briefing runs. Retrieval failures are recoverable and
/// stay inside the scout crate; what surfaces here is fatal to the run.
#[derive(Error, Debug)]
pub enum BriefError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("briefing artifact failed validation: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type BriefResult<T> = Result<T, BriefError>;

/// A structural defect in a composed briefing. The pipeline treats any of
/// these as grounds to publish the empty artifact instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("briefing holds {count} items, limit is {limit}")]
    TooManyItems { count: usize, limit: usize },

    #[error("item {id}: {field} is empty")]
    EmptyField { id: String, field: &'static str },

    #[error("item {id}: {field} contains a literal line break")]
    LiteralLineBreak { id: String, field: &'static str },

    #[error("item {id}: source type {found} may not be published")]
    DisallowedSourceType { id: String, found: String },

    #[error("item {id}: {field} is not a calendar date: {value}")]
    BadDate {
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("item {id}: no sources attributed")]
    NoSources { id: String },
}
