pub mod config;
pub mod error;
pub mod types;
pub mod window;

pub use config::{BriefingConfig, Preset, VerificationMode};
pub use error::{BriefError, BriefResult, SchemaError};
pub use types::*;
pub use window::{AdmissibilityWindow, RunClock, WINDOW_HOURS};
