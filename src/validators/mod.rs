//! Cross-file validators
//!
//! Checks that only make sense once every include is resolved. Validators run
//! in registration order after dependency lists are assigned; the first
//! failure aborts the run.

mod unique_messages;

pub use unique_messages::UniqueMessageIdsAcrossDependencies;

use thiserror::Error;

use crate::graph::IncludeGraph;
use crate::model::DialectSet;

/// Why a validator rejected a set of dialects
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("message ids {ids:?} in '{dependency}' conflict with '{file}' or one of its other dependencies")]
    DuplicateMessageIds {
        file: String,
        dependency: String,
        ids: Vec<u32>,
    },

    #[error("message names {names:?} in '{dependency}' conflict with '{file}' or one of its other dependencies")]
    DuplicateMessageNames {
        file: String,
        dependency: String,
        names: Vec<String>,
    },

    #[error("{reason}")]
    Custom { reason: String },
}

/// A post-resolution check over the expanded dialects and their include graph
pub trait DialectValidator {
    /// Name used in failure reports
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("validator")
    }

    fn validate(&self, files: &DialectSet, graph: &IncludeGraph) -> Result<(), ValidationFailure>;
}
