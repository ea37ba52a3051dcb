//! Error types for loading inputs and running comparisons.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the library.
///
/// Incomplete data (unloaded results, orphan tests, empty judge lists) is never
/// an error; it degrades to absence values inside the aggregations.
#[derive(Error, Debug)]
pub enum TrendError {
    /// A two-run comparison was requested over some other number of reports.
    #[error("Comparing runs requires exactly 2 selected reports, got {got}")]
    ComparisonArity { got: usize },

    /// A run selection names a run that is not in the snapshot.
    #[error("Run `{run_id}` is not part of the snapshot")]
    UnknownRun { run_id: String },

    #[error("Failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in `{}`: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML in `{}`: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
