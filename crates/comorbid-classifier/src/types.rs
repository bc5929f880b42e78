//! Classifier-specific types: errors and configuration.

use std::num::NonZeroUsize;

use thiserror::Error;

/// Errors that can occur before classification starts.
///
/// All of these are structural problems with the input or configuration and
/// are reported before any worker is dispatched, so a partially written
/// matrix is never returned alongside an error.
#[derive(Error, Debug)]
pub enum ComorbidError {
    /// Visit identifier and code columns have different lengths.
    #[error("Input length mismatch: {visits} visit identifiers but {codes} codes")]
    InputLengthMismatch {
        /// Number of visit identifiers supplied.
        visits: usize,
        /// Number of codes supplied.
        codes: usize,
    },

    /// Two comorbidity groups share a name.
    #[error("Duplicate comorbidity group name: {name}")]
    DuplicateGroupName {
        /// The repeated name.
        name: String,
    },

    /// A comorbidity group uses the name reserved for the visit identifier column.
    #[error("Group name '{name}' collides with the visit identifier column")]
    ReservedColumnName {
        /// The colliding name.
        name: String,
    },

    /// Invalid classifier configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A deserialized result has inconsistent dimensions.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// The worker thread pool could not be created.
    #[cfg(feature = "parallel")]
    #[error("Failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for classifier operations.
pub type ComorbidResult<T> = Result<T, ComorbidError>;

/// Default label of the leading visit identifier column.
pub const DEFAULT_VISIT_ID_LABEL: &str = "visitId";

/// How work is split across the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallelStrategy {
    /// Rows are walked in order; each row's groups are checked in parallel.
    ///
    /// Small units of work balanced by work stealing. Cancellation is polled
    /// before every row.
    #[default]
    Columns,
    /// Blocks of rows are checked in parallel, groups sequentially per row.
    ///
    /// Cancellation is polled before every block of `row_block` rows.
    Rows,
}

/// Configuration for a [`Classifier`](crate::Classifier).
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Worker thread count. `None` uses the available hardware parallelism.
    pub threads: Option<usize>,
    /// Work splitting strategy.
    pub strategy: ParallelStrategy,
    /// Rows per dispatched block with [`ParallelStrategy::Rows`].
    pub row_block: usize,
    /// Label of the leading visit identifier column in presented output.
    pub visit_id_label: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threads: None,
            strategy: ParallelStrategy::Columns,
            row_block: 256,
            visit_id_label: DEFAULT_VISIT_ID_LABEL.to_string(),
        }
    }
}

impl ClassifierConfig {
    /// Creates a config that runs everything on one worker thread.
    pub fn single_threaded() -> Self {
        Self {
            threads: Some(1),
            ..Self::default()
        }
    }

    /// Sets the worker thread count. Zero means "use default parallelism".
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = if threads == 0 { None } else { Some(threads) };
        self
    }

    /// Sets the work splitting strategy.
    pub fn with_strategy(mut self, strategy: ParallelStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the label of the visit identifier column.
    pub fn with_visit_id_label(mut self, label: impl Into<String>) -> Self {
        self.visit_id_label = label.into();
        self
    }

    /// Returns the number of worker threads this config asks for.
    pub fn effective_threads(&self) -> usize {
        self.threads
            .filter(|&n| n > 0)
            .unwrap_or_else(default_parallelism)
    }

    /// Checks the config for values that cannot work.
    pub fn validate(&self) -> ComorbidResult<()> {
        if self.row_block == 0 {
            return Err(ComorbidError::InvalidConfig(
                "row_block must be at least 1".to_string(),
            ));
        }
        if self.visit_id_label.is_empty() {
            return Err(ComorbidError::InvalidConfig(
                "visit_id_label must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the available hardware parallelism, falling back to one thread.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
