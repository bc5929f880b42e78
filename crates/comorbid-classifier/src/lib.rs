//! # comorbid-classifier
//!
//! Parallel comorbidity classification of (visit, code) observations.
//!
//! Given observations and an ordered list of named code groups, computes a
//! visit-by-group boolean matrix: a cell is true when at least one code seen
//! for the visit belongs to the group. Rows follow the first appearance of
//! each visit in the input; columns follow the group order.
//!
//! ## Features
//!
//! - `parallel` (default): Dispatches work on a rayon thread pool. Without it
//!   everything runs on the calling thread with identical results.
//! - `serde` (default): Serialization support for the presented result.
//!
//! ## Usage
//!
//! ```rust
//! use comorbid_classifier::{classify_observations, ClassifierConfig, NeverCancel};
//!
//! let visits = ["v1", "v1", "v2"];
//! let codes = ["X", "Y", "Z"];
//! let groups = [("G1", vec!["X"]), ("G2", vec!["Z", "Q"])];
//!
//! let result =
//!     classify_observations(&visits, &codes, groups, &ClassifierConfig::default(), &NeverCancel)
//!         .unwrap();
//!
//! assert!(result.is_complete());
//! assert_eq!(result.visit_ids(), ["v1", "v2"]);
//! assert_eq!(result.column_names(), ["visitId", "G1", "G2"]);
//! assert_eq!(result.column("G1"), Some(vec![true, false]));
//! assert_eq!(result.column("G2"), Some(vec![false, true]));
//! ```
//!
//! For repeated runs, build a [`Classifier`] once and call
//! [`Classifier::classify`] with a prebuilt [`GroupIndex`] and
//! [`ReferenceSets`].

#![warn(missing_docs)]

mod cancel;
mod classification;
mod classifier;
mod group_index;
mod matrix;
mod reference_sets;
mod types;

pub use cancel::{Cancellation, CancellationToken, NeverCancel};
pub use classification::Classification;
pub use classifier::{Classifier, ClassifyOutcome, ClassifyStatus};
pub use group_index::GroupIndex;
pub use matrix::ClassificationMatrix;
pub use reference_sets::{ReferenceGroup, ReferenceSets};
pub use types::{
    default_parallelism, ClassifierConfig, ComorbidError, ComorbidResult, ParallelStrategy,
    DEFAULT_VISIT_ID_LABEL,
};

// Re-export comorbid-types for convenience
pub use comorbid_types;
pub use comorbid_types::{Code, GroupDefinition, Observation, VisitId};

/// Classifies aligned visit/code columns against ordered comorbidity groups.
///
/// Validates everything first: column lengths, group name uniqueness, the
/// visit identifier label, and the config. Only then is the worker pool
/// started, so an `Err` never comes with partial work.
///
/// # Errors
/// - [`ComorbidError::InputLengthMismatch`] if the columns differ in length.
/// - [`ComorbidError::DuplicateGroupName`] if two groups share a name.
/// - [`ComorbidError::ReservedColumnName`] if a group is named like the
///   visit identifier column.
/// - [`ComorbidError::InvalidConfig`] or a pool error from [`Classifier::new`].
pub fn classify_observations<V, S, I, G, C>(
    visit_ids: &[V],
    codes: &[S],
    groups: I,
    config: &ClassifierConfig,
    cancel: &C,
) -> ComorbidResult<Classification>
where
    V: AsRef<str>,
    S: AsRef<str>,
    I: IntoIterator<Item = G>,
    G: Into<GroupDefinition>,
    C: Cancellation + ?Sized,
{
    let index = GroupIndex::from_columns(visit_ids, codes)?;
    let groups = ReferenceSets::build(groups)?;

    if groups.position(&config.visit_id_label).is_some() {
        return Err(ComorbidError::ReservedColumnName {
            name: config.visit_id_label.clone(),
        });
    }

    let classifier = Classifier::new(config.clone())?;
    let outcome = classifier.classify(&index, &groups, cancel);

    Ok(Classification::new(
        config.visit_id_label.as_str(),
        &index,
        &groups,
        outcome,
    ))
}
