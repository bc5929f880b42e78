//! Visit grouping.
//!
//! Groups (visit, code) observations by visit identifier. Each distinct visit
//! gets a row number the first time it is seen, and its codes are stored in
//! an arena slot at that row. The row number is what the classifier writes
//! to, so it is never searched for again after the build.

use std::collections::HashMap;

use comorbid_types::{Code, Observation, VisitId};
use tracing::debug;

use crate::types::{ComorbidError, ComorbidResult};

/// Codes grouped per visit, with visits in first-occurrence order.
///
/// Immutable once built.
///
/// # Example
///
/// ```
/// use comorbid_classifier::GroupIndex;
///
/// let index = GroupIndex::build([("v1", "A"), ("v2", "B"), ("v1", "C")]);
///
/// assert_eq!(index.visit_ids(), ["v1", "v2"]);
/// assert_eq!(index.codes_for("v1"), Some(&["A".to_string(), "C".to_string()][..]));
/// assert_eq!(index.row_of("v2"), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    /// Distinct visit identifiers, indexed by row.
    visit_ids: Vec<VisitId>,
    /// Reverse lookup: visit identifier -> row.
    rows_by_visit: HashMap<VisitId, usize>,
    /// Codes observed for each row.
    codes_by_row: Vec<Vec<Code>>,
    /// Total observations consumed.
    observation_count: usize,
}

impl GroupIndex {
    /// Builds an index from a sequence of observations.
    ///
    /// Accepts anything convertible into an [`Observation`], including
    /// `(visit, code)` tuples.
    pub fn build<I, O>(observations: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Observation>,
    {
        let observations = observations.into_iter();
        let mut index = Self::with_capacity(observations.size_hint().0);

        for observation in observations {
            let Observation { visit_id, code } = observation.into();
            index.push(&visit_id, code);
        }

        index.log_built();
        index
    }

    /// Builds an index from positionally aligned visit and code columns.
    ///
    /// # Errors
    /// Returns [`ComorbidError::InputLengthMismatch`] if the columns differ in
    /// length. Nothing is indexed in that case.
    pub fn from_columns<V, C>(visit_ids: &[V], codes: &[C]) -> ComorbidResult<Self>
    where
        V: AsRef<str>,
        C: AsRef<str>,
    {
        if visit_ids.len() != codes.len() {
            return Err(ComorbidError::InputLengthMismatch {
                visits: visit_ids.len(),
                codes: codes.len(),
            });
        }

        let mut index = Self::with_capacity(visit_ids.len());
        for (visit_id, code) in visit_ids.iter().zip(codes) {
            index.push(visit_id.as_ref(), code.as_ref().to_string());
        }

        index.log_built();
        Ok(index)
    }

    fn with_capacity(observations: usize) -> Self {
        // Visit count is unknown up front; most inputs carry several codes per visit.
        let visits = observations / 4;
        Self {
            visit_ids: Vec::with_capacity(visits),
            rows_by_visit: HashMap::with_capacity(visits),
            codes_by_row: Vec::with_capacity(visits),
            observation_count: 0,
        }
    }

    fn push(&mut self, visit_id: &str, code: Code) {
        let row = match self.rows_by_visit.get(visit_id) {
            Some(&row) => row,
            None => {
                let row = self.visit_ids.len();
                self.rows_by_visit.insert(visit_id.to_string(), row);
                self.visit_ids.push(visit_id.to_string());
                self.codes_by_row.push(Vec::new());
                row
            }
        };
        self.codes_by_row[row].push(code);
        self.observation_count += 1;
    }

    fn log_built(&self) {
        debug!(
            observations = self.observation_count,
            visits = self.visit_ids.len(),
            "visit index built"
        );
    }

    /// Returns the number of distinct visits (output rows).
    pub fn len(&self) -> usize {
        self.visit_ids.len()
    }

    /// Returns true if no observations were indexed.
    pub fn is_empty(&self) -> bool {
        self.visit_ids.is_empty()
    }

    /// Returns the total number of observations consumed.
    pub fn observation_count(&self) -> usize {
        self.observation_count
    }

    /// Returns the distinct visit identifiers in first-occurrence order.
    pub fn visit_ids(&self) -> &[VisitId] {
        &self.visit_ids
    }

    /// Returns the codes observed for the visit at `row`.
    ///
    /// # Panics
    /// Panics if `row >= self.len()`.
    pub fn codes(&self, row: usize) -> &[Code] {
        &self.codes_by_row[row]
    }

    /// Returns the codes observed for a visit, if it was seen.
    pub fn codes_for(&self, visit_id: &str) -> Option<&[Code]> {
        self.row_of(visit_id).map(|row| self.codes(row))
    }

    /// Returns the row assigned to a visit, if it was seen.
    pub fn row_of(&self, visit_id: &str) -> Option<usize> {
        self.rows_by_visit.get(visit_id).copied()
    }

    /// Iterates over `(visit_id, codes)` in row order.
    pub fn iter(&self) -> impl Iterator<Item = (&VisitId, &[Code])> {
        self.visit_ids
            .iter()
            .zip(self.codes_by_row.iter().map(Vec::as_slice))
    }
}
