//! Presented classification result.
//!
//! Bundles the row keys, column labels and boolean matrix into the shape a
//! host expects from a table: a leading visit identifier column followed by
//! one boolean column per comorbidity group, in group order.

use std::collections::HashMap;

use comorbid_types::VisitId;

use crate::classifier::{ClassifyOutcome, ClassifyStatus};
use crate::group_index::GroupIndex;
use crate::matrix::ClassificationMatrix;
use crate::reference_sets::ReferenceSets;
#[cfg(feature = "serde")]
use crate::types::ComorbidError;

/// Classification output ready to hand to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ClassificationParts"))]
pub struct Classification {
    visit_id_label: String,
    visit_ids: Vec<VisitId>,
    group_names: Vec<String>,
    matrix: ClassificationMatrix,
    status: ClassifyStatus,
    #[cfg_attr(feature = "serde", serde(skip))]
    lookup: Lookup,
}

/// Name -> position maps for rows and columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Lookup {
    rows_by_visit: HashMap<VisitId, usize>,
    cols_by_group: HashMap<String, usize>,
}

impl Lookup {
    fn build(visit_ids: &[VisitId], group_names: &[String]) -> Self {
        Self {
            rows_by_visit: positions(visit_ids),
            cols_by_group: positions(group_names),
        }
    }
}

fn positions(names: &[String]) -> HashMap<String, usize> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

/// Unchecked wire form of [`Classification`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ClassificationParts {
    visit_id_label: String,
    visit_ids: Vec<VisitId>,
    group_names: Vec<String>,
    matrix: ClassificationMatrix,
    status: ClassifyStatus,
}

#[cfg(feature = "serde")]
impl TryFrom<ClassificationParts> for Classification {
    type Error = ComorbidError;

    fn try_from(parts: ClassificationParts) -> Result<Self, Self::Error> {
        let ClassificationParts {
            visit_id_label,
            visit_ids,
            group_names,
            matrix,
            status,
        } = parts;

        if (matrix.rows(), matrix.cols()) != (visit_ids.len(), group_names.len()) {
            return Err(ComorbidError::InvalidShape(format!(
                "{}x{} matrix for {} visits and {} groups",
                matrix.rows(),
                matrix.cols(),
                visit_ids.len(),
                group_names.len()
            )));
        }
        if let ClassifyStatus::Cancelled { rows_completed } = status {
            if rows_completed > visit_ids.len() {
                return Err(ComorbidError::InvalidShape(format!(
                    "{rows_completed} rows completed out of {}",
                    visit_ids.len()
                )));
            }
        }

        let lookup = Lookup::build(&visit_ids, &group_names);
        if lookup.rows_by_visit.len() != visit_ids.len() {
            return Err(ComorbidError::InvalidShape(
                "visit identifiers are not distinct".to_string(),
            ));
        }
        if lookup.cols_by_group.len() != group_names.len() {
            return Err(ComorbidError::InvalidShape(
                "group names are not distinct".to_string(),
            ));
        }

        Ok(Self {
            visit_id_label,
            visit_ids,
            group_names,
            matrix,
            status,
            lookup,
        })
    }
}

impl Classification {
    /// Assembles a result from the classifier inputs and its outcome.
    ///
    /// # Panics
    /// Panics if the matrix shape does not match `index` and `groups`.
    pub fn new(
        visit_id_label: impl Into<String>,
        index: &GroupIndex,
        groups: &ReferenceSets,
        outcome: ClassifyOutcome,
    ) -> Self {
        assert_eq!(
            (outcome.matrix.rows(), outcome.matrix.cols()),
            (index.len(), groups.len()),
            "matrix shape does not match visits x groups"
        );
        let visit_ids = index.visit_ids().to_vec();
        let group_names: Vec<String> = groups.names().map(str::to_string).collect();
        Self {
            visit_id_label: visit_id_label.into(),
            lookup: Lookup::build(&visit_ids, &group_names),
            visit_ids,
            group_names,
            matrix: outcome.matrix,
            status: outcome.status,
        }
    }

    /// Returns the label of the leading visit identifier column.
    pub fn visit_id_label(&self) -> &str {
        &self.visit_id_label
    }

    /// Returns the row keys: distinct visits in first-occurrence order.
    pub fn visit_ids(&self) -> &[VisitId] {
        &self.visit_ids
    }

    /// Returns the group names in column order.
    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Returns every column label, visit identifier column first.
    pub fn column_names(&self) -> Vec<&str> {
        std::iter::once(self.visit_id_label.as_str())
            .chain(self.group_names.iter().map(String::as_str))
            .collect()
    }

    /// Returns the number of rows.
    pub fn nrows(&self) -> usize {
        self.visit_ids.len()
    }

    /// Returns the underlying matrix.
    pub fn matrix(&self) -> &ClassificationMatrix {
        &self.matrix
    }

    /// Returns the boolean column for a group.
    pub fn column(&self, group: &str) -> Option<Vec<bool>> {
        self.group_position(group).map(|col| self.matrix.column(col))
    }

    /// Iterates over `(group name, column)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, Vec<bool>)> + '_ {
        self.group_names
            .iter()
            .enumerate()
            .map(|(col, name)| (name.as_str(), self.matrix.column(col)))
    }

    /// Returns the row of `visit_id`, if present.
    pub fn row_of(&self, visit_id: &str) -> Option<usize> {
        self.lookup.rows_by_visit.get(visit_id).copied()
    }

    /// Returns whether `visit_id` has `group`, if both exist.
    pub fn has(&self, visit_id: &str, group: &str) -> Option<bool> {
        let row = self.row_of(visit_id)?;
        let col = self.group_position(group)?;
        Some(self.matrix.get(row, col))
    }

    /// Returns the completion status.
    pub fn status(&self) -> ClassifyStatus {
        self.status
    }

    /// Returns true if every row was computed.
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    /// Splits the result into row keys, group names and matrix.
    pub fn into_parts(self) -> (Vec<VisitId>, Vec<String>, ClassificationMatrix) {
        (self.visit_ids, self.group_names, self.matrix)
    }

    fn group_position(&self, group: &str) -> Option<usize> {
        self.lookup.cols_by_group.get(group).copied()
    }
}
