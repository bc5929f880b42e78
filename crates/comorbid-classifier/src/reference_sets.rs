//! Comorbidity reference sets.
//!
//! Converts ordered group definitions into hashed code sets. The conversion
//! is paid once per classification and turns every membership test into a
//! hash lookup instead of a scan of the group's code list.

use std::collections::HashSet;

use comorbid_types::{Code, GroupDefinition};
use tracing::debug;

use crate::types::{ComorbidError, ComorbidResult};

/// A named set of codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceGroup {
    name: String,
    codes: HashSet<Code>,
}

impl ReferenceGroup {
    /// Creates a group from a definition, dropping duplicate codes.
    pub fn new(definition: GroupDefinition) -> Self {
        Self {
            name: definition.name,
            codes: definition.codes.into_iter().collect(),
        }
    }

    /// Returns the group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of distinct codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if the group has no codes.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Returns true if `code` belongs to this group.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Returns true if any of `codes` belongs to this group.
    ///
    /// Stops at the first match.
    pub fn matches_any<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        codes.iter().any(|code| self.contains(code.as_ref()))
    }
}

/// Ordered comorbidity groups. Order defines output columns.
///
/// # Example
///
/// ```
/// use comorbid_classifier::ReferenceSets;
///
/// let sets = ReferenceSets::build([
///     ("CHF", vec!["4280", "4281"]),
///     ("Liver", vec!["5715"]),
/// ])
/// .unwrap();
///
/// assert_eq!(sets.names().collect::<Vec<_>>(), ["CHF", "Liver"]);
/// assert!(sets.get(0).unwrap().contains("4281"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReferenceSets {
    groups: Vec<ReferenceGroup>,
}

impl ReferenceSets {
    /// Builds reference sets from ordered group definitions.
    ///
    /// Accepts [`GroupDefinition`]s or anything convertible into one, such as
    /// `(name, codes)` tuples.
    ///
    /// # Errors
    /// Returns [`ComorbidError::DuplicateGroupName`] if two groups share a name.
    pub fn build<I, G>(groups: I) -> ComorbidResult<Self>
    where
        I: IntoIterator<Item = G>,
        G: Into<GroupDefinition>,
    {
        let groups = groups.into_iter();
        let mut seen: HashSet<String> = HashSet::with_capacity(groups.size_hint().0);
        let mut built = Vec::with_capacity(groups.size_hint().0);

        for group in groups {
            let definition = group.into();
            if !seen.insert(definition.name.clone()) {
                return Err(ComorbidError::DuplicateGroupName {
                    name: definition.name,
                });
            }
            built.push(ReferenceGroup::new(definition));
        }

        debug!(
            groups = built.len(),
            codes = built.iter().map(ReferenceGroup::len).sum::<usize>(),
            "reference sets built"
        );

        Ok(Self { groups: built })
    }

    /// Returns the number of groups (output boolean columns).
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the group at column `col`.
    pub fn get(&self, col: usize) -> Option<&ReferenceGroup> {
        self.groups.get(col)
    }

    /// Returns the column of the group called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.name == name)
    }

    /// Iterates over group names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(ReferenceGroup::name)
    }

    /// Iterates over groups in column order.
    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceGroup> {
        self.groups.iter()
    }

    /// Returns the groups as a slice.
    pub fn as_slice(&self) -> &[ReferenceGroup] {
        &self.groups
    }
}

impl<'a> IntoIterator for &'a ReferenceSets {
    type Item = &'a ReferenceGroup;
    type IntoIter = std::slice::Iter<'a, ReferenceGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
