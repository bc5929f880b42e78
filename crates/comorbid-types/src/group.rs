//! Comorbidity group definitions.
//!
//! A comorbidity group is a named list of codes. A visit "has" the group when
//! at least one of its codes appears in the list. Definitions are the raw,
//! ordered form handed in by callers; the classifier converts them into
//! hashed lookup sets before use.

use crate::Code;

/// A named list of codes making up one comorbidity group.
///
/// The order of definitions handed to the classifier defines the order of
/// the output columns.
///
/// # Examples
///
/// ```
/// use comorbid_types::GroupDefinition;
///
/// let chf = GroupDefinition::new("CHF", ["39891", "4280", "4281"]);
/// assert_eq!(chf.name, "CHF");
/// assert_eq!(chf.len(), 3);
/// assert!(!chf.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupDefinition {
    /// Group name, used as the output column label.
    pub name: String,
    /// Codes belonging to the group. Duplicates are allowed and ignored.
    pub codes: Vec<Code>,
}

impl GroupDefinition {
    /// Creates a group definition from a name and any iterable of codes.
    pub fn new<I, C>(name: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Code>,
    {
        Self {
            name: name.into(),
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of listed codes (including duplicates).
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if the group lists no codes.
    ///
    /// An empty group is valid; no visit will ever match it.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl<N, I, C> From<(N, I)> for GroupDefinition
where
    N: Into<String>,
    I: IntoIterator<Item = C>,
    C: Into<Code>,
{
    fn from((name, codes): (N, I)) -> Self {
        Self::new(name, codes)
    }
}
