//! Visit/code observation type.
//!
//! An observation records that a code was seen during a visit. Input to the
//! classifier is an ordered sequence of observations in which the same visit
//! identifier usually repeats once per code.

use crate::{Code, VisitId};

/// A single (visit, code) pair.
///
/// # Examples
///
/// ```
/// use comorbid_types::Observation;
///
/// let obs = Observation::new("v1", "4280");
/// assert_eq!(obs.visit_id, "v1");
/// assert_eq!(obs.code, "4280");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// The visit this code was observed for.
    pub visit_id: VisitId,
    /// The observed code.
    pub code: Code,
}

impl Observation {
    /// Creates a new observation.
    pub fn new(visit_id: impl Into<VisitId>, code: impl Into<Code>) -> Self {
        Self {
            visit_id: visit_id.into(),
            code: code.into(),
        }
    }
}

impl<V: Into<VisitId>, C: Into<Code>> From<(V, C)> for Observation {
    fn from((visit_id, code): (V, C)) -> Self {
        Self::new(visit_id, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_from_tuple() {
        let obs: Observation = ("v7", "250.00").into();
        assert_eq!(obs, Observation::new("v7", "250.00"));
    }
}
