//! # comorbid-types
//!
//! Type definitions for comorbidity classification input.
//!
//! This crate provides the plain data types exchanged with the
//! `comorbid-classifier` crate: visit/code observations and named
//! comorbidity group definitions. Codes and visit identifiers are opaque
//! strings.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!   Disable this feature for zero-dependency usage.
//!
//! ## Usage
//!
//! ```rust
//! use comorbid_types::{GroupDefinition, Observation};
//!
//! let observations = vec![
//!     Observation::new("v1", "4280"),
//!     Observation::new("v1", "25000"),
//!     Observation::new("v2", "5715"),
//! ];
//!
//! let groups = vec![
//!     GroupDefinition::new("CHF", ["4280", "4281"]),
//!     GroupDefinition::new("Liver", ["5715", "5716"]),
//! ];
//!
//! assert_eq!(observations.len(), 3);
//! assert_eq!(groups[1].name, "Liver");
//! ```
//!
//! ## Without Serde
//!
//! ```toml
//! [dependencies]
//! comorbid-types = { version = "0.1", default-features = false }
//! ```

#![warn(missing_docs)]

mod group;
mod ids;
mod observation;

// Re-export all public types at crate root
pub use group::GroupDefinition;
pub use ids::{Code, VisitId};
pub use observation::Observation;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        let _visit: VisitId = "v1".to_string();
        let _code: Code = "4280".to_string();
        let _obs = Observation::new("v1", "4280");
        let _group = GroupDefinition::new("CHF", ["4280"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let group = GroupDefinition::new("CHF", ["39891", "4280"]);

        let json = serde_json::to_string(&group).unwrap();
        let parsed: GroupDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(group, parsed);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_observation_json_shape() {
        let obs = Observation::new("v1", "4280");
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["visit_id"], "v1");
        assert_eq!(json["code"], "4280");
    }
}
