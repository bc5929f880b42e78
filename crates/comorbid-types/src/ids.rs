//! Identifier type aliases.
//!
//! Visit identifiers and codes are opaque strings. Nothing in this workspace
//! interprets their contents; they are only compared for equality.

/// A visit (encounter) identifier.
///
/// # Examples
///
/// ```
/// use comorbid_types::VisitId;
///
/// let visit: VisitId = "encounter-0001".to_string();
/// ```
pub type VisitId = String;

/// A classification code observed for a visit, or listed in a group.
///
/// # Examples
///
/// ```
/// use comorbid_types::Code;
///
/// let code: Code = "4280".to_string(); // Congestive heart failure (ICD-9)
/// ```
pub type Code = String;
