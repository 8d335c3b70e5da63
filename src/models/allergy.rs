use serde::{Deserialize, Serialize};

/// Catalog allergy, shared across users. Names are unique after
/// trim + case-fold normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allergy {
    pub id: i64,
    pub name: String,
    /// Free-text classification: "drug", "food", "environmental", ...
    pub kind: Option<String>,
}

/// Catalog allergy joined against the user's association row. The catalog is
/// complete even when the user has activated nothing (left-join semantics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergyState {
    pub id: i64,
    pub name: String,
    pub kind: Option<String>,
    pub active: bool,
    pub severity: Option<String>,
    pub reaction: Option<String>,
}
