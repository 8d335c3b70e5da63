use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Catalog medical condition. Names are unique after trim + case-fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i64,
    pub name: String,
}

/// Catalog condition joined against the user's association row.
/// `status` distinguishes active from historical ("Active" by default on
/// first activation, preserved afterwards).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionState {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub status: Option<String>,
    pub diagnosed_on: Option<NaiveDate>,
}

/// A condition currently active for the user (status NULL or "Active").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCondition {
    pub id: i64,
    pub name: String,
    pub status: Option<String>,
    pub diagnosed_on: Option<NaiveDate>,
}
