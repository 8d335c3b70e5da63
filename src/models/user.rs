use serde::{Deserialize, Serialize};

/// The single local user. One row exists per installation; `ensure_local_user`
/// creates it on first launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
    X,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M => "M",
            Self::F => "F",
            Self::X => "X",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "M" | "m" => Some(Self::M),
            "F" | "f" => Some(Self::F),
            "X" | "x" => Some(Self::X),
            _ => None,
        }
    }
}

/// One-to-one demographic record for a user. Absent numeric fields stay
/// `None` and are stored as NULL, never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Demographic {
    pub age: Option<i64>,
    pub sex: Option<Sex>,
    pub pregnant: bool,
    pub lactating: bool,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
}
