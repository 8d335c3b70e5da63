use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Prohibit,
    Monitor,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prohibit => "prohibit",
            Self::Monitor => "monitor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prohibit" => Some(Self::Prohibit),
            "monitor" => Some(Self::Monitor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Append-only audit record of a screening decision. One row is written per
/// screened medication, blocking or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: i64,
    pub conversation_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub severity: Severity,
    pub action: RecommendedAction,
    pub source: String,
}

/// Outcome of screening a proposed medication against active allergies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    /// The medication conflicts with an active allergy; `reason` is the
    /// human-readable explanation ("Penicillin allergy").
    Blocked { reason: String },
    /// No rule matched; the suggestion stands, logged for monitoring.
    Allowed,
}

impl Screening {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}
