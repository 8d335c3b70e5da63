mod allergy;
mod center;
mod condition;
mod conversation;
mod recommendation;
mod user;

pub use allergy::{Allergy, AllergyState};
pub use center::{ClinicLocation, HealthUnit, NearbyCenter};
pub use condition::{ActiveCondition, Condition, ConditionState};
pub use conversation::{Conversation, Message, MessageRole};
pub use recommendation::{Recommendation, RecommendedAction, Screening, Severity};
pub use user::{Demographic, Sex, User};
