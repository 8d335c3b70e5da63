use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, StoreError};
use crate::models::{Recommendation, RecommendedAction, Screening, Severity};

/// A screening rule: a medication whose case-folded name contains `trigger`
/// is blocked when the user has an active allergy named `allergen`.
///
/// Rules are data. The shipped set mirrors the source material and stays
/// deliberately small; extending clinical coverage needs domain review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreeningRule {
    pub trigger: &'static str,
    pub allergen: &'static str,
}

pub const RULES: &[ScreeningRule] = &[
    ScreeningRule { trigger: "amox", allergen: "Penicillin" },
    ScreeningRule { trigger: "ibu", allergen: "NSAIDs" },
];

const SOURCE_LOCAL_RULE: &str = "local rule";

fn row_to_recommendation(row: &Row) -> rusqlite::Result<Recommendation> {
    let created_at: String = row.get(3)?;
    let severity: String = row.get(5)?;
    let action: String = row.get(6)?;
    Ok(Recommendation {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        user_id: row.get(2)?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        description: row.get(4)?,
        severity: Severity::parse(&severity).unwrap_or(Severity::Low),
        action: RecommendedAction::parse(&action).unwrap_or(RecommendedAction::Monitor),
        source: row.get(7)?,
    })
}

impl Database {
    /// Screen a proposed medication against the user's active allergies.
    ///
    /// Always writes exactly one Recommendation row: high/prohibit when a
    /// rule matches an active allergy, low/monitor otherwise. The function is
    /// both the safety gate and the audit log, never a silent pass-through.
    pub fn screen_recommendation(
        &self,
        conversation_id: i64,
        user_id: i64,
        medication: &str,
        description: &str,
    ) -> Result<Screening> {
        if !self.conversation_exists(conversation_id)? {
            return Err(StoreError::ConversationNotFound(conversation_id).into());
        }
        if !self.user_exists(user_id)? {
            return Err(StoreError::UserNotFound(user_id).into());
        }

        let medication = medication.trim();
        let folded = medication.to_lowercase();

        let mut reason: Option<String> = None;
        for rule in RULES {
            if folded.contains(rule.trigger) && self.has_active_allergy(user_id, rule.allergen)? {
                reason = Some(format!("{} allergy", rule.allergen));
                break;
            }
        }

        if let Some(reason) = reason {
            self.conn().execute(
                "INSERT INTO recommendations
                     (conversation_id, user_id, created_at, description,
                      severity, action, source)
                 VALUES (?, ?, ?, ?, 'high', 'prohibit', ?)",
                params![
                    conversation_id,
                    user_id,
                    Utc::now().to_rfc3339(),
                    format!("Blocked: {medication}. Reason: {reason}"),
                    SOURCE_LOCAL_RULE,
                ],
            )?;
            return Ok(Screening::Blocked { reason });
        }

        let description = if description.is_empty() {
            format!("Suggested: {medication}")
        } else {
            description.to_string()
        };
        self.conn().execute(
            "INSERT INTO recommendations
                 (conversation_id, user_id, created_at, description,
                  severity, action, source)
             VALUES (?, ?, ?, ?, 'low', 'monitor', ?)",
            params![
                conversation_id,
                user_id,
                Utc::now().to_rfc3339(),
                description,
                SOURCE_LOCAL_RULE,
            ],
        )?;
        Ok(Screening::Allowed)
    }

    fn has_active_allergy(&self, user_id: i64, allergen: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1
                   FROM user_allergies ua
                   JOIN allergies a ON a.id = ua.allergy_id
                  WHERE ua.user_id = ? AND a.name LIKE ?",
                params![user_id, allergen],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Audit trail for a conversation, oldest first.
    pub fn recommendations(&self, conversation_id: i64) -> Result<Vec<Recommendation>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, conversation_id, user_id, created_at, description,
                    severity, action, source
               FROM recommendations
              WHERE conversation_id = ?
              ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map([conversation_id], row_to_recommendation)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    fn setup_conversation() -> (Database, i64, i64) {
        let db = Database::open_memory().unwrap();
        db.bootstrap().unwrap();
        let uid = db.ensure_local_user().unwrap();
        let cid = db.start_conversation(uid, "consultation").unwrap();
        db.add_message(cid, MessageRole::User, "I have a sore throat")
            .unwrap();
        (db, uid, cid)
    }

    #[test]
    fn test_blocks_amoxicillin_for_penicillin_allergy() {
        let (db, uid, cid) = setup_conversation();
        let penicillin = db.find_allergy_by_name("Penicillin").unwrap().unwrap();
        db.set_allergy(uid, penicillin.id, true).unwrap();

        let outcome = db
            .screen_recommendation(cid, uid, "Amoxicillin 500mg", "")
            .unwrap();
        assert_eq!(
            outcome,
            Screening::Blocked {
                reason: "Penicillin allergy".to_string()
            }
        );

        let audit = db.recommendations(cid).unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].severity, Severity::High);
        assert_eq!(audit[0].action, RecommendedAction::Prohibit);
        assert_eq!(audit[0].source, "local rule");
        assert!(audit[0].description.contains("Amoxicillin 500mg"));
        assert!(audit[0].description.contains("Penicillin allergy"));
    }

    #[test]
    fn test_allows_amoxicillin_without_the_allergy() {
        let (db, uid, cid) = setup_conversation();

        let outcome = db
            .screen_recommendation(cid, uid, "Amoxicillin 500mg", "")
            .unwrap();
        assert_eq!(outcome, Screening::Allowed);

        let audit = db.recommendations(cid).unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].severity, Severity::Low);
        assert_eq!(audit[0].action, RecommendedAction::Monitor);
        assert_eq!(audit[0].description, "Suggested: Amoxicillin 500mg");
    }

    #[test]
    fn test_blocks_ibuprofen_for_nsaid_allergy() {
        let (db, uid, cid) = setup_conversation();
        let nsaids = db.find_allergy_by_name("NSAIDs").unwrap().unwrap();
        db.set_allergy(uid, nsaids.id, true).unwrap();

        let outcome = db
            .screen_recommendation(cid, uid, "IBUPROFEN 200mg", "")
            .unwrap();
        assert_eq!(
            outcome,
            Screening::Blocked {
                reason: "NSAIDs allergy".to_string()
            }
        );
    }

    #[test]
    fn test_unmatched_medication_is_monitored() {
        let (db, uid, cid) = setup_conversation();
        let penicillin = db.find_allergy_by_name("Penicillin").unwrap().unwrap();
        db.set_allergy(uid, penicillin.id, true).unwrap();

        let outcome = db
            .screen_recommendation(cid, uid, "Paracetamol", "take with food")
            .unwrap();
        assert_eq!(outcome, Screening::Allowed);

        let audit = db.recommendations(cid).unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].description, "take with food");
    }

    #[test]
    fn test_every_call_appends_one_audit_row() {
        let (db, uid, cid) = setup_conversation();
        db.screen_recommendation(cid, uid, "Amoxicillin", "").unwrap();
        db.screen_recommendation(cid, uid, "Paracetamol", "").unwrap();
        db.screen_recommendation(cid, uid, "", "").unwrap();
        assert_eq!(db.recommendations(cid).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_conversation_fails_before_writing() {
        let db = Database::open_memory().unwrap();
        db.bootstrap().unwrap();
        let uid = db.ensure_local_user().unwrap();

        let err = db
            .screen_recommendation(404, uid, "Amoxicillin", "")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::ConversationNotFound(404))
        ));

        let total: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM recommendations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(total, 0);
    }
}
