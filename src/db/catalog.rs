use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{ActiveCondition, Allergy, AllergyState, ConditionState};

/// Severity recorded the first time an allergy is activated, when the user
/// has not supplied one yet.
const DEFAULT_SEVERITY: &str = "moderate";

const BASELINE_ALLERGIES: &[(&str, &str)] = &[
    ("Penicillin", "drug"),
    ("NSAIDs", "drug"),
    ("Sulfa drugs", "drug"),
    ("Shellfish", "food"),
    ("Dust", "environmental"),
];

const BASELINE_CONDITIONS: &[&str] = &[
    "Diabetes",
    "Hypertension",
    "Asthma",
    "Tachycardia",
    "Gastric ulcer",
];

fn row_to_allergy(row: &Row) -> rusqlite::Result<Allergy> {
    Ok(Allergy {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
    })
}

fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
}

impl Database {
    // ==================== SEEDING ====================

    /// Insert the baseline allergy catalog, skipping names that already
    /// exist under trim + case-fold normalization. Never overwrites.
    pub fn seed_allergies(&self) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        for (name, kind) in BASELINE_ALLERGIES {
            tx.execute(
                "INSERT INTO allergies (name, kind)
                 SELECT ?1, ?2
                  WHERE NOT EXISTS (
                        SELECT 1 FROM allergies
                         WHERE lower(trim(name)) = lower(trim(?1)))",
                params![name, kind],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn seed_conditions(&self) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        for name in BASELINE_CONDITIONS {
            tx.execute(
                "INSERT INTO conditions (name)
                 SELECT ?1
                  WHERE NOT EXISTS (
                        SELECT 1 FROM conditions
                         WHERE lower(trim(name)) = lower(trim(?1)))",
                params![name],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// User "add" action. Blank names are a no-op; duplicates are rejected
    /// at the source by the unique index once `dedupe_allergies` has run.
    pub fn create_allergy(&self, name: &str, kind: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        self.conn().execute(
            "INSERT OR IGNORE INTO allergies (name, kind) VALUES (?, ?)",
            params![name, kind.trim()],
        )?;
        Ok(())
    }

    pub fn create_condition(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        self.conn().execute(
            "INSERT OR IGNORE INTO conditions (name) VALUES (?)",
            params![name],
        )?;
        Ok(())
    }

    // ==================== DEDUPLICATION ====================

    /// One-time cleanup: keep only the lowest-rowid row per normalized name,
    /// then install the unique index that rejects future duplicates at the
    /// source. Idempotent, and a no-op on duplicate-free data. The delete and
    /// the index install commit together.
    pub fn dedupe_allergies(&self) -> Result<()> {
        self.conn().execute_batch(
            "BEGIN TRANSACTION;
             DELETE FROM allergies
              WHERE rowid NOT IN (
                    SELECT MIN(rowid)
                      FROM (SELECT rowid, lower(trim(name)) AS k FROM allergies)
                     GROUP BY k);
             CREATE UNIQUE INDEX IF NOT EXISTS ux_allergy_name
                 ON allergies (lower(trim(name)));
             COMMIT;",
        )?;
        Ok(())
    }

    pub fn dedupe_conditions(&self) -> Result<()> {
        self.conn().execute_batch(
            "BEGIN TRANSACTION;
             DELETE FROM conditions
              WHERE rowid NOT IN (
                    SELECT MIN(rowid)
                      FROM (SELECT rowid, lower(trim(name)) AS k FROM conditions)
                     GROUP BY k);
             CREATE UNIQUE INDEX IF NOT EXISTS ux_condition_name
                 ON conditions (lower(trim(name)));
             COMMIT;",
        )?;
        Ok(())
    }

    // ==================== LOOKUPS ====================

    pub fn find_allergy_by_name(&self, name: &str) -> Result<Option<Allergy>> {
        let allergy = self
            .conn()
            .query_row(
                "SELECT id, name, kind FROM allergies
                  WHERE lower(trim(name)) = lower(trim(?))",
                params![name],
                row_to_allergy,
            )
            .optional()?;
        Ok(allergy)
    }

    pub fn find_condition_id_by_name(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .conn()
            .query_row(
                "SELECT id FROM conditions WHERE lower(trim(name)) = lower(trim(?))",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    // ==================== PER-USER STATE ====================

    /// Every catalog allergy with an `active` flag for this user. The catalog
    /// is complete even when the user has activated none of it.
    pub fn allergies_with_state(&self, user_id: i64) -> Result<Vec<AllergyState>> {
        let mut stmt = self.conn().prepare(
            "SELECT a.id, a.name, a.kind,
                    CASE WHEN ua.allergy_id IS NOT NULL THEN 1 ELSE 0 END,
                    ua.severity, ua.reaction
               FROM allergies a
          LEFT JOIN user_allergies ua
                 ON ua.allergy_id = a.id AND ua.user_id = ?
              ORDER BY a.name ASC",
        )?;

        let rows = stmt
            .query_map([user_id], |row| {
                Ok(AllergyState {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    kind: row.get(2)?,
                    active: row.get::<_, i64>(3)? == 1,
                    severity: row.get(4)?,
                    reaction: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn conditions_with_state(&self, user_id: i64) -> Result<Vec<ConditionState>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.id, c.name,
                    CASE WHEN uc.condition_id IS NOT NULL THEN 1 ELSE 0 END,
                    uc.status, uc.diagnosed_on
               FROM conditions c
          LEFT JOIN (SELECT condition_id, status, diagnosed_on
                       FROM user_conditions
                      WHERE user_id = ?) uc
                 ON uc.condition_id = c.id
              ORDER BY c.name ASC",
        )?;

        let rows = stmt
            .query_map([user_id], |row| {
                let diagnosed: Option<String> = row.get(4)?;
                Ok(ConditionState {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    active: row.get::<_, i64>(2)? == 1,
                    status: row.get(3)?,
                    diagnosed_on: parse_date(diagnosed),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Activate or deactivate an allergy for the user. Re-activation keeps
    /// the severity and reaction recorded the first time; deactivation
    /// removes the association row, leaving the catalog untouched.
    pub fn set_allergy(&self, user_id: i64, allergy_id: i64, active: bool) -> Result<()> {
        if active {
            self.conn().execute(
                "INSERT OR REPLACE INTO user_allergies
                     (user_id, allergy_id, severity, reaction)
                 VALUES (?1, ?2,
                         COALESCE((SELECT severity FROM user_allergies
                                    WHERE user_id = ?1 AND allergy_id = ?2), ?3),
                         COALESCE((SELECT reaction FROM user_allergies
                                    WHERE user_id = ?1 AND allergy_id = ?2), ''))",
                params![user_id, allergy_id, DEFAULT_SEVERITY],
            )?;
        } else {
            self.conn().execute(
                "DELETE FROM user_allergies WHERE user_id = ? AND allergy_id = ?",
                params![user_id, allergy_id],
            )?;
        }
        Ok(())
    }

    /// Same insert-preserve-or-delete pattern as allergies. The diagnosis
    /// date is set on first activation and preserved after; `status` applies
    /// on first activation only ("Active" when not given).
    pub fn set_condition(
        &self,
        user_id: i64,
        condition_id: i64,
        active: bool,
        status: Option<&str>,
    ) -> Result<()> {
        if active {
            let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
            self.conn().execute(
                "INSERT OR REPLACE INTO user_conditions
                     (user_id, condition_id, diagnosed_on, status)
                 VALUES (?1, ?2,
                         COALESCE((SELECT diagnosed_on FROM user_conditions
                                    WHERE user_id = ?1 AND condition_id = ?2), ?3),
                         COALESCE((SELECT status FROM user_conditions
                                    WHERE user_id = ?1 AND condition_id = ?2), ?4))",
                params![user_id, condition_id, today, status.unwrap_or("Active")],
            )?;
        } else {
            self.conn().execute(
                "DELETE FROM user_conditions WHERE user_id = ? AND condition_id = ?",
                params![user_id, condition_id],
            )?;
        }
        Ok(())
    }

    // ==================== ACTIVE VIEWS ====================

    pub fn active_allergies(&self, user_id: i64) -> Result<Vec<Allergy>> {
        let mut stmt = self.conn().prepare(
            "SELECT a.id, a.name, a.kind
               FROM allergies a
               JOIN user_allergies ua ON ua.allergy_id = a.id
              WHERE ua.user_id = ?
              ORDER BY a.name ASC",
        )?;

        let rows = stmt
            .query_map([user_id], row_to_allergy)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn active_conditions(&self, user_id: i64) -> Result<Vec<ActiveCondition>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.id, c.name, uc.status, uc.diagnosed_on
               FROM conditions c
               JOIN user_conditions uc ON uc.condition_id = c.id
              WHERE uc.user_id = ?
                AND (uc.status IS NULL OR uc.status = 'Active')
              ORDER BY c.name ASC",
        )?;

        let rows = stmt
            .query_map([user_id], |row| {
                let diagnosed: Option<String> = row.get(3)?;
                Ok(ActiveCondition {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    status: row.get(2)?,
                    diagnosed_on: parse_date(diagnosed),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_names(db: &Database, table: &str) -> Vec<String> {
        db.conn()
            .prepare(&format!("SELECT name FROM {table} ORDER BY name"))
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn test_seeding_is_idempotent() {
        let db = Database::open_memory().unwrap();

        db.seed_allergies().unwrap();
        let once = catalog_names(&db, "allergies");
        db.seed_allergies().unwrap();
        assert_eq!(catalog_names(&db, "allergies"), once);
        assert_eq!(once.len(), 5);

        db.seed_conditions().unwrap();
        let once = catalog_names(&db, "conditions");
        db.seed_conditions().unwrap();
        assert_eq!(catalog_names(&db, "conditions"), once);
        assert_eq!(once.len(), 5);
    }

    #[test]
    fn test_seeding_skips_case_variants() {
        let db = Database::open_memory().unwrap();
        db.create_allergy("  penicillin ", "drug").unwrap();
        db.seed_allergies().unwrap();

        let matches: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM allergies WHERE lower(trim(name)) = 'penicillin'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(matches, 1);
    }

    #[test]
    fn test_dedupe_keeps_lowest_id_per_normalized_name() {
        let db = Database::open_memory().unwrap();
        // Raw inserts simulate legacy data created before the unique index.
        db.conn()
            .execute_batch(
                "INSERT INTO conditions (name) VALUES ('Asthma');
                 INSERT INTO conditions (name) VALUES ('asthma');
                 INSERT INTO conditions (name) VALUES ('  ASTHMA  ');
                 INSERT INTO conditions (name) VALUES ('Diabetes');",
            )
            .unwrap();

        db.dedupe_conditions().unwrap();
        assert_eq!(catalog_names(&db, "conditions"), vec!["Asthma", "Diabetes"]);

        // Safe to run again on already-clean data.
        db.dedupe_conditions().unwrap();
        assert_eq!(catalog_names(&db, "conditions"), vec!["Asthma", "Diabetes"]);

        // The installed index rejects new duplicates at the source.
        db.create_condition("ASTHMA").unwrap();
        assert_eq!(catalog_names(&db, "conditions"), vec!["Asthma", "Diabetes"]);
    }

    #[test]
    fn test_create_blank_is_noop() {
        let db = Database::open_memory().unwrap();
        db.create_condition("   ").unwrap();
        db.create_allergy("", "drug").unwrap();
        assert!(catalog_names(&db, "conditions").is_empty());
        assert!(catalog_names(&db, "allergies").is_empty());
    }

    #[test]
    fn test_allergy_state_covers_full_catalog() {
        let db = Database::open_memory().unwrap();
        db.bootstrap().unwrap();
        let uid = db.ensure_local_user().unwrap();

        let states = db.allergies_with_state(uid).unwrap();
        assert_eq!(states.len(), 5);
        assert!(states.iter().all(|s| !s.active));

        let penicillin = db.find_allergy_by_name("Penicillin").unwrap().unwrap();
        db.set_allergy(uid, penicillin.id, true).unwrap();

        let states = db.allergies_with_state(uid).unwrap();
        assert_eq!(states.len(), 5);
        assert_eq!(states.iter().filter(|s| s.active).count(), 1);
    }

    #[test]
    fn test_allergy_toggle_round_trip() {
        let db = Database::open_memory().unwrap();
        db.bootstrap().unwrap();
        let uid = db.ensure_local_user().unwrap();
        let allergy = db.find_allergy_by_name("NSAIDs").unwrap().unwrap();

        let state_of = |db: &Database| {
            db.allergies_with_state(uid)
                .unwrap()
                .into_iter()
                .find(|s| s.id == allergy.id)
                .unwrap()
        };

        db.set_allergy(uid, allergy.id, true).unwrap();
        let first = state_of(&db);
        assert_eq!(first.severity.as_deref(), Some("moderate"));
        assert_eq!(first.reaction.as_deref(), Some(""));

        db.set_allergy(uid, allergy.id, false).unwrap();
        db.set_allergy(uid, allergy.id, true).unwrap();

        let after = state_of(&db);
        assert_eq!(after.severity, first.severity);
        assert_eq!(after.reaction, first.reaction);
    }

    #[test]
    fn test_reactivation_does_not_reset_recorded_details() {
        let db = Database::open_memory().unwrap();
        db.bootstrap().unwrap();
        let uid = db.ensure_local_user().unwrap();
        let allergy = db.find_allergy_by_name("NSAIDs").unwrap().unwrap();

        db.set_allergy(uid, allergy.id, true).unwrap();
        db.conn()
            .execute(
                "UPDATE user_allergies SET severity = 'severe', reaction = 'hives'
                  WHERE user_id = ? AND allergy_id = ?",
                params![uid, allergy.id],
            )
            .unwrap();

        // Toggling on again while the row exists keeps what was recorded.
        db.set_allergy(uid, allergy.id, true).unwrap();
        let state = db
            .allergies_with_state(uid)
            .unwrap()
            .into_iter()
            .find(|s| s.id == allergy.id)
            .unwrap();
        assert_eq!(state.severity.as_deref(), Some("severe"));
        assert_eq!(state.reaction.as_deref(), Some("hives"));
    }

    #[test]
    fn test_condition_status_defaults_and_is_preserved() {
        let db = Database::open_memory().unwrap();
        db.bootstrap().unwrap();
        let uid = db.ensure_local_user().unwrap();
        let cid = db.find_condition_id_by_name("Diabetes").unwrap().unwrap();

        db.set_condition(uid, cid, true, None).unwrap();
        let state = db
            .conditions_with_state(uid)
            .unwrap()
            .into_iter()
            .find(|s| s.id == cid)
            .unwrap();
        assert!(state.active);
        assert_eq!(state.status.as_deref(), Some("Active"));
        let first_diagnosis = state.diagnosed_on;
        assert!(first_diagnosis.is_some());

        // Re-activation with an explicit status does not clobber the
        // recorded one, nor the diagnosis date.
        db.set_condition(uid, cid, true, Some("In remission")).unwrap();
        let state = db
            .conditions_with_state(uid)
            .unwrap()
            .into_iter()
            .find(|s| s.id == cid)
            .unwrap();
        assert_eq!(state.status.as_deref(), Some("Active"));
        assert_eq!(state.diagnosed_on, first_diagnosis);
    }

    #[test]
    fn test_active_conditions_filters_historical() {
        let db = Database::open_memory().unwrap();
        db.bootstrap().unwrap();
        let uid = db.ensure_local_user().unwrap();

        let diabetes = db.find_condition_id_by_name("Diabetes").unwrap().unwrap();
        let asthma = db.find_condition_id_by_name("Asthma").unwrap().unwrap();
        db.set_condition(uid, diabetes, true, None).unwrap();
        db.set_condition(uid, asthma, true, Some("Resolved")).unwrap();

        let active = db.active_conditions(uid).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Diabetes");
    }

    #[test]
    fn test_deactivation_removes_association_only() {
        let db = Database::open_memory().unwrap();
        db.bootstrap().unwrap();
        let uid = db.ensure_local_user().unwrap();
        let allergy = db.find_allergy_by_name("Dust").unwrap().unwrap();

        db.set_allergy(uid, allergy.id, true).unwrap();
        db.set_allergy(uid, allergy.id, false).unwrap();

        assert!(db.active_allergies(uid).unwrap().is_empty());
        // Catalog row survives deactivation.
        assert!(db.find_allergy_by_name("Dust").unwrap().is_some());
    }
}
