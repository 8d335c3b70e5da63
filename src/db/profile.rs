use anyhow::Result;
use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::models::{Demographic, Sex, User};

impl Database {
    // ==================== LOCAL USER ====================

    /// Return the id of the single local user, creating a default row on
    /// first launch. The app never holds more than one user row.
    pub fn ensure_local_user(&self) -> Result<i64> {
        let existing: Option<i64> = self
            .conn()
            .query_row("SELECT id FROM users LIMIT 1", [], |row| row.get(0))
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn().execute(
            "INSERT INTO users (given_name, family_name) VALUES (?, ?)",
            params!["Local", "User"],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, given_name, family_name FROM users WHERE id = ?",
                [user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        given_name: row.get(1)?,
                        family_name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    pub(crate) fn user_exists(&self, user_id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row("SELECT 1 FROM users WHERE id = ?", [user_id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    // ==================== DEMOGRAPHICS ====================

    pub fn demographic(&self, user_id: i64) -> Result<Option<Demographic>> {
        let row = self
            .conn()
            .query_row(
                "SELECT age, sex, pregnant, lactating, weight_kg, height_cm
                   FROM demographics
                  WHERE user_id = ?",
                [user_id],
                |row| {
                    let sex: Option<String> = row.get(1)?;
                    Ok(Demographic {
                        age: row.get(0)?,
                        sex: sex.as_deref().and_then(Sex::parse),
                        pregnant: row.get::<_, i64>(2)? == 1,
                        lactating: row.get::<_, i64>(3)? == 1,
                        weight_kg: row.get(4)?,
                        height_cm: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Full replace: insert if absent, otherwise overwrite every field
    /// atomically. Absent numeric fields are stored as NULL, not zero.
    pub fn upsert_demographic(&self, user_id: i64, demo: &Demographic) -> Result<()> {
        self.conn().execute(
            "INSERT INTO demographics
                 (user_id, age, sex, pregnant, lactating, weight_kg, height_cm)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 age       = excluded.age,
                 sex       = excluded.sex,
                 pregnant  = excluded.pregnant,
                 lactating = excluded.lactating,
                 weight_kg = excluded.weight_kg,
                 height_cm = excluded.height_cm",
            params![
                user_id,
                demo.age,
                demo.sex.map(|s| s.as_str()),
                demo.pregnant as i64,
                demo.lactating as i64,
                demo.weight_kg,
                demo.height_cm,
            ],
        )?;
        Ok(())
    }

    // ==================== ASSISTANT CONTEXT ====================

    /// One-line summary of the user's active allergies, handed to the
    /// assistant as patient context with every request.
    pub fn patient_context(&self, user_id: i64) -> Result<String> {
        let allergies = self.active_allergies(user_id)?;
        if allergies.is_empty() {
            return Ok("No recorded allergies".to_string());
        }

        let listed = allergies
            .iter()
            .map(|a| format!("{} ({})", a.name, a.kind.as_deref().unwrap_or("n/a")))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("Active allergies: {listed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_local_user_is_stable() {
        let db = Database::open_memory().unwrap();
        let first = db.ensure_local_user().unwrap();
        let second = db.ensure_local_user().unwrap();
        assert_eq!(first, second);

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_demographic_upsert_overwrites() {
        let db = Database::open_memory().unwrap();
        let uid = db.ensure_local_user().unwrap();

        let first = Demographic {
            age: Some(30),
            sex: Some(Sex::F),
            pregnant: true,
            lactating: false,
            weight_kg: Some(61.5),
            height_cm: Some(164.0),
        };
        db.upsert_demographic(uid, &first).unwrap();
        assert_eq!(db.demographic(uid).unwrap().unwrap(), first);

        // Second save is a full replace, not a merge: cleared fields go back
        // to NULL.
        let second = Demographic {
            age: Some(31),
            sex: Some(Sex::F),
            pregnant: false,
            lactating: true,
            weight_kg: None,
            height_cm: None,
        };
        db.upsert_demographic(uid, &second).unwrap();
        assert_eq!(db.demographic(uid).unwrap().unwrap(), second);
    }

    #[test]
    fn test_demographic_missing_is_none() {
        let db = Database::open_memory().unwrap();
        let uid = db.ensure_local_user().unwrap();
        assert!(db.demographic(uid).unwrap().is_none());
    }

    #[test]
    fn test_patient_context_without_allergies() {
        let db = Database::open_memory().unwrap();
        let uid = db.ensure_local_user().unwrap();
        assert_eq!(db.patient_context(uid).unwrap(), "No recorded allergies");
    }

    #[test]
    fn test_patient_context_lists_active_allergies() {
        let db = Database::open_memory().unwrap();
        db.bootstrap().unwrap();
        let uid = db.ensure_local_user().unwrap();

        let penicillin = db.find_allergy_by_name("Penicillin").unwrap().unwrap();
        db.set_allergy(uid, penicillin.id, true).unwrap();

        let context = db.patient_context(uid).unwrap();
        assert!(context.starts_with("Active allergies:"));
        assert!(context.contains("Penicillin (drug)"));
    }
}
