use anyhow::{anyhow, Result};

use super::AllergyCommand;
use crate::db::Database;

pub fn run_allergy(db: &Database, command: AllergyCommand) -> Result<()> {
    let user_id = db.ensure_local_user()?;

    match command {
        AllergyCommand::List => {
            for state in db.allergies_with_state(user_id)? {
                let marker = if state.active { "x" } else { " " };
                println!(
                    "[{marker}] {} ({})",
                    state.name,
                    state.kind.as_deref().unwrap_or("n/a")
                );
            }
        }
        AllergyCommand::Add { name, kind } => {
            db.create_allergy(&name, &kind)?;
            println!("Added.");
        }
        AllergyCommand::On { name } => {
            let allergy = db
                .find_allergy_by_name(&name)?
                .ok_or_else(|| anyhow!("No allergy named '{name}' in the catalog."))?;
            db.set_allergy(user_id, allergy.id, true)?;
            println!("{} is now active.", allergy.name);
        }
        AllergyCommand::Off { name } => {
            let allergy = db
                .find_allergy_by_name(&name)?
                .ok_or_else(|| anyhow!("No allergy named '{name}' in the catalog."))?;
            db.set_allergy(user_id, allergy.id, false)?;
            println!("{} is no longer active.", allergy.name);
        }
    }

    Ok(())
}
