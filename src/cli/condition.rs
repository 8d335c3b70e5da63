use anyhow::{anyhow, Result};

use super::ConditionCommand;
use crate::db::Database;

pub fn run_condition(db: &Database, command: ConditionCommand) -> Result<()> {
    let user_id = db.ensure_local_user()?;

    match command {
        ConditionCommand::List => {
            for state in db.conditions_with_state(user_id)? {
                let marker = if state.active { "x" } else { " " };
                let mut line = format!("[{marker}] {}", state.name);
                if let Some(status) = &state.status {
                    line.push_str(&format!(" — {status}"));
                }
                if let Some(date) = state.diagnosed_on {
                    line.push_str(&format!(" since {date}"));
                }
                println!("{line}");
            }
        }
        ConditionCommand::Add { name } => {
            db.create_condition(&name)?;
            println!("Added.");
        }
        ConditionCommand::On { name, status } => {
            let id = db
                .find_condition_id_by_name(&name)?
                .ok_or_else(|| anyhow!("No condition named '{name}' in the catalog."))?;
            db.set_condition(user_id, id, true, status.as_deref())?;
            println!("Recorded.");
        }
        ConditionCommand::Off { name } => {
            let id = db
                .find_condition_id_by_name(&name)?
                .ok_or_else(|| anyhow!("No condition named '{name}' in the catalog."))?;
            db.set_condition(user_id, id, false, None)?;
            println!("Removed.");
        }
    }

    Ok(())
}
