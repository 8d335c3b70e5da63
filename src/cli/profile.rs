use anyhow::Result;
use inquire::{Confirm, Select, Text};

use crate::db::Database;
use crate::models::{Demographic, Sex};

/// Print the full health profile: demographics, allergies, conditions.
pub fn run_profile(db: &Database) -> Result<()> {
    let user_id = db.ensure_local_user()?;

    if let Some(user) = db.get_user(user_id)? {
        let name = [user.given_name, user.family_name]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        println!("Profile — {name}\n");
    }

    match db.demographic(user_id)? {
        Some(demo) => {
            let fmt_num = |v: Option<f64>, unit: &str| match v {
                Some(v) => format!("{v} {unit}"),
                None => "-".to_string(),
            };
            println!("Demographics");
            println!(
                "  age: {}  sex: {}  weight: {}  height: {}",
                demo.age.map_or("-".to_string(), |a| a.to_string()),
                demo.sex.map_or("-", |s| s.as_str()),
                fmt_num(demo.weight_kg, "kg"),
                fmt_num(demo.height_cm, "cm"),
            );
            if demo.pregnant {
                println!("  pregnant");
            }
            if demo.lactating {
                println!("  lactating");
            }
        }
        None => println!("Demographics: not recorded (healthcmd profile --edit)"),
    }

    println!("\nAllergies");
    for state in db.allergies_with_state(user_id)? {
        let marker = if state.active { "x" } else { " " };
        let mut line = format!(
            "  [{marker}] {} ({})",
            state.name,
            state.kind.as_deref().unwrap_or("n/a")
        );
        if state.active {
            if let Some(severity) = &state.severity {
                line.push_str(&format!(" — {severity}"));
            }
        }
        println!("{line}");
    }

    println!("\nConditions");
    for state in db.conditions_with_state(user_id)? {
        let marker = if state.active { "x" } else { " " };
        let mut line = format!("  [{marker}] {}", state.name);
        if state.active {
            if let Some(status) = &state.status {
                line.push_str(&format!(" — {status}"));
            }
            if let Some(date) = state.diagnosed_on {
                line.push_str(&format!(" since {date}"));
            }
        }
        println!("{line}");
    }

    Ok(())
}

/// Interactive demographic form. Blank answers leave a field unset (stored
/// as NULL); every save is a full replace.
pub fn run_profile_edit(db: &Database) -> Result<()> {
    let user_id = db.ensure_local_user()?;
    let current = db.demographic(user_id)?.unwrap_or_default();

    let age = prompt_number::<i64>("age", current.age.map(|a| a.to_string()))?;

    let sex_options = vec!["-", "M", "F", "X"];
    let picked = Select::new("sex:", sex_options).prompt()?;
    let sex = Sex::parse(picked);

    let pregnant = Confirm::new("pregnant?")
        .with_default(current.pregnant)
        .prompt()?;
    let lactating = Confirm::new("lactating?")
        .with_default(current.lactating)
        .prompt()?;

    let weight_kg = prompt_number::<f64>("weight (kg)", current.weight_kg.map(|w| w.to_string()))?;
    let height_cm = prompt_number::<f64>("height (cm)", current.height_cm.map(|h| h.to_string()))?;

    let demo = Demographic {
        age,
        sex,
        pregnant,
        lactating,
        weight_kg,
        height_cm,
    };
    db.upsert_demographic(user_id, &demo)?;
    println!("Saved.");
    Ok(())
}

fn prompt_number<T: std::str::FromStr>(label: &str, initial: Option<String>) -> Result<Option<T>> {
    let label_prompt = format!("{label}:");
    let mut prompt = Text::new(&label_prompt);
    if let Some(initial) = &initial {
        prompt = prompt.with_initial_value(initial);
    }
    let answer = prompt.prompt()?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    match answer.parse::<T>() {
        Ok(v) => Ok(Some(v)),
        Err(_) => {
            println!("Not a number, leaving {label} unset.");
            Ok(None)
        }
    }
}
