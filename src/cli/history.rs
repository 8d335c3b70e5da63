use anyhow::Result;
use inquire::Confirm;

use crate::db::Database;
use crate::models::MessageRole;

pub fn run_history(db: &Database, show: Option<i64>, delete: Option<i64>) -> Result<()> {
    let user_id = db.ensure_local_user()?;

    if let Some(id) = delete {
        return delete_with_confirmation(db, id);
    }

    if let Some(id) = show {
        return show_conversation(db, id);
    }

    let conversations = db.conversations_for_user(user_id)?;
    if conversations.is_empty() {
        println!("No conversations yet. Start one with: healthcmd chat");
        return Ok(());
    }

    for c in conversations {
        println!(
            "#{} — {} • {} • {}",
            c.id,
            c.reason,
            c.started_at.format("%Y-%m-%d %H:%M"),
            c.status
        );
    }
    Ok(())
}

fn show_conversation(db: &Database, conversation_id: i64) -> Result<()> {
    for message in db.messages(conversation_id)? {
        let who = match message.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "assistant",
        };
        println!("{who}: {}", message.content);
    }

    let audit = db.recommendations(conversation_id)?;
    if !audit.is_empty() {
        println!("\nScreening audit");
        for r in audit {
            println!(
                "  [{}/{}] {}",
                r.severity.as_str(),
                r.action.as_str(),
                r.description
            );
        }
    }
    Ok(())
}

fn delete_with_confirmation(db: &Database, conversation_id: i64) -> Result<()> {
    let confirmed = Confirm::new(&format!(
        "Delete conversation #{conversation_id}? Its messages and recommendations go with it."
    ))
    .with_default(false)
    .prompt()
    .unwrap_or(false);

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    db.delete_conversation(conversation_id)?;
    println!("Deleted.");
    Ok(())
}
