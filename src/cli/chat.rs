//! Interactive chat with the health assistant.
//!
//! Every assistant-suggested medication is screened against the user's
//! active allergies before it is allowed to stand; blocked suggestions are
//! answered with a warning message in the conversation itself.

use anyhow::Result;
use inquire::Text;

use crate::assistant::{AssistantClient, ChatTurn};
use crate::db::Database;
use crate::models::{MessageRole, Screening};

pub fn run_chat(db: &Database, assistant: &dyn AssistantClient, reason: Option<String>) -> Result<()> {
    let user_id = db.ensure_local_user()?;
    let reason = reason.unwrap_or_else(|| "consultation".to_string());

    println!("Hello, how can I help you today? (q to quit)");

    // Created lazily on the first message, so quitting immediately leaves no
    // empty conversation behind.
    let mut conversation: Option<i64> = None;

    loop {
        let line = match Text::new(">").prompt() {
            Ok(line) => line,
            // Esc / ctrl-c ends the session.
            Err(_) => break,
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text.to_lowercase().as_str(), "q" | "quit" | "exit" | "bye") {
            break;
        }

        match send_turn(db, assistant, user_id, &mut conversation, text, &reason) {
            Ok(replies) => {
                for reply in replies {
                    println!("{reply}");
                }
            }
            Err(e) => println!("error: {e}"),
        }
    }

    Ok(())
}

/// One chat turn: persist the user message, ask the assistant with the full
/// history and patient context, persist its reply, and screen any suggested
/// medication. Returns the lines to show the user.
fn send_turn(
    db: &Database,
    assistant: &dyn AssistantClient,
    user_id: i64,
    conversation: &mut Option<i64>,
    text: &str,
    reason: &str,
) -> Result<Vec<String>> {
    let conversation_id = match *conversation {
        Some(id) => id,
        None => {
            let id = db.start_conversation(user_id, reason)?;
            *conversation = Some(id);
            id
        }
    };

    db.add_message(conversation_id, MessageRole::User, text)?;

    let history: Vec<ChatTurn> = db
        .messages(conversation_id)?
        .iter()
        .map(ChatTurn::from)
        .collect();
    let context = db.patient_context(user_id)?;

    let reply = assistant.reply(&history, &context);
    db.add_message(conversation_id, MessageRole::Assistant, &reply.reply_text)?;
    let mut shown = vec![reply.reply_text];

    if let Some(medication) = reply.suggested_medication {
        let outcome = db.screen_recommendation(
            conversation_id,
            user_id,
            &medication,
            &format!("Assistant suggestion: {medication}"),
        )?;
        if let Screening::Blocked { reason } = outcome {
            let warning = format!("I cannot recommend {medication}: {reason}.");
            db.add_message(conversation_id, MessageRole::Assistant, &warning)?;
            shown.push(warning);
        }
    }

    Ok(shown)
}
