//! Remote assistant over an OpenAI-compatible chat-completions API.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AssistantClient, AssistantReply, ChatTurn};
use crate::models::MessageRole;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Per-turn history content cap sent to the API.
const MAX_TURN_CHARS: usize = 800;
/// Display cap for the assistant's reply text.
const MAX_REPLY_CHARS: usize = 1200;

pub struct RemoteAssistant {
    client: Option<Client>,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// The structured payload the system prompt asks the model to emit.
#[derive(Deserialize)]
struct StructuredReply {
    reply_text: Option<String>,
    suggested_medication: Option<String>,
}

fn cap(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Interpret the model's content: preferably the structured JSON payload,
/// otherwise the raw text as the reply with no suggestion.
fn parse_reply(raw: &str) -> AssistantReply {
    if let Ok(out) = serde_json::from_str::<StructuredReply>(raw) {
        let reply_text = out.reply_text.unwrap_or_default();
        if !reply_text.is_empty() {
            return AssistantReply {
                reply_text: cap(&reply_text, MAX_REPLY_CHARS).to_string(),
                suggested_medication: out.suggested_medication.filter(|m| !m.is_empty()),
            };
        }
    }
    AssistantReply {
        reply_text: cap(raw, MAX_REPLY_CHARS).to_string(),
        suggested_medication: None,
    }
}

impl RemoteAssistant {
    /// Configuration comes from the environment: `HEALTHCMD_API_KEY`,
    /// optionally `HEALTHCMD_API_URL` and `HEALTHCMD_MODEL`. With no key the
    /// client stays unconfigured and every reply is the fallback.
    pub fn from_env() -> Self {
        let api_key = std::env::var("HEALTHCMD_API_KEY").unwrap_or_default();
        let api_url =
            std::env::var("HEALTHCMD_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let model = std::env::var("HEALTHCMD_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_url, api_key, model)
    }

    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .ok();

        Self {
            client,
            api_url,
            api_key,
            model,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && self.client.is_some()
    }

    fn system_prompt(patient_context: &str) -> String {
        format!(
            "You are a careful health assistant for a companion app. \
             Give short, practical guidance and always advise seeing a \
             clinician for anything serious. Respond with a JSON object: \
             {{\"reply_text\": string, \"suggested_medication\": string or null}}. \
             Patient context: {}.",
            if patient_context.is_empty() {
                "none"
            } else {
                patient_context
            }
        )
    }

    fn request(&self, history: &[ChatTurn], patient_context: &str) -> Option<AssistantReply> {
        let client = self.client.as_ref()?;

        let system = Self::system_prompt(patient_context);
        let mut messages = vec![WireMessage {
            role: "system",
            content: &system,
        }];
        messages.extend(history.iter().map(|turn| WireMessage {
            role: match turn.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            },
            content: cap(&turn.content, MAX_TURN_CHARS),
        }));

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: 0.3,
        };

        let response = client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let completion: CompletionResponse = response.json().ok()?;
        let content = completion.choices.into_iter().next()?.message.content?;
        Some(parse_reply(&content))
    }
}

impl AssistantClient for RemoteAssistant {
    fn reply(&self, history: &[ChatTurn], patient_context: &str) -> AssistantReply {
        if !self.is_configured() {
            return AssistantReply::fallback();
        }
        self.request(history, patient_context)
            .unwrap_or_else(AssistantReply::fallback)
    }

    fn name(&self) -> &str {
        "Remote API"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_reply() {
        let parsed = parse_reply(
            r#"{"reply_text": "Rest and fluids.", "suggested_medication": "Paracetamol"}"#,
        );
        assert_eq!(parsed.reply_text, "Rest and fluids.");
        assert_eq!(parsed.suggested_medication.as_deref(), Some("Paracetamol"));
    }

    #[test]
    fn test_parse_structured_reply_without_medication() {
        let parsed =
            parse_reply(r#"{"reply_text": "See a doctor.", "suggested_medication": null}"#);
        assert_eq!(parsed.reply_text, "See a doctor.");
        assert_eq!(parsed.suggested_medication, None);
    }

    #[test]
    fn test_parse_bare_text_reply() {
        let parsed = parse_reply("Just drink water.");
        assert_eq!(parsed.reply_text, "Just drink water.");
        assert_eq!(parsed.suggested_medication, None);
    }

    #[test]
    fn test_parse_empty_structured_reply_falls_back_to_raw() {
        let raw = r#"{"suggested_medication": "X"}"#;
        let parsed = parse_reply(raw);
        // No reply text in the payload: the raw content is shown, and the
        // suggestion is dropped rather than surfaced without context.
        assert_eq!(parsed.reply_text, raw);
        assert_eq!(parsed.suggested_medication, None);
    }

    #[test]
    fn test_reply_caps_length() {
        let long = "a".repeat(5000);
        let parsed = parse_reply(&long);
        assert_eq!(parsed.reply_text.len(), MAX_REPLY_CHARS);
    }

    #[test]
    fn test_cap_respects_char_boundaries() {
        assert_eq!(cap("ñandú", 3), "ñan");
        assert_eq!(cap("ok", 10), "ok");
    }

    #[test]
    fn test_unconfigured_client_returns_fallback() {
        let assistant = RemoteAssistant::new(
            DEFAULT_API_URL.to_string(),
            String::new(),
            DEFAULT_MODEL.to_string(),
        );
        let reply = assistant.reply(&[], "No recorded allergies");
        assert_eq!(reply, AssistantReply::fallback());
    }
}
