use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use haulaway_core::domain::conversation::ChatMessage;

use crate::actions::{extract_action, AgentAction};
use crate::llm::LlmClient;
use crate::prompt::SYSTEM_PROMPT;

pub const GREETING: &str = "Hi! What can we help you remove today?";
pub const FALLBACK_REPLY: &str = "Sorry, I didn't get that. What do you need removed?";

#[derive(Clone, Debug, PartialEq)]
pub struct AgentReply {
    pub sms_text: String,
    pub action: Option<AgentAction>,
}

pub struct AgentRuntime {
    client: Arc<dyn LlmClient>,
}

impl AgentRuntime {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// First contact gets the canned greeting without a model call. Afterwards
    /// the model reply is split into SMS text and an optional action; a reply
    /// that is blank once the action line is removed becomes the fallback text.
    pub async fn respond(&self, history: &[ChatMessage]) -> Result<AgentReply> {
        if history.is_empty() {
            return Ok(AgentReply { sms_text: GREETING.to_string(), action: None });
        }

        let raw = self.client.complete(SYSTEM_PROMPT, history).await?;
        let (text, payload) = extract_action(&raw);

        let action = payload.as_ref().and_then(AgentAction::from_value);
        if payload.is_some() && action.is_none() {
            warn!("model emitted an unrecognized action payload; ignoring it");
        }

        let sms_text = if text.is_empty() { FALLBACK_REPLY.to_string() } else { text };
        Ok(AgentReply { sms_text, action })
    }
}
