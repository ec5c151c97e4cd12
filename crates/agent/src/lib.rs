//! Conversation runtime for the SMS intake agent.
//!
//! The model's job here is narrow: talk to the customer and, when it has
//! gathered enough detail, emit a single-line `ACTION:` JSON payload naming
//! the items to quote or the slot to book. Everything with consequences is
//! deterministic and happens outside this crate:
//!
//! 1. **Prompting** (`prompt`) - the fixed system prompt and reply contract
//! 2. **Completion** (`llm`) - pluggable `LlmClient` with an HTTP implementation
//! 3. **Extraction** (`actions`) - split a raw reply into SMS text + action
//! 4. **Orchestration** (`runtime`) - greeting, fallback, and action handoff
//!
//! # Safety Principle
//!
//! The model never computes prices or availability. It only describes what the
//! customer asked for; pricing and booking are owned by deterministic code.

pub mod actions;
pub mod llm;
pub mod prompt;
pub mod runtime;

pub use actions::{extract_action, AgentAction};
pub use llm::{HttpLlmClient, LlmClient};
pub use prompt::SYSTEM_PROMPT;
pub use runtime::{AgentReply, AgentRuntime, FALLBACK_REPLY, GREETING};
