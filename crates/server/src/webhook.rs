//! Inbound SMS webhook: the one orchestration path in the service.
//!
//! `POST /api/sms/inbound` runs parse → verify → throttle → persist → agent
//! → action dispatch → reply. The handler answers the carrier with an empty
//! 200 for every downstream hiccup after signature verification; carriers
//! retry on non-2xx and a retry storm helps nobody.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Form, Router};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use uuid::Uuid;

use haulaway_agent::{AgentAction, AgentReply, AgentRuntime};
use haulaway_core::domain::conversation::{ChatMessage, MessageRole};
use haulaway_core::domain::job::{BookingDetails, JobSnapshot};
use haulaway_core::pricing::{items_from_value, modifiers_from_value, QuoteEngine};
use haulaway_core::schedule::BookingCalendar;
use haulaway_core::signature::signature_matches;
use haulaway_core::throttle::{QuietHours, ThrottleDecision};
use haulaway_core::InterfaceError;
use haulaway_db::{ConversationRepository, JobRepository};
use haulaway_sms::{parse_inbound, ProviderNotifier, SmsSender};

/// Header carrying the gateway's hex HMAC over the webhook URL and form.
pub const SIGNATURE_HEADER: &str = "x-haulaway-signature";

/// Customer-facing text for a failed model call. Plain apology, no detail.
pub const ERROR_REPLY: &str = "Sorry, something went wrong. Please try again in a moment.";

const EMPTY_BODY_PLACEHOLDER: &str = "(no text)";

#[derive(Clone)]
pub struct WebhookState {
    pub conversations: Arc<dyn ConversationRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub agent: Arc<AgentRuntime>,
    pub engine: Arc<dyn QuoteEngine>,
    pub calendar: BookingCalendar,
    pub quiet_hours: QuietHours,
    pub sender: Arc<dyn SmsSender>,
    pub notifier: Arc<ProviderNotifier>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<SecretString>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/api/sms/inbound", post(inbound_sms)).with_state(state)
}

pub async fn inbound_sms(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Form(form): Form<BTreeMap<String, String>>,
) -> (StatusCode, String) {
    let correlation_id = Uuid::new_v4().to_string();
    let (from_phone, body) = parse_inbound(&form);

    if from_phone.is_empty() {
        warn!(
            event_name = "ingress.sms.missing_from",
            correlation_id = %correlation_id,
            "inbound form has no From field"
        );
        return reject(InterfaceError::BadRequest {
            message: "Missing From".to_string(),
            correlation_id,
        });
    }

    // Verification is armed only when a public webhook URL is configured and
    // the gateway actually signed this post. A configured URL with a missing
    // secret fails closed.
    if let (Some(url), Some(provided)) =
        (state.webhook_url.as_deref(), headers.get(SIGNATURE_HEADER))
    {
        let provided = provided.to_str().unwrap_or_default();
        let verified = state
            .webhook_secret
            .as_ref()
            .is_some_and(|secret| signature_matches(secret.expose_secret(), url, &form, provided));
        if !verified {
            warn!(
                event_name = "ingress.sms.bad_signature",
                correlation_id = %correlation_id,
                "inbound signature did not verify"
            );
            return reject(InterfaceError::Forbidden {
                message: "Invalid signature".to_string(),
                correlation_id,
            });
        }
    }

    info!(
        event_name = "ingress.sms.received",
        correlation_id = %correlation_id,
        from = %from_phone,
        "inbound sms accepted"
    );

    if let ThrottleDecision::Throttled { message } = state.quiet_hours.check(Utc::now()) {
        info!(
            event_name = "ingress.sms.throttled",
            correlation_id = %correlation_id,
            "quiet hours; skipping the model for this turn"
        );
        store_user_message(&state, &from_phone, &body, &correlation_id).await;
        send_reply(&state, &from_phone, message, &correlation_id).await;
        return ok_empty();
    }

    store_user_message(&state, &from_phone, &body, &correlation_id).await;

    let history = load_history(&state, &from_phone, &body, &correlation_id).await;
    let reply = match state.agent.respond(&history).await {
        Ok(reply) => reply,
        Err(error) => {
            warn!(
                event_name = "agent.reply_failed",
                correlation_id = %correlation_id,
                error = %error,
                "model call failed; sending fallback reply"
            );
            AgentReply { sms_text: ERROR_REPLY.to_string(), action: None }
        }
    };

    if let Some(action) = &reply.action {
        dispatch_action(&state, &from_phone, action, &correlation_id).await;
    }

    if let Err(error) = state
        .conversations
        .append_message(&from_phone, MessageRole::Assistant, &reply.sms_text)
        .await
    {
        warn!(
            event_name = "conversation.store_failed",
            correlation_id = %correlation_id,
            error = %error,
            "could not persist assistant message"
        );
    }
    send_reply(&state, &from_phone, &reply.sms_text, &correlation_id).await;

    ok_empty()
}

fn ok_empty() -> (StatusCode, String) {
    (StatusCode::OK, String::new())
}

/// Maps an interface error onto the wire reply the gateway sees. The body is
/// the error message itself; gateways surface it in delivery logs.
fn reject(error: InterfaceError) -> (StatusCode, String) {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = match error {
        InterfaceError::BadRequest { message, .. }
        | InterfaceError::Forbidden { message, .. }
        | InterfaceError::ServiceUnavailable { message, .. }
        | InterfaceError::Internal { message, .. } => message,
    };
    (status, body)
}

async fn store_user_message(
    state: &WebhookState,
    from_phone: &str,
    body: &str,
    correlation_id: &str,
) {
    let content = if body.is_empty() { EMPTY_BODY_PLACEHOLDER } else { body };
    if let Err(error) =
        state.conversations.append_message(from_phone, MessageRole::User, content).await
    {
        warn!(
            event_name = "conversation.store_failed",
            correlation_id = %correlation_id,
            error = %error,
            "could not persist user message"
        );
    }
}

/// History comes from the store so the model sees exactly what was kept.
/// When the read fails the current turn alone is offered instead, which
/// degrades context but keeps the conversation moving.
async fn load_history(
    state: &WebhookState,
    from_phone: &str,
    body: &str,
    correlation_id: &str,
) -> Vec<ChatMessage> {
    match state.conversations.recent_messages(from_phone).await {
        Ok(stored) => stored.iter().map(ChatMessage::from).collect(),
        Err(error) => {
            warn!(
                event_name = "conversation.read_failed",
                correlation_id = %correlation_id,
                error = %error,
                "could not load history; replying from the current turn only"
            );
            let content = if body.is_empty() { EMPTY_BODY_PLACEHOLDER } else { body };
            vec![ChatMessage::user(content)]
        }
    }
}

async fn dispatch_action(
    state: &WebhookState,
    customer_phone: &str,
    action: &AgentAction,
    correlation_id: &str,
) {
    match action {
        AgentAction::GenerateQuote { items, modifiers } => {
            let items = match items_from_value(items) {
                Ok(items) => items,
                Err(error) => {
                    warn!(
                        event_name = "quote.input_rejected",
                        correlation_id = %correlation_id,
                        error = %error,
                        "quote items failed validation; action skipped"
                    );
                    return;
                }
            };
            let modifiers = match modifiers_from_value(modifiers.as_ref()) {
                Ok(modifiers) => modifiers,
                Err(error) => {
                    warn!(
                        event_name = "quote.input_rejected",
                        correlation_id = %correlation_id,
                        error = %error,
                        "quote modifiers failed validation; action skipped"
                    );
                    return;
                }
            };

            let snapshot = state.engine.quote(&items, &modifiers).snapshot();
            if let Err(error) = state.jobs.record_quote(customer_phone, &snapshot).await {
                warn!(
                    event_name = "job.quote_store_failed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "could not persist quote"
                );
                return;
            }
            info!(
                event_name = "job.quote_recorded",
                correlation_id = %correlation_id,
                tier = %snapshot.tier,
                "quote recorded"
            );

            if let Some(snapshot) = recorded_snapshot(state, customer_phone, correlation_id).await {
                state.notifier.notify_quote(customer_phone, &snapshot).await;
            }
        }
        AgentAction::BookSlot { slot_id, address, access_notes } => {
            let slot = match state.calendar.resolve_slot(slot_id) {
                Ok(slot) => slot,
                Err(error) => {
                    warn!(
                        event_name = "booking.unknown_slot",
                        correlation_id = %correlation_id,
                        error = %error,
                        "booking slot id did not resolve; action skipped"
                    );
                    return;
                }
            };

            let details = BookingDetails {
                slot_id: slot.id.clone(),
                scheduled_at: state.calendar.format_slot(&slot),
                address: address.clone(),
                access_notes: access_notes.clone(),
            };
            if let Err(error) = state.jobs.record_booking(customer_phone, &details).await {
                warn!(
                    event_name = "job.booking_store_failed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "could not persist booking"
                );
                return;
            }
            info!(
                event_name = "job.booking_recorded",
                correlation_id = %correlation_id,
                slot_id = %slot.id,
                "booking recorded"
            );

            if let Some(snapshot) = recorded_snapshot(state, customer_phone, correlation_id).await {
                state.notifier.notify_booking(customer_phone, &snapshot).await;
            }
        }
    }
}

/// Alerts are built from the persisted record, not the in-flight values, so
/// the provider sees whatever a reload would see.
async fn recorded_snapshot(
    state: &WebhookState,
    customer_phone: &str,
    correlation_id: &str,
) -> Option<JobSnapshot> {
    match state.jobs.job_snapshot(customer_phone).await {
        Ok(Some(snapshot)) => Some(snapshot),
        Ok(None) => {
            warn!(
                event_name = "job.snapshot_missing",
                correlation_id = %correlation_id,
                "job record vanished between write and alert"
            );
            None
        }
        Err(error) => {
            warn!(
                event_name = "job.snapshot_read_failed",
                correlation_id = %correlation_id,
                error = %error,
                "could not reload job record for alert"
            );
            None
        }
    }
}

async fn send_reply(state: &WebhookState, to: &str, body: &str, correlation_id: &str) {
    match state.sender.send(to, body).await {
        Ok(sid) => {
            info!(
                event_name = "sms.reply_sent",
                correlation_id = %correlation_id,
                sid = %sid.0,
                "reply handed to the gateway"
            );
        }
        Err(error) => {
            warn!(
                event_name = "sms.send_failed",
                correlation_id = %correlation_id,
                error = %error,
                "reply could not be sent"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{Request, StatusCode};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    use haulaway_agent::LlmClient;
    use haulaway_core::domain::job::JobStatus;
    use haulaway_core::domain::quote::Tier;
    use haulaway_core::pricing::DeterministicQuoteEngine;
    use haulaway_core::signature::webhook_signature;
    use haulaway_core::throttle::QUIET_HOURS_MESSAGE;
    use haulaway_db::{InMemoryConversationRepository, InMemoryJobRepository};
    use haulaway_sms::RecordingSmsSender;

    use super::*;

    const CUSTOMER: &str = "+15551112222";
    const PROVIDER: &str = "+15559990000";
    const WEBHOOK_URL: &str = "https://hooks.example.com/api/sms/inbound";

    struct ScriptedLlm {
        replies: tokio::sync::Mutex<VecDeque<anyhow::Result<String>>>,
        calls: tokio::sync::Mutex<usize>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<anyhow::Result<String>>) -> Self {
            Self {
                replies: tokio::sync::Mutex::new(replies.into_iter().collect()),
                calls: tokio::sync::Mutex::new(0),
            }
        }

        async fn calls(&self) -> usize {
            *self.calls.lock().await
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(
            &self,
            _system: &str,
            _messages: &[ChatMessage],
        ) -> anyhow::Result<String> {
            *self.calls.lock().await += 1;
            self.replies.lock().await.pop_front().unwrap_or(Ok(String::new()))
        }
    }

    struct Harness {
        state: WebhookState,
        conversations: Arc<InMemoryConversationRepository>,
        jobs: Arc<InMemoryJobRepository>,
        sender: Arc<RecordingSmsSender>,
        llm: Arc<ScriptedLlm>,
    }

    fn harness(replies: Vec<anyhow::Result<String>>) -> Harness {
        let conversations = Arc::new(InMemoryConversationRepository::default());
        let jobs = Arc::new(InMemoryJobRepository::default());
        let sender = Arc::new(RecordingSmsSender::new());
        let llm = Arc::new(ScriptedLlm::new(replies));

        let state = WebhookState {
            conversations: conversations.clone(),
            jobs: jobs.clone(),
            agent: Arc::new(AgentRuntime::new(llm.clone())),
            engine: Arc::new(DeterministicQuoteEngine::default()),
            calendar: BookingCalendar::default(),
            quiet_hours: QuietHours { start_hour: 0, end_hour: 0, utc_offset_minutes: 0 },
            sender: sender.clone(),
            notifier: Arc::new(ProviderNotifier::new(sender.clone(), Some(PROVIDER.to_string()))),
            webhook_url: None,
            webhook_secret: None,
        };

        Harness { state, conversations, jobs, sender, llm }
    }

    async fn post_inbound(
        state: WebhookState,
        body: &str,
        signature: Option<&str>,
    ) -> (StatusCode, String) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/sms/inbound")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        let request = request.body(Body::from(body.to_string())).unwrap();

        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn form(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
    }

    #[tokio::test]
    async fn missing_from_returns_bad_request() {
        let harness = harness(vec![]);

        let (status, body) = post_inbound(harness.state, "Body=Hello", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing From");
        assert!(harness.sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn tampered_signature_returns_forbidden() {
        let mut harness = harness(vec![]);
        harness.state.webhook_url = Some(WEBHOOK_URL.to_string());
        harness.state.webhook_secret = Some("topsecret".into());

        let (status, body) =
            post_inbound(harness.state, "From=%2B15551112222&Body=Hi", Some("deadbeef")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, "Invalid signature");
        assert_eq!(harness.llm.calls().await, 0);
    }

    #[tokio::test]
    async fn valid_signature_is_accepted() {
        let mut harness = harness(vec![Ok("What do you need removed?".to_string())]);
        harness.state.webhook_url = Some(WEBHOOK_URL.to_string());
        harness.state.webhook_secret = Some("topsecret".into());

        let signature =
            webhook_signature("topsecret", WEBHOOK_URL, &form(&[("From", CUSTOMER), ("Body", "Hi")]));
        let (status, _) =
            post_inbound(harness.state, "From=%2B15551112222&Body=Hi", Some(&signature)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(harness.llm.calls().await, 1);
    }

    #[tokio::test]
    async fn unsigned_posts_pass_when_no_webhook_url_is_configured() {
        let harness = harness(vec![Ok("What do you need removed?".to_string())]);

        let (status, body) = post_inbound(harness.state, "From=%2B15551112222&Body=Hi", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "");
    }

    #[tokio::test]
    async fn reply_round_trip_persists_both_turns_and_texts_the_customer() {
        let harness = harness(vec![Ok("What do you need removed?".to_string())]);

        let (status, _) = post_inbound(harness.state, "From=%2B15551112222&Body=Hi", None).await;
        assert_eq!(status, StatusCode::OK);

        let stored = harness.conversations.recent_messages(CUSTOMER).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, MessageRole::User);
        assert_eq!(stored[0].content, "Hi");
        assert_eq!(stored[1].role, MessageRole::Assistant);
        assert_eq!(stored[1].content, "What do you need removed?");

        let sent = harness.sender.sent().await;
        assert_eq!(sent, vec![(CUSTOMER.to_string(), "What do you need removed?".to_string())]);
    }

    #[tokio::test]
    async fn empty_body_is_stored_with_a_placeholder() {
        let harness = harness(vec![Ok("Could you say more?".to_string())]);

        post_inbound(harness.state, "From=%2B15551112222&Body=", None).await;

        let stored = harness.conversations.recent_messages(CUSTOMER).await.unwrap();
        assert_eq!(stored[0].content, "(no text)");
    }

    #[tokio::test]
    async fn quiet_hours_short_circuit_the_model() {
        let mut harness = harness(vec![Ok("should never be used".to_string())]);
        harness.state.quiet_hours = QuietHours { start_hour: 0, end_hour: 24, utc_offset_minutes: 0 };

        let (status, _) = post_inbound(harness.state, "From=%2B15551112222&Body=Hi", None).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(harness.llm.calls().await, 0);
        let stored = harness.conversations.recent_messages(CUSTOMER).await.unwrap();
        assert_eq!(stored.len(), 1, "canned reply must not be stored as an assistant turn");
        assert_eq!(stored[0].role, MessageRole::User);
        let sent = harness.sender.sent().await;
        assert_eq!(sent, vec![(CUSTOMER.to_string(), QUIET_HOURS_MESSAGE.to_string())]);
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_the_error_reply() {
        let harness = harness(vec![Err(anyhow::anyhow!("model unavailable"))]);

        let (status, _) = post_inbound(harness.state, "From=%2B15551112222&Body=Hi", None).await;
        assert_eq!(status, StatusCode::OK);

        let stored = harness.conversations.recent_messages(CUSTOMER).await.unwrap();
        assert_eq!(stored[1].content, ERROR_REPLY);
        let sent = harness.sender.sent().await;
        assert_eq!(sent, vec![(CUSTOMER.to_string(), ERROR_REPLY.to_string())]);
    }

    #[tokio::test]
    async fn quote_action_records_a_snapshot_and_alerts_the_provider() {
        let reply = "Here's what we'll do!\n\
                     ACTION: {\"type\": \"GENERATE_QUOTE\", \"items\": [{\"name\": \"Sofa\", \
                     \"category\": \"Medium\", \"quantity\": 1, \"est_cubic_yards\": 3.0}], \
                     \"modifiers\": {}}";
        let harness = harness(vec![Ok(reply.to_string())]);

        let (status, _) =
            post_inbound(harness.state, "From=%2B15551112222&Body=1%20sofa", None).await;
        assert_eq!(status, StatusCode::OK);

        let snapshot = harness.jobs.job_snapshot(CUSTOMER).await.unwrap().expect("job recorded");
        let quote = snapshot.quote.expect("quote stored");
        assert_eq!(quote.amount_min, dec!(100.00));
        assert_eq!(quote.amount_max, dec!(250.00));
        assert_eq!(quote.tier, Tier::Medium);
        assert_eq!(snapshot.status, JobStatus::Quoted);

        let sent = harness.sender.sent().await;
        assert_eq!(sent.len(), 2, "provider alert then customer reply");
        assert_eq!(sent[0].0, PROVIDER);
        assert_eq!(
            sent[0].1,
            "[Junk] QUOTED — Customer +15551112222 | $100.00–$250.00 \
             (Medium, ~25% truck). Reply to this number to view thread."
        );
        assert_eq!(sent[1], (CUSTOMER.to_string(), "Here's what we'll do!".to_string()));
    }

    #[tokio::test]
    async fn invalid_quote_payload_skips_the_action_but_still_replies() {
        let reply = "On it!\nACTION: {\"type\": \"GENERATE_QUOTE\", \"items\": \"two couches\"}";
        let harness = harness(vec![Ok(reply.to_string())]);

        let (status, _) = post_inbound(harness.state, "From=%2B15551112222&Body=Hi", None).await;
        assert_eq!(status, StatusCode::OK);

        assert!(harness.jobs.job_snapshot(CUSTOMER).await.unwrap().is_none());
        let sent = harness.sender.sent().await;
        assert_eq!(sent, vec![(CUSTOMER.to_string(), "On it!".to_string())]);
    }

    #[tokio::test]
    async fn book_slot_action_records_the_booking_and_alerts_the_provider() {
        let reply = "You're booked!\n\
                     ACTION: {\"type\": \"BOOK_SLOT\", \"slot_id\": \"2026-03-05_1\", \
                     \"address\": \"12 Oak St\"}";
        let harness = harness(vec![Ok(reply.to_string())]);

        let (status, _) = post_inbound(harness.state, "From=%2B15551112222&Body=Book%20it", None).await;
        assert_eq!(status, StatusCode::OK);

        let snapshot = harness.jobs.job_snapshot(CUSTOMER).await.unwrap().expect("job recorded");
        assert_eq!(snapshot.status, JobStatus::Booked);
        assert_eq!(snapshot.slot_id.as_deref(), Some("2026-03-05_1"));
        assert_eq!(snapshot.scheduled_at.as_deref(), Some("Thu 03/05, 1:00 PM–4:00 PM"));
        assert_eq!(snapshot.address.as_deref(), Some("12 Oak St"));

        let sent = harness.sender.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, PROVIDER);
        assert_eq!(
            sent[0].1,
            "[Junk] BOOKED — +15551112222 | 12 Oak St | Thu 03/05, 1:00 PM–4:00 PM | \
             $—–$—. Reply to this number to view thread."
        );
        assert_eq!(sent[1], (CUSTOMER.to_string(), "You're booked!".to_string()));
    }

    #[tokio::test]
    async fn unknown_slot_id_skips_the_booking_but_still_replies() {
        let reply = "You're booked!\nACTION: {\"type\": \"BOOK_SLOT\", \"slot_id\": \"tomorrowish\"}";
        let harness = harness(vec![Ok(reply.to_string())]);

        post_inbound(harness.state, "From=%2B15551112222&Body=Book%20it", None).await;

        assert!(harness.jobs.job_snapshot(CUSTOMER).await.unwrap().is_none());
        let sent = harness.sender.sent().await;
        assert_eq!(sent, vec![(CUSTOMER.to_string(), "You're booked!".to_string())]);
    }
}
