use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use haulaway_core::domain::conversation::{MessageRole, StoredMessage};
use haulaway_core::domain::job::{BookingDetails, JobSnapshot, JobStatus};
use haulaway_core::domain::quote::QuoteSnapshot;

use super::conversation::DEFAULT_HISTORY_LIMIT;
use super::{ConversationRepository, JobRepository, RepositoryError};

pub struct InMemoryConversationRepository {
    messages: RwLock<HashMap<String, Vec<StoredMessage>>>,
    history_limit: u32,
}

impl Default for InMemoryConversationRepository {
    fn default() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl InMemoryConversationRepository {
    pub fn with_history_limit(history_limit: u32) -> Self {
        Self { messages: RwLock::new(HashMap::new()), history_limit: history_limit.max(1) }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn append_message(
        &self,
        customer_phone: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        let history = messages.entry(customer_phone.to_string()).or_default();
        history.push(StoredMessage { role, content: content.to_string(), ts: Utc::now() });

        let limit = self.history_limit as usize;
        if history.len() > limit {
            let excess = history.len() - limit;
            history.drain(..excess);
        }

        Ok(())
    }

    async fn recent_messages(
        &self,
        customer_phone: &str,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.get(customer_phone).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<String, JobSnapshot>>,
}

#[async_trait::async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn record_quote(
        &self,
        customer_phone: &str,
        quote: &QuoteSnapshot,
    ) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.write().await;
        let record = jobs.entry(customer_phone.to_string()).or_insert_with(empty_record);
        record.quote = Some(quote.clone());
        record.status = JobStatus::Quoted;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn record_booking(
        &self,
        customer_phone: &str,
        booking: &BookingDetails,
    ) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.write().await;
        let record = jobs.entry(customer_phone.to_string()).or_insert_with(empty_record);
        record.slot_id = Some(booking.slot_id.clone());
        record.scheduled_at = Some(booking.scheduled_at.clone());
        record.address = booking.address.clone();
        record.access_notes = booking.access_notes.clone();
        record.status = JobStatus::Booked;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn job_snapshot(
        &self,
        customer_phone: &str,
    ) -> Result<Option<JobSnapshot>, RepositoryError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(customer_phone).cloned())
    }
}

fn empty_record() -> JobSnapshot {
    JobSnapshot {
        quote: None,
        address: None,
        access_notes: None,
        slot_id: None,
        scheduled_at: None,
        status: JobStatus::Quoted,
        updated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use haulaway_core::domain::conversation::MessageRole;
    use haulaway_core::domain::job::{BookingDetails, JobStatus};
    use haulaway_core::domain::quote::{QuoteSnapshot, Tier};
    use rust_decimal_macros::dec;

    use crate::repositories::{
        ConversationRepository, InMemoryConversationRepository, InMemoryJobRepository,
        JobRepository,
    };

    #[tokio::test]
    async fn in_memory_conversation_repo_round_trip() {
        let repo = InMemoryConversationRepository::default();
        let phone = "+15550003001";

        repo.append_message(phone, MessageRole::User, "old sofa and a desk")
            .await
            .expect("append");
        repo.append_message(phone, MessageRole::Assistant, "Any stairs involved?")
            .await
            .expect("append");

        let messages = repo.recent_messages(phone).await.expect("read messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].content, "Any stairs involved?");

        let other = repo.recent_messages("+15550003999").await.expect("read other");
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn in_memory_conversation_repo_trims_oldest() {
        let repo = InMemoryConversationRepository::with_history_limit(2);
        let phone = "+15550003002";

        for index in 1..=4 {
            repo.append_message(phone, MessageRole::User, &format!("message {index}"))
                .await
                .expect("append");
        }

        let messages = repo.recent_messages(phone).await.expect("read messages");
        let contents: Vec<&str> =
            messages.iter().map(|message| message.content.as_str()).collect();
        assert_eq!(contents, vec!["message 3", "message 4"]);
    }

    #[tokio::test]
    async fn in_memory_job_repo_merges_quote_and_booking() {
        let repo = InMemoryJobRepository::default();
        let phone = "+15550003003";

        let quote = QuoteSnapshot {
            amount_min: dec!(250.00),
            amount_max: dec!(450.00),
            tier: Tier::Large,
            est_truck_fraction: 0.58,
            currency: "USD".to_string(),
        };
        repo.record_quote(phone, &quote).await.expect("record quote");
        repo.record_booking(
            phone,
            &BookingDetails {
                slot_id: "2026-03-09_0".to_string(),
                scheduled_at: "Mon 03/09, 9:00 AM\u{2013}12:00 PM".to_string(),
                address: Some("7 Birch Ln".to_string()),
                access_notes: None,
            },
        )
        .await
        .expect("record booking");

        let snapshot = repo.job_snapshot(phone).await.expect("load snapshot").expect("job exists");
        assert_eq!(snapshot.status, JobStatus::Booked);
        assert_eq!(snapshot.quote, Some(quote));
        assert_eq!(snapshot.slot_id.as_deref(), Some("2026-03-09_0"));
        assert_eq!(snapshot.address.as_deref(), Some("7 Birch Ln"));
    }
}
