use async_trait::async_trait;
use thiserror::Error;

use haulaway_core::domain::conversation::{MessageRole, StoredMessage};
use haulaway_core::domain::job::{BookingDetails, JobSnapshot};
use haulaway_core::domain::quote::QuoteSnapshot;

pub mod conversation;
pub mod job;
pub mod memory;

pub use conversation::{SqlConversationRepository, DEFAULT_HISTORY_LIMIT};
pub use job::SqlJobRepository;
pub use memory::{InMemoryConversationRepository, InMemoryJobRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Per-customer message history keyed by phone number. Implementations keep
/// only the most recent turns; older ones are discarded on append.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn append_message(
        &self,
        customer_phone: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), RepositoryError>;

    /// Most recent turns in chronological order, oldest first.
    async fn recent_messages(
        &self,
        customer_phone: &str,
    ) -> Result<Vec<StoredMessage>, RepositoryError>;
}

/// One job record per customer phone. Recording a quote preserves any booking
/// fields already on the record; recording a booking preserves the quote.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn record_quote(
        &self,
        customer_phone: &str,
        quote: &QuoteSnapshot,
    ) -> Result<(), RepositoryError>;

    async fn record_booking(
        &self,
        customer_phone: &str,
        booking: &BookingDetails,
    ) -> Result<(), RepositoryError>;

    async fn job_snapshot(
        &self,
        customer_phone: &str,
    ) -> Result<Option<JobSnapshot>, RepositoryError>;
}
