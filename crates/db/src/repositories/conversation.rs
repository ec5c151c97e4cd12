use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use haulaway_core::domain::conversation::{MessageRole, StoredMessage};

use super::{ConversationRepository, RepositoryError};
use crate::DbPool;

/// Turns kept per customer; older rows are deleted on append.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

pub struct SqlConversationRepository {
    pool: DbPool,
    history_limit: u32,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self::with_history_limit(pool, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(pool: DbPool, history_limit: u32) -> Self {
        Self { pool, history_limit: history_limit.max(1) }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn append_message(
        &self,
        customer_phone: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO conversation_message (customer_phone, role, content, ts)
             VALUES (?, ?, ?, ?)",
        )
        .bind(customer_phone)
        .bind(role.as_str())
        .bind(content)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "DELETE FROM conversation_message
             WHERE customer_phone = ?
               AND id NOT IN (
                   SELECT id FROM conversation_message
                   WHERE customer_phone = ?
                   ORDER BY id DESC
                   LIMIT ?
               )",
        )
        .bind(customer_phone)
        .bind(customer_phone)
        .bind(i64::from(self.history_limit))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_messages(
        &self,
        customer_phone: &str,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, content, ts
             FROM conversation_message
             WHERE customer_phone = ?
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(customer_phone)
        .bind(i64::from(self.history_limit))
        .fetch_all(&self.pool)
        .await?;

        let mut messages =
            rows.into_iter().map(message_from_row).collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}

fn message_from_row(row: SqliteRow) -> Result<StoredMessage, RepositoryError> {
    let role_raw = row.try_get::<String, _>("role")?;
    let role = MessageRole::parse(&role_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown message role `{role_raw}`")))?;

    Ok(StoredMessage {
        role,
        content: row.try_get("content")?,
        ts: parse_timestamp("ts", row.try_get("ts")?)?,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

#[cfg(test)]
mod tests {
    use haulaway_core::domain::conversation::MessageRole;

    use super::SqlConversationRepository;
    use crate::migrations;
    use crate::repositories::ConversationRepository;
    use crate::{connect_with_settings, DbPool};

    #[tokio::test]
    async fn append_and_read_round_trip() {
        let pool = setup_pool().await;
        let repo = SqlConversationRepository::new(pool.clone());
        let phone = "+15550001001";

        repo.append_message(phone, MessageRole::User, "got an old couch").await.expect("append");
        repo.append_message(phone, MessageRole::Assistant, "Got it. Any stairs?")
            .await
            .expect("append");

        let messages = repo.recent_messages(phone).await.expect("read messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "got an old couch");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "Got it. Any stairs?");

        pool.close().await;
    }

    #[tokio::test]
    async fn append_trims_to_history_limit() {
        let pool = setup_pool().await;
        let repo = SqlConversationRepository::with_history_limit(pool.clone(), 3);
        let phone = "+15550001002";

        for index in 1..=5 {
            repo.append_message(phone, MessageRole::User, &format!("message {index}"))
                .await
                .expect("append");
        }

        let messages = repo.recent_messages(phone).await.expect("read messages");
        let contents: Vec<&str> =
            messages.iter().map(|message| message.content.as_str()).collect();
        assert_eq!(contents, vec!["message 3", "message 4", "message 5"]);

        let stored: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM conversation_message WHERE customer_phone = ?",
        )
        .bind(phone)
        .fetch_one(&pool)
        .await
        .expect("count rows");
        assert_eq!(stored, 3);

        pool.close().await;
    }

    #[tokio::test]
    async fn histories_are_scoped_by_phone() {
        let pool = setup_pool().await;
        let repo = SqlConversationRepository::new(pool.clone());

        repo.append_message("+15550001003", MessageRole::User, "mattress pickup")
            .await
            .expect("append");
        repo.append_message("+15550001004", MessageRole::User, "fridge in the garage")
            .await
            .expect("append");

        let first = repo.recent_messages("+15550001003").await.expect("read first");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].content, "mattress pickup");

        let second = repo.recent_messages("+15550001004").await.expect("read second");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].content, "fridge in the garage");

        pool.close().await;
    }

    async fn setup_pool() -> DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }
}
