use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use haulaway_core::domain::job::{BookingDetails, JobSnapshot, JobStatus};
use haulaway_core::domain::quote::QuoteSnapshot;

use super::{JobRepository, RepositoryError};
use crate::DbPool;

pub struct SqlJobRepository {
    pool: DbPool,
}

impl SqlJobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl JobRepository for SqlJobRepository {
    async fn record_quote(
        &self,
        customer_phone: &str,
        quote: &QuoteSnapshot,
    ) -> Result<(), RepositoryError> {
        let quote_json = serde_json::to_string(quote).map_err(|error| {
            RepositoryError::Decode(format!("failed to encode quote snapshot: {error}"))
        })?;

        sqlx::query(
            "INSERT INTO job_record (customer_phone, quote_json, status, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(customer_phone) DO UPDATE SET
                quote_json = excluded.quote_json,
                status = excluded.status,
                updated_at = excluded.updated_at",
        )
        .bind(customer_phone)
        .bind(quote_json)
        .bind(JobStatus::Quoted.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_booking(
        &self,
        customer_phone: &str,
        booking: &BookingDetails,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO job_record (
                customer_phone,
                slot_id,
                scheduled_at,
                address,
                access_notes,
                status,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(customer_phone) DO UPDATE SET
                slot_id = excluded.slot_id,
                scheduled_at = excluded.scheduled_at,
                address = excluded.address,
                access_notes = excluded.access_notes,
                status = excluded.status,
                updated_at = excluded.updated_at",
        )
        .bind(customer_phone)
        .bind(&booking.slot_id)
        .bind(&booking.scheduled_at)
        .bind(booking.address.as_deref())
        .bind(booking.access_notes.as_deref())
        .bind(JobStatus::Booked.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn job_snapshot(
        &self,
        customer_phone: &str,
    ) -> Result<Option<JobSnapshot>, RepositoryError> {
        let row = sqlx::query(
            "SELECT quote_json, address, access_notes, slot_id, scheduled_at, status, updated_at
             FROM job_record
             WHERE customer_phone = ?",
        )
        .bind(customer_phone)
        .fetch_optional(&self.pool)
        .await?;

        row.map(snapshot_from_row).transpose()
    }
}

fn snapshot_from_row(row: SqliteRow) -> Result<JobSnapshot, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = JobStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown job status `{status_raw}`")))?;

    let quote = row
        .try_get::<Option<String>, _>("quote_json")?
        .map(|payload| {
            serde_json::from_str::<QuoteSnapshot>(&payload).map_err(|error| {
                RepositoryError::Decode(format!("failed to decode quote snapshot: {error}"))
            })
        })
        .transpose()?;

    Ok(JobSnapshot {
        quote,
        address: row.try_get("address")?,
        access_notes: row.try_get("access_notes")?,
        slot_id: row.try_get("slot_id")?,
        scheduled_at: row.try_get("scheduled_at")?,
        status,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
