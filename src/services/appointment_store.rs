use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::appointment::{Appointment, ConfirmationStatus};

/// Record store holding the appointment collection.
///
/// Reads return a full snapshot; writes touch a single field of a single
/// record and are not ordered relative to each other.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn read_all(&self) -> Result<Vec<Appointment>>;

    /// Sets `reminder_sent` only if it is still false. Returns `false` when
    /// another run already flipped it.
    async fn mark_reminder_sent(&self, id: Uuid) -> Result<bool>;

    async fn set_confirmation_status(&self, id: Uuid, status: ConfirmationStatus) -> Result<()>;
}

#[derive(Clone)]
pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_appointment_row(row: &PgRow) -> Result<Appointment> {
    let status: Option<String> = row.try_get("confirmation_status")?;
    let confirmation_status = match status {
        Some(raw) => match raw.parse::<ConfirmationStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable confirmation status");
                None
            }
        },
        None => None,
    };

    Ok(Appointment {
        id: row.try_get("id")?,
        owner_name: row.try_get("owner_name")?,
        dog_name: row.try_get("dog_name")?,
        owner_phone: row.try_get("owner_phone")?,
        appointment_at: row.try_get("appointment_at")?,
        reminder_sent: row.try_get("reminder_sent")?,
        confirmation_status,
    })
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn read_all(&self) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_name, dog_name, owner_phone, appointment_at,
                   reminder_sent, confirmation_status
            FROM appointments
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_appointment_row).collect()
    }

    async fn mark_reminder_sent(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET reminder_sent = TRUE, updated_at = NOW()
            WHERE id = $1 AND reminder_sent = FALSE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_confirmation_status(&self, id: Uuid, status: ConfirmationStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET confirmation_status = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("appointment {} not found", id)));
        }
        Ok(())
    }
}
