use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::appointment::{Appointment, ConfirmationStatus};
use crate::services::appointment_store::AppointmentStore;
use crate::utils::{phone, time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    MissingSender,
    UnrecognizedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplyOutcome {
    Ignored { reason: IgnoreReason },
    NoMatch,
    Recorded {
        appointment_id: Uuid,
        status: ConfirmationStatus,
    },
}

/// Maps a free-text reply onto a confirmation decision.
pub fn classify_reply(text: &str) -> Option<ConfirmationStatus> {
    match text.trim().to_lowercase().as_str() {
        "yes" | "y" => Some(ConfirmationStatus::Confirmed),
        "no" | "n" => Some(ConfirmationStatus::Declined),
        _ => None,
    }
}

/// Earliest appointment strictly after `now` booked under `sender`.
/// Equal times fall back to the lowest id.
pub fn select_nearest_future<'a>(
    appointments: &'a [Appointment],
    sender: &str,
    now: DateTime<Utc>,
) -> Option<&'a Appointment> {
    appointments
        .iter()
        .filter(|a| a.contact_phone() == Some(sender))
        .filter_map(|a| a.appointment_at.filter(|at| *at > now).map(|at| (at, a)))
        .min_by_key(|(at, a)| (*at, a.id))
        .map(|(_, a)| a)
}

#[derive(Clone)]
pub struct ReplyService {
    store: Arc<dyn AppointmentStore>,
}

impl ReplyService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, from: &str, body: &str) -> Result<ReplyOutcome> {
        self.resolve_at(from, body, time::now()).await
    }

    pub async fn resolve_at(
        &self,
        from: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<ReplyOutcome> {
        let sender = from.trim();
        if sender.is_empty() {
            return Ok(ReplyOutcome::Ignored {
                reason: IgnoreReason::MissingSender,
            });
        }
        let Some(status) = classify_reply(body) else {
            return Ok(ReplyOutcome::Ignored {
                reason: IgnoreReason::UnrecognizedText,
            });
        };

        let appointments = self.store.read_all().await?;
        let Some(winner) = select_nearest_future(&appointments, sender, now) else {
            info!(from = %phone::mask(sender), "no upcoming appointment for reply");
            return Ok(ReplyOutcome::NoMatch);
        };

        self.store.set_confirmation_status(winner.id, status).await?;
        info!(
            appointment_id = %winner.id,
            from = %phone::mask(sender),
            status = %status,
            "confirmation recorded"
        );

        Ok(ReplyOutcome::Recorded {
            appointment_id: winner.id,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    const P: &str = "+13035551234";

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<Appointment>>,
        writes: Mutex<Vec<(Uuid, ConfirmationStatus)>>,
        fail_reads: bool,
    }

    #[async_trait]
    impl AppointmentStore for MemoryStore {
        async fn read_all(&self) -> Result<Vec<Appointment>> {
            if self.fail_reads {
                return Err(Error::Internal("store unavailable".into()));
            }
            Ok(self.records.lock().unwrap().clone())
        }

        async fn mark_reminder_sent(&self, _id: Uuid) -> Result<bool> {
            unreachable!("resolver never marks reminders")
        }

        async fn set_confirmation_status(&self, id: Uuid, status: ConfirmationStatus) -> Result<()> {
            self.writes.lock().unwrap().push((id, status));
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.iter_mut().find(|a| a.id == id) {
                record.confirmation_status = Some(status);
            }
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 18, 0, 0).unwrap()
    }

    fn booking(id: u128, phone: Option<&str>, at: Option<DateTime<Utc>>) -> Appointment {
        Appointment {
            id: Uuid::from_u128(id),
            owner_name: "Alex".into(),
            dog_name: "Pepper".into(),
            owner_phone: phone.map(str::to_string),
            appointment_at: at,
            reminder_sent: false,
            confirmation_status: None,
        }
    }

    fn store_with(records: Vec<Appointment>) -> Arc<MemoryStore> {
        Arc::new(MemoryStore {
            records: Mutex::new(records),
            ..Default::default()
        })
    }

    #[test]
    fn classifies_fixed_vocabulary() {
        assert_eq!(classify_reply("YES"), Some(ConfirmationStatus::Confirmed));
        assert_eq!(classify_reply("  y \n"), Some(ConfirmationStatus::Confirmed));
        assert_eq!(classify_reply("No"), Some(ConfirmationStatus::Declined));
        assert_eq!(classify_reply("n"), Some(ConfirmationStatus::Declined));
        assert_eq!(classify_reply("maybe"), None);
        assert_eq!(classify_reply("yes please"), None);
        assert_eq!(classify_reply(""), None);
    }

    #[test]
    fn nearest_future_skips_past_and_other_phones() {
        let records = vec![
            booking(1, Some(P), Some(now() - Duration::hours(1))),
            booking(2, Some(P), Some(now() + Duration::hours(10))),
            booking(3, Some(P), Some(now() + Duration::hours(2))),
            booking(4, Some("+19999999999"), Some(now() + Duration::minutes(5))),
            booking(5, Some(P), None),
        ];

        let winner = select_nearest_future(&records, P, now()).unwrap();
        assert_eq!(winner.id, Uuid::from_u128(3));
    }

    #[test]
    fn appointment_exactly_now_is_not_future() {
        let records = vec![booking(1, Some(P), Some(now()))];
        assert!(select_nearest_future(&records, P, now()).is_none());
    }

    #[test]
    fn equal_times_resolve_to_lowest_id() {
        let at = Some(now() + Duration::hours(4));
        let records = vec![booking(9, Some(P), at), booking(2, Some(P), at), booking(5, Some(P), at)];

        let winner = select_nearest_future(&records, P, now()).unwrap();
        assert_eq!(winner.id, Uuid::from_u128(2));
    }

    #[tokio::test]
    async fn yes_confirms_only_the_earliest_upcoming_appointment() {
        let a = booking(1, Some(P), Some(now() + Duration::hours(1)));
        let b = booking(2, Some(P), Some(now() + Duration::hours(10)));
        let store = store_with(vec![a.clone(), b.clone()]);
        let svc = ReplyService::new(store.clone());

        let outcome = svc.resolve_at(P, "YES", now()).await.unwrap();

        assert_eq!(
            outcome,
            ReplyOutcome::Recorded {
                appointment_id: a.id,
                status: ConfirmationStatus::Confirmed
            }
        );
        let records = store.records.lock().unwrap();
        assert_eq!(records[0].confirmation_status, Some(ConfirmationStatus::Confirmed));
        assert_eq!(records[1].confirmation_status, None);
    }

    #[tokio::test]
    async fn sender_is_trimmed_before_matching() {
        let a = booking(1, Some(P), Some(now() + Duration::hours(1)));
        let store = store_with(vec![a.clone()]);

        let outcome = ReplyService::new(store.clone())
            .resolve_at(&format!(" {P} "), "n", now())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReplyOutcome::Recorded {
                appointment_id: a.id,
                status: ConfirmationStatus::Declined
            }
        );
    }

    #[tokio::test]
    async fn unrecognized_text_and_missing_sender_write_nothing() {
        let store = store_with(vec![booking(1, Some(P), Some(now() + Duration::hours(1)))]);
        let svc = ReplyService::new(store.clone());

        assert_eq!(
            svc.resolve_at(P, "maybe", now()).await.unwrap(),
            ReplyOutcome::Ignored {
                reason: IgnoreReason::UnrecognizedText
            }
        );
        assert_eq!(
            svc.resolve_at(P, "", now()).await.unwrap(),
            ReplyOutcome::Ignored {
                reason: IgnoreReason::UnrecognizedText
            }
        );
        assert_eq!(
            svc.resolve_at("  ", "yes", now()).await.unwrap(),
            ReplyOutcome::Ignored {
                reason: IgnoreReason::MissingSender
            }
        );
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_past_appointments_means_no_match() {
        let store = store_with(vec![booking(1, Some(P), Some(now() - Duration::days(1)))]);

        let outcome = ReplyService::new(store.clone())
            .resolve_at(P, "yes", now())
            .await
            .unwrap();

        assert_eq!(outcome, ReplyOutcome::NoMatch);
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_propagates_to_caller() {
        let store = Arc::new(MemoryStore {
            fail_reads: true,
            ..Default::default()
        });

        let result = ReplyService::new(store).resolve_at(P, "yes", now()).await;
        assert!(result.is_err());
    }
}
