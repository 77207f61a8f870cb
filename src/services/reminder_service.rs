use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{DEFAULT_LOOKAHEAD_HOURS, DEFAULT_TIME_ZONE};
use crate::error::Result;
use crate::models::appointment::Appointment;
use crate::services::appointment_store::AppointmentStore;
use crate::services::sms_gateway::SmsGateway;
use crate::utils::{phone, time};

pub const CALL_TO_ACTION: &str = "Reply YES to confirm or NO to cancel.";

#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub lookahead: Duration,
    pub time_zone: Tz,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            lookahead: Duration::hours(DEFAULT_LOOKAHEAD_HOURS),
            time_zone: DEFAULT_TIME_ZONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Dispatch,
    Mark,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderFailure {
    pub appointment_id: Uuid,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReminderRunReport {
    pub scanned: usize,
    pub selected: Vec<Uuid>,
    pub sent: Vec<Uuid>,
    /// Sent, but the flag had already been set by an overlapping run.
    pub already_marked: Vec<Uuid>,
    pub failures: Vec<ReminderFailure>,
}

impl ReminderRunReport {
    pub fn log(&self) {
        if self.failures.is_empty() {
            info!(
                scanned = self.scanned,
                selected = self.selected.len(),
                sent = self.sent.len(),
                "reminder run finished"
            );
        } else {
            warn!(
                scanned = self.scanned,
                selected = self.selected.len(),
                sent = self.sent.len(),
                failed = self.failures.len(),
                "reminder run finished with failures"
            );
        }
    }
}

enum DispatchOutcome {
    Sent,
    AlreadyMarked,
    Failed(FailureKind, String),
}

/// Whether an appointment is eligible for a reminder at `now`.
/// Window bounds are inclusive on both ends; a window end past the
/// representable range leaves the window open-ended.
pub fn is_due(appointment: &Appointment, now: DateTime<Utc>, lookahead: Duration) -> bool {
    if appointment.reminder_sent || appointment.contact_phone().is_none() {
        return false;
    }
    match appointment.appointment_at {
        Some(at) => {
            at >= now
                && now
                    .checked_add_signed(lookahead)
                    .map_or(true, |window_end| at <= window_end)
        }
        None => false,
    }
}

pub fn select_due(
    appointments: &[Appointment],
    now: DateTime<Utc>,
    lookahead: Duration,
) -> Vec<&Appointment> {
    appointments
        .iter()
        .filter(|a| is_due(a, now, lookahead))
        .collect()
}

pub fn render_reminder(appointment: &Appointment, at: DateTime<Utc>, tz: Tz) -> String {
    format!(
        "Hi {}, reminder for {}'s appointment on {}. {}",
        appointment.owner_name,
        appointment.dog_name,
        time::to_local_display(at, tz),
        CALL_TO_ACTION
    )
}

#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn AppointmentStore>,
    gateway: Arc<dyn SmsGateway>,
    settings: ReminderSettings,
    run_guard: Arc<Mutex<()>>,
}

impl ReminderService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        gateway: Arc<dyn SmsGateway>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            store,
            gateway,
            settings,
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    /// Runs a scan at the current instant. Returns `None` without doing
    /// anything if another run in this process has not finished yet.
    pub async fn run_once(&self) -> Result<Option<ReminderRunReport>> {
        let Ok(_guard) = self.run_guard.try_lock() else {
            return Ok(None);
        };
        self.run_at(time::now()).await.map(Some)
    }

    /// Sends every due reminder as of `now`. A store read failure aborts
    /// the whole run before anything is sent.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<ReminderRunReport> {
        let appointments = self.store.read_all().await?;
        let due = select_due(&appointments, now, self.settings.lookahead);

        let mut report = ReminderRunReport {
            scanned: appointments.len(),
            selected: due.iter().map(|a| a.id).collect(),
            ..Default::default()
        };

        let outcomes = join_all(due.iter().map(|a| self.dispatch(a))).await;

        for (appointment, outcome) in due.iter().zip(outcomes) {
            match outcome {
                DispatchOutcome::Sent => report.sent.push(appointment.id),
                DispatchOutcome::AlreadyMarked => report.already_marked.push(appointment.id),
                DispatchOutcome::Failed(kind, message) => report.failures.push(ReminderFailure {
                    appointment_id: appointment.id,
                    kind,
                    message,
                }),
            }
        }

        Ok(report)
    }

    async fn dispatch(&self, appointment: &Appointment) -> DispatchOutcome {
        let (Some(to), Some(at)) = (appointment.contact_phone(), appointment.appointment_at) else {
            return DispatchOutcome::Failed(
                FailureKind::Dispatch,
                "appointment has no phone or time".to_string(),
            );
        };
        let body = render_reminder(appointment, at, self.settings.time_zone);

        match self.gateway.send(to, &body).await {
            Ok(sid) => {
                info!(
                    appointment_id = %appointment.id,
                    to = %phone::mask(to),
                    sid = %sid,
                    "reminder sent"
                );
            }
            Err(e) => {
                error!(
                    appointment_id = %appointment.id,
                    to = %phone::mask(to),
                    error = %e,
                    "reminder dispatch failed"
                );
                return DispatchOutcome::Failed(FailureKind::Dispatch, e.to_string());
            }
        }

        match self.store.mark_reminder_sent(appointment.id).await {
            Ok(true) => DispatchOutcome::Sent,
            Ok(false) => {
                warn!(
                    appointment_id = %appointment.id,
                    "reminder flag already set by a concurrent run"
                );
                DispatchOutcome::AlreadyMarked
            }
            Err(e) => {
                error!(
                    appointment_id = %appointment.id,
                    error = %e,
                    "reminder sent but flag write failed; it may be sent again"
                );
                DispatchOutcome::Failed(FailureKind::Mark, e.to_string())
            }
        }
    }
}
