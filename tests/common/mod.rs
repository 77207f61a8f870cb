#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use appointment_reminders::error::{Error, Result};
use appointment_reminders::models::appointment::{Appointment, ConfirmationStatus};
use appointment_reminders::services::appointment_store::AppointmentStore;
use appointment_reminders::services::sms_gateway::SmsGateway;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<Vec<Appointment>>,
    pub fail_reads: bool,
    pub status_writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn with(records: Vec<Appointment>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            ..Default::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_reads: true,
            ..Default::default()
        })
    }

    pub fn get(&self, id: Uuid) -> Appointment {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .expect("appointment present")
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn read_all(&self) -> Result<Vec<Appointment>> {
        if self.fail_reads {
            return Err(Error::Internal("store offline".into()));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn mark_reminder_sent(&self, id: Uuid) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let changed = !record.reminder_sent;
        record.reminder_sent = true;
        Ok(changed)
    }

    async fn set_confirmation_status(&self, id: Uuid, status: ConfirmationStatus) -> Result<()> {
        *self.status_writes.lock().unwrap() += 1;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        record.confirmation_status = Some(status);
        Ok(())
    }
}

/// Records every send; numbers listed in `reject` fail.
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<(String, String)>>,
    pub reject: HashSet<String>,
}

#[async_trait]
impl SmsGateway for RecordingGateway {
    async fn send(&self, to: &str, body: &str) -> Result<String> {
        if self.reject.contains(to) {
            return Err(Error::Gateway {
                status: 400,
                message: "rejected".into(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), body.to_string()));
        Ok(format!("SM{}", sent.len()))
    }
}

pub fn appointment(phone: Option<&str>, at: Option<DateTime<Utc>>) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        owner_name: "Jordan".into(),
        dog_name: "Rex".into(),
        owner_phone: phone.map(str::to_string),
        appointment_at: at,
        reminder_sent: false,
        confirmation_status: None,
    }
}
