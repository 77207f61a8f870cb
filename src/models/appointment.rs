use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One dog/owner booking. Only `reminder_sent` and `confirmation_status`
/// are ever written by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub owner_name: String,
    pub dog_name: String,
    pub owner_phone: Option<String>,
    pub appointment_at: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
    pub confirmation_status: Option<ConfirmationStatus>,
}

impl Appointment {
    /// The owner's phone, if one is on file and non-blank.
    pub fn contact_phone(&self) -> Option<&str> {
        self.owner_phone
            .as_deref()
            .filter(|phone| !phone.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Confirmed,
    Declined,
}

impl ConfirmationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationStatus::Confirmed => "confirmed",
            ConfirmationStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfirmationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ConfirmationStatus::Confirmed),
            "declined" => Ok(ConfirmationStatus::Declined),
            other => Err(format!("unknown confirmation status: {}", other)),
        }
    }
}
