use crate::error::{Error, Result};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::America::Denver;
pub const DEFAULT_REMINDER_CRON: &str = "0 */5 * * * *";
pub const DEFAULT_LOOKAHEAD_HOURS: i64 = 24;
/// Five years.
pub const MAX_LOOKAHEAD_HOURS: i64 = 24 * 365 * 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from: String,
    pub twilio_api_base: String,
    pub gateway_timeout_secs: u64,
    pub reminder_lookahead_hours: i64,
    pub reminder_time_zone: Tz,
    pub reminder_cron: String,
    pub trigger_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let reminder_lookahead_hours: i64 =
            get_env_parse_or("REMINDER_LOOKAHEAD_HOURS", DEFAULT_LOOKAHEAD_HOURS)?;
        if !(1..=MAX_LOOKAHEAD_HOURS).contains(&reminder_lookahead_hours) {
            return Err(Error::Config(format!(
                "REMINDER_LOOKAHEAD_HOURS must be between 1 and {}, got {}",
                MAX_LOOKAHEAD_HOURS, reminder_lookahead_hours
            )));
        }

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            twilio_account_sid: get_env("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: get_env("TWILIO_AUTH_TOKEN")?,
            twilio_from: get_env("TWILIO_FROM")?,
            twilio_api_base: get_env_or("TWILIO_API_BASE", DEFAULT_TWILIO_API_BASE),
            gateway_timeout_secs: get_env_parse_or("GATEWAY_TIMEOUT_SECS", 15)?,
            reminder_lookahead_hours,
            reminder_time_zone: get_env_parse_or("REMINDER_TIME_ZONE", DEFAULT_TIME_ZONE)?,
            reminder_cron: get_env_or("REMINDER_CRON", DEFAULT_REMINDER_CRON),
            trigger_secret: env::var("TRIGGER_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn reminder_lookahead(&self) -> chrono::Duration {
        chrono::Duration::hours(self.reminder_lookahead_hours)
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
