pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::services::{
    appointment_store::AppointmentStore,
    reminder_service::{ReminderService, ReminderSettings},
    reply_service::ReplyService,
    sms_gateway::SmsGateway,
};

#[derive(Clone)]
pub struct AppState {
    pub reminder_service: ReminderService,
    pub reply_service: ReplyService,
    pub trigger_secret: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        gateway: Arc<dyn SmsGateway>,
        settings: ReminderSettings,
        trigger_secret: Option<String>,
    ) -> Self {
        let reminder_service = ReminderService::new(store.clone(), gateway, settings);
        let reply_service = ReplyService::new(store);

        Self {
            reminder_service,
            reply_service,
            trigger_secret,
        }
    }
}
