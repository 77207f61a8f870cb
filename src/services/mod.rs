pub mod appointment_store;
pub mod reminder_service;
pub mod reply_service;
pub mod scheduler;
pub mod sms_gateway;
