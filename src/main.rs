use std::net::SocketAddr;
use std::sync::Arc;

use appointment_reminders::{
    config::Config,
    database::pool::{create_pool, run_migrations},
    routes,
    services::{
        appointment_store::PgAppointmentStore, reminder_service::ReminderSettings,
        scheduler::start_reminder_job, sms_gateway::TwilioGateway,
    },
    AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let store = Arc::new(PgAppointmentStore::new(pool));
    let gateway = Arc::new(TwilioGateway::from_config(&config)?);
    let settings = ReminderSettings {
        lookahead: config.reminder_lookahead(),
        time_zone: config.reminder_time_zone,
    };
    info!(
        lookahead_hours = config.reminder_lookahead_hours,
        time_zone = %config.reminder_time_zone,
        "reminder settings loaded"
    );

    let app_state = AppState::new(store, gateway, settings, config.trigger_secret.clone());

    let _scheduler =
        start_reminder_job(app_state.reminder_service.clone(), &config.reminder_cron).await?;

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/sms/inbound", post(routes::sms::handle_inbound))
        .route("/api/reminders/run", post(routes::reminders::run_reminders))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
