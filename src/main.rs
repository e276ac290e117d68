use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use slotbot::config::AppConfig;
use slotbot::db;
use slotbot::services::calendar::GoogleCalendar;
use slotbot::services::dispatcher::BookingDispatcher;
use slotbot::services::messaging::line::LineMessaging;
use slotbot::services::messaging::MessagingProvider;
use slotbot::services::notify::AdminAlerts;
use slotbot::services::pending::PendingStore;
use slotbot::services::sheets::GoogleSheets;
use slotbot::services::slots::SlotCalculator;
use slotbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    let conn = db::init_db(&config.database_url)?;

    let calendar = Arc::new(GoogleCalendar::new(
        config.calendar_api_base.clone(),
        config.calendar_id.clone(),
        config.google_access_token.clone(),
    ));
    let sheets = Arc::new(GoogleSheets::new(
        config.sheets_api_base.clone(),
        config.spreadsheet_id.clone(),
        config.sheet_range.clone(),
        config.google_access_token.clone(),
    ));
    let messaging: Arc<dyn MessagingProvider> = Arc::new(LineMessaging::new(
        config.line_api_base.clone(),
        config.line_access_token.clone(),
    ));

    if config.admin_ids.is_empty() {
        tracing::warn!("ADMIN_IDS not configured, admin alerts disabled");
    }

    let dispatcher = BookingDispatcher::new(
        SlotCalculator::new(calendar.clone(), config.window),
        calendar,
        sheets,
        PendingStore::new(
            Arc::new(Mutex::new(conn)),
            chrono::Duration::minutes(config.pending_ttl_minutes),
        ),
        AdminAlerts::new(messaging.clone(), config.admin_ids.clone()),
        config.booking_flow,
    );

    tracing::info!(
        window_days = config.window.days(),
        flow = ?config.booking_flow,
        "booking dispatcher ready"
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        dispatcher,
        messaging,
    });

    let app = slotbot::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
