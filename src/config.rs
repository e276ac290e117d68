use std::env;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::slot::MAX_LOOKAHEAD_DAYS;
use crate::models::Window;
use crate::services::dispatcher::BookingFlow;

pub const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub line_access_token: String,
    pub line_channel_secret: String,
    pub spreadsheet_id: String,
    pub sheet_range: String,
    pub calendar_id: String,
    pub google_access_token: String,
    pub admin_ids: Vec<String>,
    pub window: Window,
    pub booking_flow: BookingFlow,
    pub pending_ttl_minutes: i64,
    pub line_api_base: String,
    pub sheets_api_base: String,
    pub calendar_api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let window = lookahead_window(env::var("LOOKAHEAD_DAYS").ok().as_deref())?;
        let pending_ttl_minutes: i64 = optional_parsed("PENDING_TTL_MINUTES", 15)?;
        if pending_ttl_minutes <= 0 {
            return Err(AppError::Config(
                "PENDING_TTL_MINUTES must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            port: optional_parsed("PORT", 3000)?,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "slotbot.db".to_string()),
            line_access_token: required("LINE_ACCESS_TOKEN")?,
            line_channel_secret: required("LINE_CHANNEL_SECRET")?,
            spreadsheet_id: required("SPREADSHEET_ID")?,
            sheet_range: env::var("SHEET_RANGE").unwrap_or_else(|_| "Sheet1!A:E".to_string()),
            calendar_id: required("CALENDAR_ID")?,
            google_access_token: required("GOOGLE_ACCESS_TOKEN")?,
            admin_ids: parse_id_list(&env::var("ADMIN_IDS").unwrap_or_default()),
            window,
            booking_flow: optional_parsed("BOOKING_FLOW", BookingFlow::Inline)?,
            pending_ttl_minutes,
            line_api_base: env::var("LINE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_LINE_API_BASE.to_string()),
            sheets_api_base: env::var("GOOGLE_SHEETS_API_BASE")
                .unwrap_or_else(|_| DEFAULT_SHEETS_API_BASE.to_string()),
            calendar_api_base: env::var("GOOGLE_CALENDAR_API_BASE")
                .unwrap_or_else(|_| DEFAULT_CALENDAR_API_BASE.to_string()),
        })
    }
}

fn required(name: &str) -> Result<String, AppError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(AppError::Config(format!("{name} is not set"))),
    }
}

fn optional_parsed<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{name} has an invalid value: {v}"))),
        _ => Ok(default),
    }
}

/// `LOOKAHEAD_DAYS`, defaulting to one day. Values outside `1..=MAX_LOOKAHEAD_DAYS` are rejected.
pub fn lookahead_window(raw: Option<&str>) -> Result<Window, AppError> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty()).unwrap_or("1");
    raw.parse::<u32>()
        .ok()
        .and_then(Window::from_days)
        .ok_or_else(|| {
            AppError::Config(format!(
                "LOOKAHEAD_DAYS must be between 1 and {MAX_LOOKAHEAD_DAYS}, got {raw}"
            ))
        })
}

pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
