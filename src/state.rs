use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::dispatcher::BookingDispatcher;
use crate::services::messaging::MessagingProvider;

pub struct AppState {
    pub config: AppConfig,
    pub dispatcher: BookingDispatcher,
    pub messaging: Arc<dyn MessagingProvider>,
}
