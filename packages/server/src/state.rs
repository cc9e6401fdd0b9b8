use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::events::EventHub;
use crate::runner::CodeRunner;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub events: EventHub,
    pub runner: Arc<dyn CodeRunner>,
}
