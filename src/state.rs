use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::db::DbState;
use crate::error::TransdocError;
use crate::events::EventBus;

/// 핸들러 간 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbState>,
    pub config: Arc<ServerConfig>,
    pub events: Arc<EventBus>,
    /// 외부 AI/검색 호출용 공용 클라이언트
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: DbState, config: ServerConfig) -> Result<Self, TransdocError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransdocError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            db: Arc::new(db),
            config: Arc::new(config),
            events: Arc::new(EventBus::default()),
            http,
        })
    }
}
