//! Transdoc - 협업 문서 번역 백엔드
//!
//! 프로젝트, 문서, 버전 히스토리, 프로젝트별 용어 사전을 SQLite에 저장하고
//! OpenRouter 경유 AI 채팅 (도구 호출 포함)을 스트리밍으로 중계한다.

pub mod ai;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod models;
pub mod state;

use std::net::SocketAddr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::{LogFormat, ServerConfig};
use db::{Database, DbState};
use error::TransdocError;
use state::AppState;

const DEFAULT_LOG_FILTER: &str = "transdoc_lib=debug,tower_http=info";

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// 데이터베이스 열기 + 스키마 초기화
pub fn open_database(config: &ServerConfig) -> Result<DbState, TransdocError> {
    let db = Database::new(&config.database_path)?;
    db.initialize()?;
    Ok(DbState::new(db))
}

/// SIGINT / SIGTERM 대기
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}

/// 서버 실행
pub async fn run() -> Result<(), TransdocError> {
    // 로깅 초기화 전이라 로드 결과는 아래에서 기록한다
    let env_files = config::load_env_files();

    let config = ServerConfig::from_env()?;
    init_tracing(config.log_format);
    for path in &env_files {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    let db = open_database(&config)?;
    tracing::info!(path = %config.database_path.display(), "Database initialized");

    let addr = SocketAddr::new(
        config
            .host
            .parse()
            .map_err(|e| TransdocError::Config(format!("Invalid HOST address '{}': {e}", config.host)))?,
        config.port,
    );

    let state = AppState::new(db, config)?;
    let app = handlers::build_router(state)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}
