//! 서버 설정
//!
//! `.env.local` → `.env` 순으로 환경 파일을 읽은 뒤 환경 변수에서 설정을 만든다.
//! 제공자 API 키(OPENROUTER_API_KEY, PERPLEXITY_API_KEY)는 여기서 읽지 않고
//! 요청 시점에 `ai` 모듈이 직접 읽는다.

use std::path::{Path, PathBuf};

use crate::auth::AuthConfig;
use crate::error::TransdocError;

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
    pub auth: AuthConfig,
    pub openrouter_base_url: String,
    pub perplexity_base_url: String,
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드
    ///
    /// | Env Var                | Default                          |
    /// |------------------------|----------------------------------|
    /// | `HOST`                 | `0.0.0.0`                        |
    /// | `PORT`                 | `3000`                           |
    /// | `DATABASE_PATH`        | `transdoc.db`                    |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`          |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                             |
    /// | `LOG_FORMAT`           | `text`                           |
    /// | `AUTH_JWT_SECRET`      | (필수)                           |
    /// | `OPENROUTER_BASE_URL`  | `https://openrouter.ai/api/v1`   |
    /// | `PERPLEXITY_BASE_URL`  | `https://api.perplexity.ai`      |
    pub fn from_env() -> Result<Self, TransdocError> {
        let port = parse_var("PORT", 3000u16)?;
        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 30u64)?;

        let log_format = match var_or("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => {
                return Err(TransdocError::Config(format!(
                    "LOG_FORMAT must be 'text' or 'json', got '{other}'"
                )))
            }
        };

        let secret = non_empty_var("AUTH_JWT_SECRET")
            .ok_or_else(|| TransdocError::Config("AUTH_JWT_SECRET must be set".into()))?;

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port,
            database_path: PathBuf::from(var_or("DATABASE_PATH", "transdoc.db")),
            cors_origins: split_origins(&var_or("CORS_ORIGINS", "http://localhost:3000")),
            request_timeout_secs,
            log_format,
            auth: AuthConfig::new(secret),
            openrouter_base_url: base_url("OPENROUTER_BASE_URL", DEFAULT_OPENROUTER_BASE_URL)?,
            perplexity_base_url: base_url("PERPLEXITY_BASE_URL", DEFAULT_PERPLEXITY_BASE_URL)?,
        })
    }
}

/// 비어있지 않은 환경 변수 값 (trim)
pub fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    non_empty_var(key).unwrap_or_else(|| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, TransdocError> {
    match non_empty_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| TransdocError::Config(format!("{key} has an invalid value '{raw}'"))),
        None => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// URL 검증 후 끝의 `/`를 떼어 반환
fn base_url(key: &str, default: &str) -> Result<String, TransdocError> {
    let raw = var_or(key, default);
    url::Url::parse(&raw).map_err(|e| TransdocError::Config(format!("{key} is not a valid URL: {e}")))?;
    Ok(raw.trim_end_matches('/').to_string())
}

fn is_valid_env_key(key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    // 관례적으로 ENV 키는 A-Z0-9_ 로 제한
    key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// `KEY=VALUE` 줄만 골라 읽는 관대한 로더.
/// 주석/코드펜스/설명 문장이 섞인 파일에서도 동작하며, 이미 값이 있는 키는 덮어쓰지 않는다.
fn load_env_lenient(path: &Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let mut loaded = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("```") {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line).trim();
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim();
        if !is_valid_env_key(key) || non_empty_var(key).is_some() {
            continue;
        }

        let mut value = v.trim();
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }

        std::env::set_var(key, value);
        loaded.push(key.to_string());
    }

    Ok(loaded)
}

fn find_upwards(start: PathBuf, filename: &str, max_hops: usize) -> Option<PathBuf> {
    let mut cur = start;
    for _ in 0..=max_hops {
        let candidate = cur.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !cur.pop() {
            break;
        }
    }
    None
}

/// 환경 파일 로드. 찾은 파일 경로를 반환한다 (로깅 초기화 전에 호출되므로 직접 로그하지 않음).
pub fn load_env_files() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(find_upwards(cwd, ".env.local", 6));
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.extend(find_upwards(dir.to_path_buf(), ".env.local", 8));
        }
    }

    let mut loaded = Vec::new();
    for path in candidates {
        // strict 파서 우선, 실패하면 lenient 로더로 보강
        let ok = dotenvy::from_path(&path).is_ok()
            || load_env_lenient(&path).map(|keys| !keys.is_empty()).unwrap_or(false);
        if ok {
            loaded.push(path);
            break;
        }
    }

    if let Ok(path) = dotenvy::dotenv() {
        loaded.push(path);
    }
    loaded
}
