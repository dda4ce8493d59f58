use std::env;

use crate::engine::pricing::PricingModel;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub backend_url: String,
    pub backend_timeout_ms: u64,
    pub pricing_model: PricingModel,
    pub event_buffer_size: usize,
    pub booking_redirect_delay_ms: u64,
    pub admin_redirect_delay_ms: u64,
    pub wizard_ttl_secs: u64,
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub frontend_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            backend_url: "http://localhost:8000".to_string(),
            backend_timeout_ms: 10_000,
            pricing_model: PricingModel::WeightBased,
            event_buffer_size: 1024,
            booking_redirect_delay_ms: 2000,
            admin_redirect_delay_ms: 3000,
            wizard_ttl_secs: 3600,
            session_ttl_secs: 86_400,
            sweep_interval_secs: 60,
            frontend_origin: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            backend_url: env::var("BACKEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.backend_url),
            backend_timeout_ms: parse_or_default("BACKEND_TIMEOUT_MS", defaults.backend_timeout_ms)?,
            pricing_model: parse_or_default("PRICING_MODEL", defaults.pricing_model)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            booking_redirect_delay_ms: parse_or_default(
                "BOOKING_REDIRECT_DELAY_MS",
                defaults.booking_redirect_delay_ms,
            )?,
            admin_redirect_delay_ms: parse_or_default(
                "ADMIN_REDIRECT_DELAY_MS",
                defaults.admin_redirect_delay_ms,
            )?,
            wizard_ttl_secs: parse_or_default("WIZARD_TTL_SECS", defaults.wizard_ttl_secs)?,
            session_ttl_secs: parse_or_default("SESSION_TTL_SECS", defaults.session_ttl_secs)?,
            sweep_interval_secs: parse_or_default(
                "SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            )?
            .max(1),
            frontend_origin: env::var("FRONTEND_ORIGIN").ok().filter(|o| !o.is_empty()),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
