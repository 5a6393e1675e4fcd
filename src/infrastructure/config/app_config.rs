use crate::application::OrderStatuses;
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const TEST_BASE_URL: &str = "https://testapi.e-paylink.com/gateway/rest/api/v1";
pub const LIVE_BASE_URL: &str = "https://www.wu-online.gr/gateway/rest/api/v1";

const DEFAULT_PAYMENT_CODE_LIFE_HOURS: u32 = 720;
const MAX_BATCH_SIZE: usize = 100;

/// PayByBank API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayByBankConfig {
    /// Merchant API key, part of every request path
    pub api_key: String,

    pub test_mode: bool,

    /// API base URL (test or live unless overridden)
    pub base_url: String,

    /// Life of a payment code in hours
    pub payment_code_life_hours: u32,

    /// Timeout for single-order reference creation
    pub create_timeout: Duration,

    /// Timeout for bulk status queries
    pub query_timeout: Duration,

    /// Order ids per bulk status query
    pub batch_size: usize,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// UTC hour window in which the daily reconciliation run is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub window_start_hour: u32,
    pub window_end_hour: u32,
}

/// Whole service configuration, built once and handed to each component
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server: ServerConfig,
    pub paybybank: PayByBankConfig,
    pub order_statuses: OrderStatuses,
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let test_mode = env.flag_or("PAYBYBANK_TEST_MODE", true)?;
        let base_url = env
            .get("PAYBYBANK_BASE_URL")
            .unwrap_or_else(|| {
                if test_mode { TEST_BASE_URL } else { LIVE_BASE_URL }.to_string()
            })
            .trim_end_matches('/')
            .to_string();

        // a zero code life falls back to the provider default
        let payment_code_life_hours = match env
            .parse_or("PAYBYBANK_PAYMENT_CODE_LIFE_HOURS", DEFAULT_PAYMENT_CODE_LIFE_HOURS)?
        {
            0 => DEFAULT_PAYMENT_CODE_LIFE_HOURS,
            hours => hours,
        };

        let batch_size = env.parse_or("PAYBYBANK_BATCH_SIZE", MAX_BATCH_SIZE)?;
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            return Err(DomainError::ConfigurationError(format!(
                "PAYBYBANK_BATCH_SIZE must be between 1 and {}",
                MAX_BATCH_SIZE
            )));
        }

        let paybybank = PayByBankConfig {
            api_key: env.require("PAYBYBANK_API_KEY")?,
            test_mode,
            base_url,
            payment_code_life_hours,
            create_timeout: Duration::from_secs(env.parse_or("PAYBYBANK_CREATE_TIMEOUT_SECS", 10)?),
            query_timeout: Duration::from_secs(env.parse_or("PAYBYBANK_QUERY_TIMEOUT_SECS", 90)?),
            batch_size,
        };

        let order_statuses = OrderStatuses {
            initial: normalize_status(
                &env.get("ORDER_STATUS_INITIAL").unwrap_or_else(|| "on-hold".to_string()),
            ),
            paid: normalize_status(
                &env.get("ORDER_STATUS_PAID").unwrap_or_else(|| "paybybank-paid".to_string()),
            ),
            ..OrderStatuses::default()
        };

        let schedule = ScheduleConfig {
            window_start_hour: env.parse_or("RECONCILE_WINDOW_START_HOUR", 0)?,
            window_end_hour: env.parse_or("RECONCILE_WINDOW_END_HOUR", 5)?,
        };
        if schedule.window_end_hour > 23 || schedule.window_start_hour > schedule.window_end_hour {
            return Err(DomainError::ConfigurationError(
                "Reconciliation window must satisfy 0 <= start <= end <= 23".to_string(),
            ));
        }

        Ok(Self {
            database_url: env.require("DATABASE_URL")?,
            server: ServerConfig {
                host: env.get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: env.parse_or("SERVER_PORT", 3000)?,
            },
            paybybank,
            order_statuses,
            schedule,
        })
    }
}

/// Order status names may be configured with the `wc-` prefix
fn normalize_status(status: &str) -> String {
    let status = status.trim();
    status.strip_prefix("wc-").unwrap_or(status).to_string()
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn require(&self, key: &str) -> DomainResult<String> {
        self.get(key)
            .ok_or_else(|| DomainError::ConfigurationError(format!("{} must be set", key)))
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> DomainResult<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => parse_value(key, &raw),
        }
    }

    /// Boolean setting; yes/no and on/off spellings are accepted
    fn flag_or(&self, key: &str, default: bool) -> DomainResult<bool> {
        match self.get(key).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) if matches!(v.as_str(), "yes" | "on" | "1") => Ok(true),
            Some(v) if matches!(v.as_str(), "no" | "off" | "0") => Ok(false),
            Some(v) => parse_value(key, &v),
        }
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> DomainResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| DomainError::ConfigurationError(format!("{} has an invalid value: {}", key, raw)))
}
