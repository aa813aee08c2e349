//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default: `0.0.0.0:8080`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`: Postgres; unset keeps orders in memory
/// - `CART_SERVICE_URL`, `PRODUCT_SERVICE_URL`: checkout inputs; unset ones
///   read from an empty in-memory store and are reported at startup
/// - `PAYMENT_SERVICE_URL`, `NOTIFICATION_SERVICE_URL`: HTTP sinks
/// - `SQS_QUEUE_URL`, `EVENT_BUS_NAME`: queue and event bus sinks (AWS
///   credentials and region come from the usual AWS environment)
/// - any unset sink only logs each call
/// - `ORDER_SERVICE_HOST`: public base of this service, used for the payment callback URL
/// - `HTTP_TIMEOUT_SECS`: timeout of every outbound call (default: `10`)
/// - `DISPATCH_QUEUE_CAPACITY`: bound of the fan-out queue (default: `1024`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub cart_service_url: Option<String>,
    pub product_service_url: Option<String>,
    pub payment_service_url: Option<String>,
    pub notification_service_url: Option<String>,
    pub sqs_queue_url: Option<String>,
    pub event_bus_name: Option<String>,
    pub order_service_host: String,
    pub http_timeout_secs: u64,
    pub dispatch_queue_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        // Empty values count as unset.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: var("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            database_url: var("DATABASE_URL"),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            cart_service_url: var("CART_SERVICE_URL"),
            product_service_url: var("PRODUCT_SERVICE_URL"),
            payment_service_url: var("PAYMENT_SERVICE_URL"),
            notification_service_url: var("NOTIFICATION_SERVICE_URL"),
            sqs_queue_url: var("SQS_QUEUE_URL"),
            event_bus_name: var("EVENT_BUS_NAME"),
            order_service_host: var("ORDER_SERVICE_HOST").unwrap_or(defaults.order_service_host),
            http_timeout_secs: var("HTTP_TIMEOUT_SECS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            dispatch_queue_capacity: var("DISPATCH_QUEUE_CAPACITY")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.dispatch_queue_capacity),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL the payment provider reports results to.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/orders/callback",
            self.order_service_host.trim_end_matches('/')
        )
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Whether a queue or event bus needs the AWS SDK configuration.
    pub fn uses_aws(&self) -> bool {
        self.sqs_queue_url.is_some() || self.event_bus_name.is_some()
    }

    /// Checkout inputs with no URL. Without them every checkout sees an
    /// empty cart or an unknown product.
    pub fn missing_checkout_inputs(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.cart_service_url.is_none() {
            missing.push("CART_SERVICE_URL");
        }
        if self.product_service_url.is_none() {
            missing.push("PRODUCT_SERVICE_URL");
        }
        missing
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 5,
            cart_service_url: None,
            product_service_url: None,
            payment_service_url: None,
            notification_service_url: None,
            sqs_queue_url: None,
            event_bus_name: None,
            order_service_host: "http://localhost:8080".to_string(),
            http_timeout_secs: 10,
            dispatch_queue_capacity: fulfillment::dispatcher::DEFAULT_QUEUE_CAPACITY,
        }
    }
}
