use std::{env, time::Duration as StdDuration};

use bzr_common::{parse_boolean_flag, Secret};
use chrono::Duration;
use log::*;

const DEFAULT_BZR_HOST: &str = "127.0.0.1";
const DEFAULT_BZR_PORT: u16 = 8380;
/// How long an unpaid provider order holds its stock before the expiry sweep cancels it.
const DEFAULT_PENDING_ORDER_TIMEOUT_SECS: i64 = 10 * 60;
/// How often the expiry sweep runs. The sweep is guarded and idempotent, so the interval only bounds how late a
/// cancellation can be, never how often state can change.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;
const DEFAULT_PROVIDER_REF_PREFIX: &str = "bzr";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The time an unpaid provider order may stay `Pending` before it is cancelled and its stock released.
    pub pending_order_timeout: Duration,
    /// The interval at which the expiry worker scans for lapsed orders.
    pub sweep_interval: StdDuration,
    /// Payment provider configuration.
    pub provider: ProviderConfig,
}

#[derive(Clone, Debug, Default)]
pub struct ProviderConfig {
    /// The shared secret the provider signs payment confirmations with.
    pub hmac_secret: Secret<String>,
    /// Prefix for locally minted checkout references.
    pub ref_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BZR_HOST.to_string(),
            port: DEFAULT_BZR_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            pending_order_timeout: Duration::seconds(DEFAULT_PENDING_ORDER_TIMEOUT_SECS),
            sweep_interval: StdDuration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            provider: ProviderConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BZR_HOST").ok().unwrap_or_else(|| DEFAULT_BZR_HOST.into());
        let port = env::var("BZR_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BZR_PORT. {e} Using the default, {DEFAULT_BZR_PORT}, instead."
                    );
                    DEFAULT_BZR_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BZR_PORT);
        let database_url = env::var("BZR_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ BZR_DATABASE_URL is not set. Please set it to the URL for the Bazaar database.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("BZR_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("BZR_USE_FORWARDED").ok(), false);
        let pending_order_timeout = configure_pending_timeout();
        let sweep_interval = env::var("BZR_EXPIRY_SWEEP_INTERVAL")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for BZR_EXPIRY_SWEEP_INTERVAL. {e}"))
                    .ok()
            })
            .map(StdDuration::from_secs)
            .unwrap_or(StdDuration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS));
        let provider = ProviderConfig::from_env_or_defaults();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            pending_order_timeout,
            sweep_interval,
            provider,
        }
    }
}

impl ProviderConfig {
    pub fn from_env_or_defaults() -> Self {
        let hmac_secret = env::var("BZR_PROVIDER_HMAC_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🚨️ BZR_PROVIDER_HMAC_SECRET is not set. Payment confirmations cannot be verified without it, so \
                 every verification call will be rejected. Set it to the webhook secret shared with your payment \
                 provider."
            );
            String::default()
        });
        let ref_prefix =
            env::var("BZR_PROVIDER_REF_PREFIX").ok().unwrap_or_else(|| DEFAULT_PROVIDER_REF_PREFIX.into());
        Self { hmac_secret: Secret::new(hmac_secret), ref_prefix }
    }
}

fn configure_pending_timeout() -> Duration {
    env::var("BZR_PENDING_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ BZR_PENDING_ORDER_TIMEOUT is not set. Using the default value of {DEFAULT_PENDING_ORDER_TIMEOUT_SECS} seconds."
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::seconds)
                .map_err(|e| warn!("🪛️ Invalid configuration value for BZR_PENDING_ORDER_TIMEOUT. {e}"))
        })
        .ok()
        .unwrap_or(Duration::seconds(DEFAULT_PENDING_ORDER_TIMEOUT_SECS))
}

//-------------------------------------------------  ServerOptions  ---------------------------------------------------
/// A subset of the server configuration that request handlers need. Kept small, and free of secrets, so it can be
/// passed around the system without care.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
