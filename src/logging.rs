//! Structured logging bootstrap. `RUST_LOG`, if set, always wins;
//! otherwise the configured level is used, falling back to `info`.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let subscriber = fmt().with_env_filter(filter).with_target(true);

    if config.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
