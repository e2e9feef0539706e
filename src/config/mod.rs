//! Layered configuration.
//!
//! Everything the core needs at boot comes from three environment
//! variables (`PORT`, `DATABASE_URL`, `SESSION_SECRET`) layered over
//! typed compile-time defaults — there is no configuration file in this
//! deployment shape. `Config` is built exactly once in `main` and handed
//! down as an owned collaborator; nothing reaches for it as a global.

mod defaults;

use std::time::Duration;
use thiserror::Error;

/// Maximum size, in bytes, of a decoded inbound text frame.
pub const MAX_FRAME_BYTES: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("SESSION_SECRET must be set and non-empty")]
    MissingSessionSecret,
    #[error("invalid value for {var}: {source}")]
    InvalidEnvValue {
        var: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// The quiz engine's wall-clock knobs. Fixed at build time by default,
/// but overridable via environment in test builds so integration tests can
/// shrink a 10-second question window to milliseconds without touching
/// engine logic.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    pub question_time_limit: Duration,
    pub quiz_start_delay: Duration,
    pub next_question_delay: Duration,
    pub questions_per_quiz: u8,
    pub max_connections_per_user: usize,
    pub rate_limit_window: Duration,
    pub rate_limit_max: u32,
    pub cleanup_interval: Duration,
    pub dead_room_retention: chrono::Duration,
    pub shutdown_grace: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            question_time_limit: Duration::from_millis(defaults::default_question_time_limit_ms()),
            quiz_start_delay: Duration::from_millis(defaults::default_quiz_start_delay_ms()),
            next_question_delay: Duration::from_millis(defaults::default_next_question_delay_ms()),
            questions_per_quiz: defaults::default_questions_per_quiz(),
            max_connections_per_user: defaults::default_max_connections_per_user(),
            rate_limit_window: Duration::from_millis(defaults::default_rate_limit_window_ms()),
            rate_limit_max: defaults::default_rate_limit_max(),
            cleanup_interval: Duration::from_secs(defaults::default_cleanup_interval_secs()),
            dead_room_retention: chrono::Duration::seconds(
                defaults::default_dead_room_retention_secs(),
            ),
            shutdown_grace: Duration::from_secs(defaults::default_shutdown_grace_secs()),
        }
    }
}

impl TimingConfig {
    /// Overrides timing knobs from environment variables, falling back to
    /// the compiled default for any variable that is absent. Used by
    /// integration tests (and, in principle, operators) to shrink the
    /// quiz timers without a config file.
    fn from_env() -> Result<Self, ConfigError> {
        let mut timing = Self::default();
        if let Some(ms) = env_u64("QUIZ_QUESTION_TIME_LIMIT_MS")? {
            timing.question_time_limit = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("QUIZ_START_DELAY_MS")? {
            timing.quiz_start_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("QUIZ_NEXT_QUESTION_DELAY_MS")? {
            timing.next_question_delay = Duration::from_millis(ms);
        }
        Ok(timing)
    }
}

fn env_u64(var: &'static str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|source| ConfigError::InvalidEnvValue { var, source }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::default_log_level(),
            json: false,
        }
    }
}

/// The resolved, owned configuration for one process lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub logging: LoggingConfig,
    pub timing: TimingConfig,
}

impl Config {
    /// Resolve configuration from the process environment. Fails loudly
    /// before any listener binds rather than panicking mid-request.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidEnvValue { var: "PORT", source })?,
            Err(_) => defaults::default_port(),
        };

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let session_secret = std::env::var("SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() {
            return Err(ConfigError::MissingSessionSecret);
        }

        let logging = LoggingConfig {
            level: std::env::var("QUIZ_LOG_LEVEL").unwrap_or_else(|_| defaults::default_log_level()),
            json: std::env::var("QUIZ_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };

        Ok(Self {
            port,
            database_url,
            session_secret,
            logging,
            timing: TimingConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_defaults_match_spec_constants() {
        let timing = TimingConfig::default();
        assert_eq!(timing.question_time_limit, Duration::from_secs(10));
        assert_eq!(timing.quiz_start_delay, Duration::from_secs(5));
        assert_eq!(timing.next_question_delay, Duration::from_secs(3));
        assert_eq!(timing.questions_per_quiz, 10);
        assert_eq!(timing.max_connections_per_user, 3);
        assert_eq!(timing.rate_limit_window, Duration::from_secs(1));
        assert_eq!(timing.rate_limit_max, 10);
    }

    #[test]
    fn max_frame_bytes_matches_spec() {
        assert_eq!(MAX_FRAME_BYTES, 1024);
    }
}
