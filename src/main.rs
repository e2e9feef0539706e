#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use quiz_session_core::auth::HmacSessionVerifier;
use quiz_session_core::config::Config;
use quiz_session_core::gateway::{build_router, run_supervisor, shutdown_gateway, shutdown_signal, Gateway};
use quiz_session_core::logging;
use quiz_session_core::store::PgStore;

/// Push-protocol gateway for a multiplayer trivia quiz session.
#[derive(Parser, Debug)]
#[command(name = "quiz-session-core")]
#[command(about = "Push-protocol gateway and state machine for a multiplayer trivia quiz session")]
#[command(version)]
struct Cli {
    /// Validate configuration (environment variables) and exit without
    /// starting the server. Useful for CI/CD pipelines and pre-deployment
    /// checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[derive(serde::Serialize)]
struct ConfigSummary<'a> {
    port: u16,
    logging_level: &'a str,
    logging_json: bool,
    question_time_limit_ms: u128,
    quiz_start_delay_ms: u128,
    next_question_delay_ms: u128,
    questions_per_quiz: u8,
    max_connections_per_user: usize,
}

impl<'a> ConfigSummary<'a> {
    fn from_config(config: &'a Config) -> Self {
        Self {
            port: config.port,
            logging_level: &config.logging.level,
            logging_json: config.logging.json,
            question_time_limit_ms: config.timing.question_time_limit.as_millis(),
            quiz_start_delay_ms: config.timing.quiz_start_delay.as_millis(),
            next_question_delay_ms: config.timing.next_question_delay.as_millis(),
            questions_per_quiz: config.timing.questions_per_quiz,
            max_connections_per_user: config.timing.max_connections_per_user,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    if cli.print_config {
        let summary = ConfigSummary::from_config(&config);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if cli.validate_config {
        println!("configuration validation passed");
        println!();
        println!("configuration summary:");
        println!("  port: {}", config.port);
        println!("  question time limit: {:?}", config.timing.question_time_limit);
        println!("  questions per quiz: {}", config.timing.questions_per_quiz);
        println!("  max connections per user: {}", config.timing.max_connections_per_user);
        return Ok(());
    }

    logging::init(&config.logging);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let database_url = config.database_url.clone();
    let session_secret = config.session_secret.clone().into_bytes();

    let store = PgStore::connect(&database_url)
        .await
        .map_err(|err| anyhow::anyhow!("failed to connect to database: {err}"))?;
    let verifier = HmacSessionVerifier::new(session_secret);

    let gateway = Gateway::new(config, Arc::new(store), Arc::new(verifier));

    let supervisor_gateway = gateway.clone();
    tokio::spawn(async move {
        run_supervisor(supervisor_gateway).await;
    });

    let router = build_router(gateway.clone(), "*");

    tracing::info!(%addr, "starting quiz session core");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown_grace = gateway.config.timing.shutdown_grace;

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop accepting new work, tell every live connection it's going away,
    // and cancel all room timers, all bounded by the configured grace
    // period rather than letting a stuck client hang the process exit.
    gateway.connections.shutdown_all();
    shutdown_gateway(&gateway);
    if tokio::time::timeout(shutdown_grace, gateway.store.close())
        .await
        .is_err()
    {
        tracing::warn!("shutdown grace period elapsed before the store finished draining");
    }
    Ok(())
}
