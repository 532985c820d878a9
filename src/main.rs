//! tablemap - Main entry point.
//!
//! Runs one SQL statement through the pooled executor and prints the result
//! as JSON: the rows for row-returning statements, the affected-row count
//! otherwise.

use tablemap::config::Config;
use tablemap::db::sql::returns_rows;
use tablemap::db::{ConnectionPool, QueryExecutor};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout carries only the JSON result
    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    // Initialize logging
    init_tracing(&config);

    info!("Starting tablemap v{}", env!("CARGO_PKG_VERSION"));

    let pool_config = config.pool_config()?;
    info!(database = %pool_config, "Opening connection pool");

    // Reads go through select, everything else through the transactional write path
    let wants_rows = returns_rows(&config.sql, pool_config.db_type)?;

    let pool = ConnectionPool::connect(pool_config).await?;
    let executor = QueryExecutor::new(pool.clone())
        .with_query_timeout(config.query_timeout_duration())
        .with_row_count_policy(config.row_count_policy);

    let args = config.statement_args();
    let result = if wants_rows {
        executor
            .select(&config.sql, &args, config.limit)
            .await
            .map(|rows| serde_json::json!({ "rows": rows }))
    } else {
        executor
            .execute(&config.sql, &args)
            .await
            .map(|rows_affected| serde_json::json!({ "rows_affected": rows_affected }))
    };

    pool.close().await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Statement failed");
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {suggestion}");
            }
            Err(e.into())
        }
    }
}
