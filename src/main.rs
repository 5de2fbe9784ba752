use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::time::Duration;
use tokio::sync::watch;

use bookstore_api::configuration::get_configuration;
use bookstore_api::email_client::{EmailClient, SenderEmail};
use bookstore_api::startup::run;
use bookstore_api::telemetry::init_telemetry;
use bookstore_api::worker::run_cleanup_worker;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let connection_string = configuration.database.connection_string();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created");

    let sender = SenderEmail::parse(configuration.email.sender.clone()).map_err(|e| {
        tracing::error!("Invalid sender email in configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    let email_client = EmailClient::new(
        configuration.email.base_url.clone(),
        sender,
        reqwest::Client::new(),
    );

    // Background sweep of revoked refresh tokens; the watch channel lets us
    // cancel it cooperatively when the server stops
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(run_cleanup_worker(
        pool.clone(),
        Duration::from_secs(configuration.cleanup.interval_seconds),
        shutdown_rx,
    ));

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        pool,
        configuration.application.clone(),
        configuration.jwt.clone(),
        email_client,
    )?;

    let result = server.await;

    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;

    result
}
