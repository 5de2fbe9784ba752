use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured JSON logging.
/// The log level is controlled through the RUST_LOG environment variable.
pub fn init_telemetry() {
    // `log`-facade records (request logging middleware, actix internals) go
    // through env_logger; try_init tolerates repeated calls from tests
    let _ = env_logger::try_init();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    // try_init rather than init: the `log` logger is already claimed by
    // env_logger above, and a second call from tests must not panic
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init();
}
