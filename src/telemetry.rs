use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Builds the tracing subscriber without installing it, so binaries can decide
/// when (and whether) to install it.
pub fn get_subscriber(name: String, default_env_filter: String) -> impl Subscriber + Send + Sync {
    // RUST_LOG takes precedence over the level the binary asks for
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_env_filter));
    let formatting_layer = BunyanFormattingLayer::new(name, std::io::stdout);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    // Redirect every `log` event emitted by our dependencies into tracing
    LogTracer::init().expect("Failed to initialize the log tracer.");
    set_global_default(subscriber).expect("Failed to set the tracing subscriber.");
}
