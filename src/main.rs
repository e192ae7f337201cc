use hatoage_mail::config::get_configuration;
use hatoage_mail::startup::Application;
use hatoage_mail::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber(String::from("hatoage_mail"), String::from("info"));

    init_subscriber(subscriber);

    let config = get_configuration().expect("Missing configuration file.");
    let application = Application::build(config)
        .await
        .expect("Failed to build application.");

    tracing::info!("Server listening on port {}", application.get_port());

    application.run_until_stop().await
}
