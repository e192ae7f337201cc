use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use secrecy::Secret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::authentication::ApiToken;
use crate::config::{DatabaseSettings, Settings};
use crate::email_client::EmailClient;
use crate::notifier::NotifierClient;
use crate::routes::{
    handle_issue_otp, handle_list_subscribers, handle_outcome_email, handle_send_otp_email,
    handle_verify_otp, health_check,
};

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let sender_email = config
            .get_email_client_sender()
            .expect("Sender email is not valid");
        let email_client = EmailClient::new(
            config.get_email_client_base_url(),
            sender_email,
            config.get_email_client_api(),
            None,
        );
        let notifier = NotifierClient::new(
            config.get_notifier_base_url(),
            config.get_api_token(),
            None,
        );

        let listener =
            TcpListener::bind(config.get_address()).expect("Failed to bind the address.");
        let port = listener.local_addr().unwrap().port();
        let server = run(
            listener,
            db_pool,
            email_client,
            notifier,
            config.get_api_token(),
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    email_client: EmailClient,
    notifier: NotifierClient,
    api_token: Secret<String>,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let email_client = web::Data::new(email_client);
    let notifier = web::Data::new(notifier);
    let api_token = web::Data::new(ApiToken(api_token));

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            // The storefront pages live on other origins, so the whole surface stays open.
            // The internal endpoints are protected by the bearer token, not by CORS.
            .wrap(Cors::permissive())
            .route("/health_check", web::get().to(health_check))
            .route("/mail", web::get().to(handle_list_subscribers))
            .route("/mail/otp", web::post().to(handle_issue_otp))
            .route("/mail/verify", web::post().to(handle_verify_otp))
            .route("/mail/send", web::post().to(handle_send_otp_email))
            .route("/mail/done", web::post().to(handle_outcome_email))
            .app_data(db_pool.clone())
            .app_data(email_client.clone())
            .app_data(notifier.clone())
            .app_data(api_token.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
