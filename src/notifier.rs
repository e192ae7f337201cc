use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::outcome::SubscriptionOutcome;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Client for the collaborator that turns a verification outcome into the
/// confirmation email. Callers treat delivery failures as non-fatal: the
/// subscription result must not depend on the outcome email being queued.
pub struct NotifierClient {
    http_client: Client,
    base_url: String,
    api_token: Secret<String>,
}

#[derive(serde::Serialize)]
struct OutcomeNotification<'a> {
    email: &'a str,
    status: &'a str,
}

impl NotifierClient {
    pub fn new(
        base_url: String,
        api_token: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> NotifierClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .unwrap();

        NotifierClient {
            http_client,
            base_url,
            api_token,
        }
    }

    pub async fn notify(
        &self,
        email: &str,
        outcome: SubscriptionOutcome,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/mail/done", self.base_url);
        let body = OutcomeNotification {
            email,
            status: outcome.as_ref(),
        };

        self.http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_token.expose_secret()),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
