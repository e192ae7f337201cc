use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::subscriber_email::SubscriberEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Client for the SendGrid-shaped transactional email provider. Every mail the
/// service sends (verification codes, outcome notices) goes through here.
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    api_key: Secret<String>,
}

#[derive(serde::Serialize)]
pub struct SendEmailBody {
    personalizations: Vec<SendGridPersonalization>,
    from: SendGridEmail,
    subject: String,
    content: Vec<SendGridContent>,
}

#[derive(serde::Serialize)]
struct SendGridEmail {
    email: String,
}

#[derive(serde::Serialize)]
struct SendGridPersonalization {
    to: Vec<SendGridEmail>,
}

#[derive(serde::Serialize)]
struct SendGridContent {
    content_type: String,
    value: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> EmailClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .unwrap();

        EmailClient {
            http_client,
            base_url,
            sender,
            api_key,
        }
    }

    pub async fn send_email(
        &self,
        recipient: SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/mail/send", self.base_url);
        let body = SendEmailBody {
            from: SendGridEmail {
                email: String::from(self.sender.as_ref()),
            },
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridEmail {
                    email: String::from(recipient.as_ref()),
                }],
            }],
            subject: String::from(subject),
            content: vec![SendGridContent {
                content_type: String::from("text/html"),
                value: String::from(html_content),
            }],
        };

        self.http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?; // return an error when server response status code is 4xx or 5xx

        Ok(())
    }
}
