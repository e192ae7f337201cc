use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::authentication::{validate_bearer_token, ApiToken};
use crate::domain::outcome::SubscriptionOutcome;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::routes::{error_body, required_field};

#[derive(Deserialize, Debug)]
pub struct OutcomeMailBody {
    pub email: Option<String>,
    pub status: Option<String>,
}

/// Turns a verification outcome into the matching confirmation email. Called
/// back by the verifier's notifier over the authenticated channel.
#[tracing::instrument(
    name = "Sending a subscription outcome email",
    skip(request, body, email_client, api_token),
    fields(email = ?body.email, status = ?body.status)
)]
pub async fn handle_outcome_email(
    request: HttpRequest,
    body: web::Json<OutcomeMailBody>,
    email_client: web::Data<EmailClient>,
    api_token: web::Data<ApiToken>,
) -> Result<HttpResponse, OutcomeMailError> {
    validate_bearer_token(&request, &api_token).map_err(|_| OutcomeMailError::Unauthorized)?;

    let raw_email = required_field(&body.email).ok_or(OutcomeMailError::MissingEmail)?;
    let email = SubscriberEmail::parse(raw_email.to_string())
        .map_err(OutcomeMailError::InvalidEmail)?;
    let outcome = required_field(&body.status)
        .and_then(|status| SubscriptionOutcome::parse(status).ok())
        .ok_or(OutcomeMailError::InvalidStatus)?;

    let (subject, message_body) = outcome_email_template(outcome);
    let html_body = format!(
        r#"
            <div style="font-family:sans-serif; line-height: 1.6;">
                <h2>Hatoage Market</h2>
                {}
                <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
                <p style="font-size: 12px; color: #888;">If you did not expect this email, please discard it.</p>
            </div>
        "#,
        message_body
    );

    email_client
        .send_email(email, subject, &html_body)
        .await
        .map_err(|err| {
            if err.is_timeout() {
                OutcomeMailError::EmailTimeout(err)
            } else {
                OutcomeMailError::SendEmailError(err)
            }
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}

fn outcome_email_template(outcome: SubscriptionOutcome) -> (&'static str, &'static str) {
    match outcome {
        SubscriptionOutcome::Subscribed => (
            "Hatoage Market: registration complete",
            r#"
                <p>Thank you for joining the Hatoage Market mailing list!</p>
                <p><strong>Your registration is complete.</strong></p>
                <p>The daily Hatoage picks will land in your inbox every morning at 10:00.</p>
            "#,
        ),
        SubscriptionOutcome::AlreadySubscribed => (
            "Hatoage Market: registration status",
            r#"
                <p>Thank you for using Hatoage Market.</p>
                <p>This address is <strong>already registered, so nothing has changed.</strong></p>
                <p>We hope you keep enjoying the daily Hatoage picks.</p>
            "#,
        ),
        SubscriptionOutcome::Failed => (
            "Hatoage Market: registration error",
            r#"
                <div style="color: #d32f2f; border: 1px solid #d32f2f; padding: 10px;">
                    <p>Something went wrong while processing your registration.</p>
                    <p><strong>Please try again from the start.</strong></p>
                    <p style="font-size: 0.9em; margin-top: 15px; color: #666;">
                        If the error keeps happening, please contact support.
                    </p>
                </div>
            "#,
        ),
    }
}

#[derive(thiserror::Error)]
pub enum OutcomeMailError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("email required")]
    MissingEmail,
    #[error("{0}")]
    InvalidEmail(String),
    #[error("Invalid status")]
    InvalidStatus,
    #[error("Failed to send the outcome email.")]
    SendEmailError(#[source] reqwest::Error),
    #[error("Timed out sending the outcome email.")]
    EmailTimeout(#[source] reqwest::Error),
}

impl std::fmt::Debug for OutcomeMailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for OutcomeMailError {
    fn status_code(&self) -> StatusCode {
        match self {
            OutcomeMailError::Unauthorized => StatusCode::UNAUTHORIZED,
            OutcomeMailError::MissingEmail => StatusCode::BAD_REQUEST,
            OutcomeMailError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            OutcomeMailError::InvalidStatus => StatusCode::BAD_REQUEST,
            OutcomeMailError::SendEmailError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OutcomeMailError::EmailTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), &self.to_string())
    }
}
