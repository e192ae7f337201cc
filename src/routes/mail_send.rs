use actix_web::{web, HttpResponse, ResponseError};
use reqwest::StatusCode;
use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::routes::otp::issue_pending_code;
use crate::routes::{error_body, required_field};

#[derive(Deserialize, Debug)]
pub struct SendOtpEmailBody {
    pub email: Option<String>,
}

/// Front-end relay for the subscription form: issues a code and mails it to
/// the user. The code also comes back in the issuance response of
/// `POST /mail/otp`, but a browser user only ever sees the email.
#[tracing::instrument(
    name = "Sending a one-time code by email",
    skip(body, db_pool, email_client),
    fields(email = ?body.email)
)]
pub async fn handle_send_otp_email(
    body: web::Json<SendOtpEmailBody>,
    db_pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, SendOtpEmailError> {
    let raw_email = required_field(&body.email).ok_or(SendOtpEmailError::MissingEmail)?;
    let email = SubscriberEmail::parse(raw_email.to_string())
        .map_err(SendOtpEmailError::InvalidEmail)?;

    let otp = issue_pending_code(email.as_ref(), &db_pool).await?;

    let html_body = format!(
        r#"
            <div style="font-family:sans-serif">
                <h2>Your verification code</h2>
                <p style="font-size:28px;font-weight:bold">{}</p>
                <p>Enter this code within 5 minutes to join the Hatoage Market mailing list.</p>
            </div>
        "#,
        otp.as_ref()
    );

    email_client
        .send_email(email, "Hatoage Market verification code", &html_body)
        .await
        .map_err(|err| {
            if err.is_timeout() {
                SendOtpEmailError::EmailTimeout(err)
            } else {
                SendOtpEmailError::SendEmailError(err)
            }
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}

#[derive(thiserror::Error)]
pub enum SendOtpEmailError {
    #[error("email required")]
    MissingEmail,
    #[error("{0}")]
    InvalidEmail(String),
    #[error("Failed to store the pending one-time code.")]
    StoreError(#[from] sqlx::Error),
    #[error("Failed to send the verification code email.")]
    SendEmailError(#[source] reqwest::Error),
    #[error("Timed out sending the verification code email.")]
    EmailTimeout(#[source] reqwest::Error),
}

impl std::fmt::Debug for SendOtpEmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for SendOtpEmailError {
    fn status_code(&self) -> StatusCode {
        match self {
            SendOtpEmailError::MissingEmail => StatusCode::BAD_REQUEST,
            SendOtpEmailError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            SendOtpEmailError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SendOtpEmailError::SendEmailError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SendOtpEmailError::EmailTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), &self.to_string())
    }
}
