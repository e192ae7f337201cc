use actix_web::{web, HttpResponse, ResponseError};
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::outcome::SubscriptionOutcome;
use crate::notifier::NotifierClient;
use crate::routes::{error_body, required_field};

#[derive(Deserialize, Debug)]
pub struct VerifyOtpBody {
    pub email: Option<String>,
    pub otp: Option<String>,
}

/// OTP verification endpoint. A matching, unexpired code promotes the email to
/// a confirmed subscriber; the outcome (including failure) is reported to the
/// notification collaborator before the response is returned.
#[tracing::instrument(
    name = "Verifying a one-time code",
    skip(body, db_pool, notifier),
    fields(email = ?body.email)
)]
pub async fn handle_verify_otp(
    body: web::Json<VerifyOtpBody>,
    db_pool: web::Data<PgPool>,
    notifier: web::Data<NotifierClient>,
) -> Result<HttpResponse, VerifyOtpError> {
    let email = required_field(&body.email).ok_or(VerifyOtpError::MissingFields)?;
    let otp = required_field(&body.otp).ok_or(VerifyOtpError::MissingFields)?;

    let consumed = consume_pending_code(email, otp, &db_pool).await?;

    if !consumed {
        notify_outcome(&notifier, email, SubscriptionOutcome::Failed).await;
        return Err(VerifyOtpError::InvalidOtp);
    }

    let inserted = insert_subscriber(email, &db_pool).await?;
    let outcome = if inserted {
        SubscriptionOutcome::Subscribed
    } else {
        SubscriptionOutcome::AlreadySubscribed
    };

    notify_outcome(&notifier, email, outcome).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "status": outcome.as_ref()
    })))
}

/// The delete is also the lookup: the affected-row count says whether a live
/// code matched, and a matching code is consumed in the same statement, so two
/// concurrent submissions of the same pair can never both succeed.
#[tracing::instrument(name = "Consuming a pending one-time code", skip(otp, db_pool))]
async fn consume_pending_code(
    email: &str,
    otp: &str,
    db_pool: &PgPool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM otp_codes
        WHERE email = $1 AND otp = $2 AND expires_at > $3
        "#,
    )
    .bind(email)
    .bind(otp)
    .bind(Utc::now())
    .execute(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })?;

    Ok(result.rows_affected() > 0)
}

/// Insert-if-absent; returns whether a row was actually created, which decides
/// between the `done` and `dup` outcomes.
#[tracing::instrument(name = "Inserting a confirmed subscriber", skip(db_pool))]
async fn insert_subscriber(email: &str, db_pool: &PgPool) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO subscribers (email)
        VALUES ($1)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(email)
    .execute(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })?;

    Ok(result.rows_affected() > 0)
}

async fn notify_outcome(notifier: &NotifierClient, email: &str, outcome: SubscriptionOutcome) {
    // Never bubbles up: the verification result stands even when the outcome
    // email could not be queued.
    if let Err(err) = notifier.notify(email, outcome).await {
        tracing::error!(
            "Failed to notify the {} outcome for {}: {:?}",
            outcome.as_ref(),
            email,
            err
        );
    }
}

#[derive(thiserror::Error)]
pub enum VerifyOtpError {
    #[error("email and otp required")]
    MissingFields,
    #[error("invalid or expired otp")]
    InvalidOtp,
    #[error("Failed to update the subscription state.")]
    StoreError(#[from] sqlx::Error),
}

impl std::fmt::Debug for VerifyOtpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for VerifyOtpError {
    fn status_code(&self) -> StatusCode {
        match self {
            VerifyOtpError::MissingFields => StatusCode::BAD_REQUEST,
            VerifyOtpError::InvalidOtp => StatusCode::UNAUTHORIZED,
            VerifyOtpError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), &self.to_string())
    }
}
