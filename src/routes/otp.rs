use actix_web::{web, HttpResponse, ResponseError};
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::otp_code::OtpCode;
use crate::routes::{error_body, required_field};

pub const OTP_VALIDITY_MINUTES: i64 = 5;

#[derive(Deserialize, Debug)]
pub struct IssueOtpBody {
    pub email: Option<String>,
}

/// OTP issuance endpoint. Returns the generated code to the caller; delivering
/// it to the user is the front-end relay's job (see `handle_send_otp_email`).
#[tracing::instrument(
    name = "Issuing a one-time code",
    skip(body, db_pool),
    fields(email = ?body.email)
)]
pub async fn handle_issue_otp(
    body: web::Json<IssueOtpBody>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, IssueOtpError> {
    let email = required_field(&body.email).ok_or(IssueOtpError::MissingEmail)?;

    let otp = issue_pending_code(email, &db_pool).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "otp": otp.as_ref()
    })))
}

/// Generates a fresh code and upserts it with a new expiry. A pending code for
/// the same email is silently overwritten: only the newest code is ever valid.
#[tracing::instrument(name = "Storing a pending one-time code", skip(db_pool))]
pub async fn issue_pending_code(email: &str, db_pool: &PgPool) -> Result<OtpCode, sqlx::Error> {
    let otp = OtpCode::generate();
    let expires_at = Utc::now() + Duration::minutes(OTP_VALIDITY_MINUTES);

    sqlx::query(
        r#"
        INSERT INTO otp_codes (email, otp, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET otp = EXCLUDED.otp, expires_at = EXCLUDED.expires_at
        "#,
    )
    .bind(email)
    .bind(otp.as_ref())
    .bind(expires_at)
    .execute(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })?;

    Ok(otp)
}

#[derive(thiserror::Error)]
pub enum IssueOtpError {
    #[error("email required")]
    MissingEmail,
    #[error("Failed to store the pending one-time code.")]
    StoreError(#[from] sqlx::Error),
}

impl std::fmt::Debug for IssueOtpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for IssueOtpError {
    fn status_code(&self) -> StatusCode {
        match self {
            IssueOtpError::MissingEmail => StatusCode::BAD_REQUEST,
            IssueOtpError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), &self.to_string())
    }
}
