use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use reqwest::StatusCode;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::authentication::{validate_bearer_token, ApiToken};
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::routes::error_body;

/// Internal listing used by the daily bulk-mail job. Requires the shared
/// bearer credential.
#[tracing::instrument(name = "Listing confirmed subscribers", skip(request, db_pool, api_token))]
pub async fn handle_list_subscribers(
    request: HttpRequest,
    db_pool: web::Data<PgPool>,
    api_token: web::Data<ApiToken>,
) -> Result<HttpResponse, ListSubscribersError> {
    validate_bearer_token(&request, &api_token)
        .map_err(|_| ListSubscribersError::Unauthorized)?;

    let subscribers = get_subscribers(&db_pool).await?;

    Ok(HttpResponse::Ok().json(subscribers))
}

pub async fn get_subscribers(db_pool: &PgPool) -> Result<Vec<Subscriber>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT email, created_at
        FROM subscribers
        ORDER BY created_at DESC
        "#,
    )
    .map(|row: PgRow| Subscriber {
        email: SubscriberEmail::parse(row.get("email")).unwrap(),
        created_at: row.get("created_at"),
    })
    .fetch_all(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

#[derive(thiserror::Error)]
pub enum ListSubscribersError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("Failed to get subscribers from the database.")]
    StoreError(#[from] sqlx::Error),
}

impl std::fmt::Debug for ListSubscribersError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for ListSubscribersError {
    fn status_code(&self) -> StatusCode {
        match self {
            ListSubscribersError::Unauthorized => StatusCode::UNAUTHORIZED,
            ListSubscribersError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), &self.to_string())
    }
}
