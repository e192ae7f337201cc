use actix_web::HttpRequest;
use secrecy::{ExposeSecret, Secret};

/// The shared credential the internal endpoints expect as `Bearer <token>`.
pub struct ApiToken(pub Secret<String>);

#[derive(thiserror::Error, Debug)]
#[error("unauthorized")]
pub struct BearerAuthError;

pub fn validate_bearer_token(
    request: &HttpRequest,
    api_token: &ApiToken,
) -> Result<(), BearerAuthError> {
    let header_value = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok());
    let expected = format!("Bearer {}", api_token.0.expose_secret());

    match header_value {
        Some(value) if value == expected => Ok(()),
        _ => Err(BearerAuthError),
    }
}
