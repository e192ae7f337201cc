mod health_check;
mod mail_done;
mod mail_send;
mod otp;
mod subscribers;
mod verify;

pub use health_check::*;
pub use mail_done::*;
pub use mail_send::*;
pub use otp::*;
pub use subscribers::*;
pub use verify::*;

use actix_web::HttpResponse;
use reqwest::StatusCode;

// Every taxonomy error answers with the same `{error, message}` body shape.
pub(crate) fn error_body(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": message,
        "message": message
    }))
}

pub(crate) fn required_field(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}
