use chrono::{DateTime, Utc};

use crate::domain::subscriber_email::SubscriberEmail;

#[derive(Debug, serde::Serialize)]
pub struct Subscriber {
    pub email: SubscriberEmail,
    pub created_at: DateTime<Utc>,
}
