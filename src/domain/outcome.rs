/// What happened to a verification attempt, as reported to the outcome-email
/// collaborator: `done`, `dup` or `error` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    Subscribed,
    AlreadySubscribed,
    Failed,
}

impl SubscriptionOutcome {
    pub fn parse(status: &str) -> Result<SubscriptionOutcome, String> {
        match status {
            "done" => Ok(SubscriptionOutcome::Subscribed),
            "dup" => Ok(SubscriptionOutcome::AlreadySubscribed),
            "error" => Ok(SubscriptionOutcome::Failed),
            _ => Err(format!("{} is not a valid subscription status", status)),
        }
    }
}

impl AsRef<str> for SubscriptionOutcome {
    fn as_ref(&self) -> &str {
        match self {
            SubscriptionOutcome::Subscribed => "done",
            SubscriptionOutcome::AlreadySubscribed => "dup",
            SubscriptionOutcome::Failed => "error",
        }
    }
}
