use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

#[tokio::test]
async fn verify_returns_400_when_fields_are_missing() {
    let test_app = TestApp::spawn_app().await;

    // This is a common practice and it is called table-driven tests. In this case, it simulates different kind of possible request bodies
    // where API should return 400.
    let test_cases = vec![
        (serde_json::json!({}), "missing body parameters"),
        (
            serde_json::json!({ "email": "pigeon@hatoage.example" }),
            "missing otp parameter",
        ),
        (
            serde_json::json!({ "otp": "123456" }),
            "missing email parameter",
        ),
        (
            serde_json::json!({ "email": "pigeon@hatoage.example", "otp": "" }),
            "empty otp parameter",
        ),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_verify_otp(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn first_verification_subscribes_the_email() {
    let test_app = TestApp::spawn_app().await;
    let email = "pigeon@hatoage.example";

    Mock::given(method("POST"))
        .and(path("/mail/done"))
        .and(body_partial_json(serde_json::json!({
            "email": email,
            "status": "done"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.notify_server)
        .await;

    let otp = test_app.issue_otp_for(email).await;
    let response = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": otp }))
        .await;

    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse the body.");

    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], "done");
    assert_eq!(test_app.count_subscribers(email).await, 1);
}

#[tokio::test]
async fn a_consumed_code_cannot_be_verified_twice() {
    let test_app = TestApp::spawn_app().await;
    let email = "pigeon@hatoage.example";

    Mock::given(method("POST"))
        .and(path("/mail/done"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&test_app.notify_server)
        .await;

    let otp = test_app.issue_otp_for(email).await;

    let first = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": otp }))
        .await;
    let second = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": otp }))
        .await;

    assert_eq!(200, first.status().as_u16());
    assert_eq!(401, second.status().as_u16());
}

#[tokio::test]
async fn verification_at_the_expiry_instant_fails_with_401() {
    let test_app = TestApp::spawn_app().await;
    let email = "pigeon@hatoage.example";

    Mock::given(method("POST"))
        .and(path("/mail/done"))
        .and(body_partial_json(serde_json::json!({ "status": "error" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.notify_server)
        .await;

    let otp = test_app.issue_otp_for(email).await;

    test_app.expire_pending_code(email).await;

    let response = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": otp }))
        .await;

    assert_eq!(401, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse the body.");

    assert_eq!(body["error"], "invalid or expired otp");
    assert_eq!(test_app.count_subscribers(email).await, 0);
}

#[tokio::test]
async fn reverifying_a_subscribed_email_reports_dup_without_a_duplicate_row() {
    let test_app = TestApp::spawn_app().await;
    let email = "pigeon@hatoage.example";

    Mock::given(method("POST"))
        .and(path("/mail/done"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&test_app.notify_server)
        .await;

    let first_otp = test_app.issue_otp_for(email).await;
    let first = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": first_otp }))
        .await;
    let first_body: serde_json::Value = first.json().await.expect("Failed to parse the body.");

    let second_otp = test_app.issue_otp_for(email).await;
    let second = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": second_otp }))
        .await;
    let second_body: serde_json::Value = second.json().await.expect("Failed to parse the body.");

    assert_eq!(first_body["status"], "done");
    assert_eq!(second_body["status"], "dup");
    assert_eq!(test_app.count_subscribers(email).await, 1);

    // The consumed first code stays dead
    let replay = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": first_otp }))
        .await;

    assert_eq!(401, replay.status().as_u16());
}

#[tokio::test]
async fn failed_verification_notifies_the_error_outcome() {
    let test_app = TestApp::spawn_app().await;
    let email = "dove@hatoage.example";

    Mock::given(method("POST"))
        .and(path("/mail/done"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "email": email,
            "status": "error"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.notify_server)
        .await;

    // No code was ever issued for this address
    let response = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": "000000" }))
        .await;

    assert_eq!(401, response.status().as_u16());
    assert_eq!(test_app.count_subscribers(email).await, 0);
}

#[tokio::test]
async fn notification_carries_the_shared_bearer_token() {
    let test_app = TestApp::spawn_app().await;
    let email = "pigeon@hatoage.example";

    Mock::given(method("POST"))
        .and(path("/mail/done"))
        .and(header(
            "Authorization",
            format!("Bearer {}", test_app.api_token()).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.notify_server)
        .await;

    let otp = test_app.issue_otp_for(email).await;
    let response = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": otp }))
        .await;

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn a_failed_verification_leaves_unrelated_emails_untouched() {
    let test_app = TestApp::spawn_app().await;
    let email = "dove@hatoage.example";
    let unrelated = "pigeon@hatoage.example";

    Mock::given(method("POST"))
        .and(path("/mail/done"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&test_app.notify_server)
        .await;

    let unrelated_otp = test_app.issue_otp_for(unrelated).await;

    let failed = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": "000000" }))
        .await;

    assert_eq!(401, failed.status().as_u16());

    // The other address' pending code survived the failure
    let response = test_app
        .post_verify_otp(serde_json::json!({ "email": unrelated, "otp": unrelated_otp }))
        .await;

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn verification_succeeds_even_if_the_notifier_is_down() {
    let test_app = TestApp::spawn_app().await;
    let email = "pigeon@hatoage.example";

    Mock::given(method("POST"))
        .and(path("/mail/done"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.notify_server)
        .await;

    let otp = test_app.issue_otp_for(email).await;
    let response = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": otp }))
        .await;

    // The outcome email is best-effort; the subscription result stands
    assert_eq!(200, response.status().as_u16());
    assert_eq!(test_app.count_subscribers(email).await, 1);
}
