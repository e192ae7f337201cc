use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{extract_otp, TestApp};

#[tokio::test]
async fn send_returns_400_when_the_email_is_missing_or_invalid() {
    let test_app = TestApp::spawn_app().await;

    // This is a common practice and it is called table-driven tests. In this case, it simulates different kind of possible request bodies
    // where API should return 400.
    let test_cases = vec![
        (serde_json::json!({}), "missing email parameter"),
        (serde_json::json!({ "email": "" }), "empty email parameter"),
        (
            serde_json::json!({ "email": "hatoage.example" }),
            "invalid email parameter",
        ),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_send_otp_email(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn send_delivers_the_stored_code_by_email() {
    let test_app = TestApp::spawn_app().await;
    let email = "pigeon@hatoage.example";

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.email_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mail/done"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&test_app.notify_server)
        .await;

    let response = test_app
        .post_send_otp_email(serde_json::json!({ "email": email }))
        .await;

    assert_eq!(200, response.status().as_u16());

    // The code the user received must be the code the store will accept
    let received_requests = &test_app.email_server.received_requests().await.unwrap();
    let otp = extract_otp(&received_requests[0]);

    let verification = test_app
        .post_verify_otp(serde_json::json!({ "email": email, "otp": otp }))
        .await;

    assert_eq!(200, verification.status().as_u16());
}

#[tokio::test]
async fn send_returns_500_when_the_email_provider_fails() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/mail/send"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    let response = test_app
        .post_send_otp_email(serde_json::json!({ "email": "pigeon@hatoage.example" }))
        .await;

    assert_eq!(500, response.status().as_u16());
}
