use std::collections::BTreeMap;

use instagram_api::{
    AccountProvider, ApiError, BackupCode, ClientConfig, InstagramClient, LoginOutcome, Session,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> InstagramClient {
    InstagramClient::new(ClientConfig {
        base_url: server.uri(),
        page_size: 2,
        ..ClientConfig::default()
    })
    .unwrap()
}

fn session() -> Session {
    let mut cookies = BTreeMap::new();
    cookies.insert("csrftoken".to_string(), "tok".to_string());
    cookies.insert("sessionid".to_string(), "sess".to_string());
    Session::new("me", cookies)
}

async fn mount_landing_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "csrftoken=tok; Path=/; Secure"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_success_keeps_cookies() {
    let server = MockServer::start().await;
    mount_landing_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/web/accounts/login/ajax/"))
        .and(header("x-csrftoken", "tok"))
        .and(body_string_contains("username=me"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sessionid=sess; Path=/; HttpOnly")
                .set_body_json(serde_json::json!({
                    "authenticated": true,
                    "user": true,
                    "status": "ok"
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.login("me", "hunter2").await {
        LoginOutcome::Success(session) => {
            assert_eq!(session.username, "me");
            assert_eq!(session.cookie("sessionid"), Some("sess"));
            assert_eq!(session.csrf_token(), Some("tok"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = MockServer::start().await;
    mount_landing_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/web/accounts/login/ajax/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "authenticated": false,
            "user": true,
            "status": "ok"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.login("me", "wrong").await,
        LoginOutcome::InvalidCredentials
    ));
}

#[tokio::test]
async fn test_login_without_csrf_cookie_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.login("me", "hunter2").await,
        LoginOutcome::Failure(_)
    ));
}

#[tokio::test]
async fn test_two_factor_with_backup_code() {
    let server = MockServer::start().await;
    mount_landing_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/web/accounts/login/ajax/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "two_factor_required": true,
            "two_factor_info": { "two_factor_identifier": "abc" },
            "status": "fail"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/web/accounts/login/ajax/two_factor/"))
        .and(body_string_contains("verificationCode=12345678"))
        .and(body_string_contains("identifier=abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sessionid=after2fa; Path=/")
                .set_body_json(serde_json::json!({ "authenticated": true, "status": "ok" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let challenge = match client.login("me", "hunter2").await {
        LoginOutcome::NeedsSecondFactor(challenge) => challenge,
        other => panic!("unexpected outcome {other:?}"),
    };
    assert_eq!(challenge.identifier, "abc");

    let code = BackupCode::parse("12345678").unwrap();
    let session = client.submit_backup_code(&challenge, &code).await.unwrap();
    assert_eq!(session.cookie("sessionid"), Some("after2fa"));
    assert_eq!(session.csrf_token(), Some("tok"));
}

#[tokio::test]
async fn test_rejected_backup_code() {
    let server = MockServer::start().await;
    mount_landing_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/web/accounts/login/ajax/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "two_factor_required": true,
            "two_factor_info": { "two_factor_identifier": "abc" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/web/accounts/login/ajax/two_factor/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "Please check the security code and try again."
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let LoginOutcome::NeedsSecondFactor(challenge) = client.login("me", "hunter2").await else {
        panic!("expected a second-factor challenge");
    };
    let code = BackupCode::parse("87654321").unwrap();
    let err = client.submit_backup_code(&challenge, &code).await.unwrap_err();
    assert!(matches!(err, ApiError::TwoFactorRejected { .. }));
}

#[tokio::test]
async fn test_followers_follow_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .and(query_param("username", "me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "user": { "id": "42" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/friendships/42/followers/"))
        .and(query_param("max_id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [{ "username": "carol" }],
            "big_list": false
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/friendships/42/followers/"))
        .and(query_param("count", "2"))
        .and(header("cookie", "csrftoken=tok; sessionid=sess"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [{ "username": "alice" }, { "username": "bob" }],
            "next_max_id": "2",
            "big_list": true
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let followers = client.followers(&session(), "me").await.unwrap();

    let handles: Vec<_> = followers.iter().map(String::as_str).collect();
    assert_eq!(handles, vec!["alice", "bob", "carol"]);
}

#[tokio::test]
async fn test_followers_cursor_cycle_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "user": { "id": "42" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/friendships/42/followers/"))
        .and(query_param("max_id", "A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [{ "username": "bob" }],
            "next_max_id": "B"
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/friendships/42/followers/"))
        .and(query_param("max_id", "B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [{ "username": "carol" }],
            "next_max_id": "A"
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/friendships/42/followers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [{ "username": "alice" }],
            "next_max_id": "A"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        client.followers(&session(), "me"),
    )
    .await
    .expect("follower paging did not terminate");

    assert!(matches!(result, Err(ApiError::CursorLoop { cursor }) if cursor == "A"));
}

#[tokio::test]
async fn test_followers_expired_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "login_required",
            "status": "fail"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.followers(&session(), "me").await.unwrap_err();
    assert!(err.is_login_required());
}

#[tokio::test]
async fn test_followers_unknown_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.followers(&session(), "ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::UserNotFound { username } if username == "ghost"));
}

#[tokio::test]
async fn test_validate_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/current_user/"))
        .and(query_param("edit", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": { "username": "me" },
            "status": "ok"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.validate_session(&session()).await.unwrap();
}

#[tokio::test]
async fn test_validate_session_without_sessionid_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let bare = Session::new("me", BTreeMap::new());
    let err = client.validate_session(&bare).await.unwrap_err();
    assert!(err.is_login_required());
}
