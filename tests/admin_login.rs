//! End-to-end tests for the guarded admin login and logout.

use reqwest::header::{HeaderValue, LOCATION, RETRY_AFTER, SET_COOKIE};

mod common;

use common::{start_server, Browser, ADMIN_PASSWORD};

#[tokio::test]
async fn test_forged_csrf_token_is_rejected_before_credentials() {
    let server = start_server(|_| {}).await;
    let mut browser = Browser::new();
    browser.csrf_token(&server).await;

    let res = browser.login(&server, ADMIN_PASSWORD, "forged-token").await;
    assert_eq!(res.status(), 403);
    assert_eq!(
        res.text().await.unwrap(),
        "Invalid security token. Please try again."
    );
    assert_eq!(server.verifier.calls(), 0);
    assert_eq!(server.audit_events(), vec!["csrf_token_invalid"]);
}

#[tokio::test]
async fn test_login_without_session_token_is_rejected() {
    let server = start_server(|_| {}).await;
    let mut browser = Browser::new();

    let res = browser.login(&server, ADMIN_PASSWORD, "anything").await;
    assert_eq!(res.status(), 403);
    assert_eq!(server.verifier.calls(), 0);
}

#[tokio::test]
async fn test_sixth_failed_login_is_rate_limited() {
    let server = start_server(|_| {}).await;
    let mut browser = Browser::new();
    let token = browser.csrf_token(&server).await;

    for _ in 0..5 {
        let res = browser.login(&server, "wrong", &token).await;
        assert_eq!(res.status(), 401);
    }

    let res = browser.login(&server, ADMIN_PASSWORD, &token).await;
    assert_eq!(res.status(), 429);
    assert!(res.headers().contains_key(RETRY_AFTER));
    assert_eq!(
        res.text().await.unwrap(),
        "Too many attempts. Please try again later."
    );
    assert_eq!(server.verifier.calls(), 5);

    let events = server.audit_events();
    assert_eq!(events.len(), 6);
    assert!(events[..5].iter().all(|e| e == "admin_login_failed"));
    assert_eq!(events[5], "login_rate_limit_exceeded");

    // Once the window has passed the oldest attempts no longer count
    server.clock.advance(301);
    let res = browser.login(&server, ADMIN_PASSWORD, &token).await;
    assert_eq!(res.status(), 303);
}

#[tokio::test]
async fn test_successful_login_rotates_session_and_opens_dashboard() {
    let server = start_server(|_| {}).await;
    let mut browser = Browser::new();
    let token = browser.csrf_token(&server).await;
    let before = browser.cookie.clone().unwrap();

    let res = browser.login(&server, ADMIN_PASSWORD, &token).await;
    assert_eq!(res.status(), 303);
    assert_eq!(res.headers()[LOCATION], "/admin/dashboard");
    let after = browser.cookie.clone().unwrap();
    assert_ne!(before, after);

    let res = browser.get(&server.url("/admin/dashboard")).await;
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "admin");
    assert_eq!(body["audit_failures"], 0);

    let records = server.audit_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["event"], "admin_login_success");
    assert_eq!(records[0]["ip"], "127.0.0.1");
    assert_eq!(records[0]["data"]["username"], "admin");

    // The pre-login id no longer grants anything
    let mut stale = Browser::new();
    stale.cookie = Some(before);
    let res = stale.get(&server.url("/admin/dashboard")).await;
    assert_eq!(res.status(), 303);
}

#[tokio::test]
async fn test_dashboard_requires_login() {
    let server = start_server(|_| {}).await;
    let mut browser = Browser::new();

    let res = browser.get(&server.url("/admin/dashboard")).await;
    assert_eq!(res.status(), 303);
    assert_eq!(res.headers()[LOCATION], "/admin/login");
}

#[tokio::test]
async fn test_missing_password_is_bad_request() {
    let server = start_server(|_| {}).await;
    let mut browser = Browser::new();
    let token = browser.csrf_token(&server).await;

    let res = browser.login(&server, "", &token).await;
    assert_eq!(res.status(), 400);
    assert_eq!(server.verifier.calls(), 0);
    assert!(server.audit_events().is_empty());
}

#[tokio::test]
async fn test_logout_requires_token_and_ends_session() {
    let server = start_server(|_| {}).await;
    let mut browser = Browser::new();
    let token = browser.csrf_token(&server).await;
    assert_eq!(browser.login(&server, ADMIN_PASSWORD, &token).await.status(), 303);

    let res = browser.post_form(&server.url("/admin/logout"), &[]).await;
    assert_eq!(res.status(), 403);

    let dashboard: serde_json::Value = browser
        .get(&server.url("/admin/dashboard"))
        .await
        .json()
        .await
        .unwrap();
    let token = dashboard["csrf_token"].as_str().unwrap().to_string();

    let res = browser
        .post_form(&server.url("/admin/logout"), &[("csrf_token", token.as_str())])
        .await;
    assert_eq!(res.status(), 303);
    assert_eq!(res.headers()[LOCATION], "/admin/login");
    assert!(browser.cookie.is_none());

    let res = browser.get(&server.url("/admin/dashboard")).await;
    assert_eq!(res.status(), 303);

    assert_eq!(
        server.audit_events(),
        vec!["admin_login_success", "csrf_token_invalid", "admin_logout"]
    );
}

#[tokio::test]
async fn test_spoofed_forwarding_headers_do_not_reset_the_limit() {
    let server = start_server(|config| {
        config.security.trusted_proxies = vec!["127.0.0.1".to_string()];
    })
    .await;
    let mut browser = Browser::new();
    let token = browser.csrf_token(&server).await;

    // The proxy appends the real client (8.8.4.4) on the right; everything
    // to its left and the Client-IP header are whatever the client sent.
    for i in 0..20u8 {
        let spoofed = format!("9.9.{i}.{}, 8.8.4.4", i + 1);
        browser
            .extra_headers
            .insert("x-forwarded-for", HeaderValue::from_str(&spoofed).unwrap());
        browser.extra_headers.insert(
            "client-ip",
            HeaderValue::from_str(&format!("8.8.{i}.{}", i + 1)).unwrap(),
        );
        let status = browser.login(&server, "wrong", &token).await.status();
        if i < 5 {
            assert_eq!(status, 401, "attempt {i}");
        } else {
            assert_eq!(status, 429, "attempt {i}");
        }
    }
    assert_eq!(server.verifier.calls(), 5);
    assert!(server
        .audit_records()
        .iter()
        .all(|record| record["ip"] == "8.8.4.4"));

    // A different real client behind the same proxy has its own budget
    browser.extra_headers.clear();
    browser
        .extra_headers
        .insert("x-forwarded-for", HeaderValue::from_static("1.1.1.1"));
    assert_eq!(browser.login(&server, "wrong", &token).await.status(), 401);
}

#[tokio::test]
async fn test_public_routes_do_not_start_sessions() {
    let server = start_server(|_| {}).await;
    let mut browser = Browser::new();

    for path in ["/", "/health"] {
        let res = browser.get(&server.url(path)).await;
        assert_eq!(res.status(), 200);
        assert!(res.headers().get(SET_COOKIE).is_none(), "{path} set a cookie");
    }
    assert!(browser.cookie.is_none());

    let res = browser.get(&server.url("/admin/login")).await;
    assert!(res.headers().get(SET_COOKIE).is_some());
    assert!(browser.cookie.is_some());
}
