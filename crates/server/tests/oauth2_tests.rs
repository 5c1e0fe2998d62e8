//! OAuth2 endpoint tests.
//!
//! Drives the full router through `axum_test::TestServer`.

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use base64::Engine;
use oauth2_auth::{
    api::app,
    config::{AccountConfig, AppConfig, CheckTokenAccess, ClientConfig, OAuth2Config},
    oauth2::{GrantType, OAuth2State},
};
use serde_json::Value;
use url::Url;

const REDIRECT_URI: &str = "https://acme.example/cb";

fn create_test_config(oauth2: OAuth2Config) -> AppConfig {
    AppConfig {
        listen_addr: "127.0.0.1:0".into(),
        database_url: None,
        oauth2,
        clients: vec![
            ClientConfig {
                client_id: "acme".into(),
                secret: Some("acmesecret".into()),
                secret_hash: None,
                grant_types: vec![
                    GrantType::Password,
                    GrantType::AuthorizationCode,
                    GrantType::RefreshToken,
                ],
                scopes: vec!["read".into()],
                redirect_uris: vec![REDIRECT_URI.into()],
            },
            ClientConfig {
                client_id: "other".into(),
                secret: Some("othersecret".into()),
                secret_hash: None,
                grant_types: vec![GrantType::Password],
                scopes: vec!["read".into(), "write".into()],
                redirect_uris: vec![],
            },
        ],
        accounts: vec![
            AccountConfig {
                account_name: "jlong".into(),
                password: Some("password".into()),
                password_hash: None,
                enabled: true,
                authorities: vec!["ROLE_USER".into(), "ROLE_ADMIN".into()],
            },
            AccountConfig {
                account_name: "dsyer".into(),
                password: Some("password".into()),
                password_hash: None,
                enabled: false,
                authorities: vec!["ROLE_USER".into()],
            },
        ],
    }
}

fn create_test_server(oauth2: OAuth2Config) -> TestServer {
    let config = create_test_config(oauth2);
    let state = OAuth2State::from_config(&config, None).expect("build state");
    TestServer::new(app(state)).expect("create test server")
}

fn basic(id: &str, secret: &str) -> HeaderValue {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{id}:{secret}"));
    HeaderValue::from_str(&format!("Basic {encoded}")).expect("header value")
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).expect("header value")
}

async fn password_token(server: &TestServer, client: (&str, &str), scope: &str) -> Value {
    let response = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic(client.0, client.1))
        .form(&[
            ("grant_type", "password"),
            ("username", "jlong"),
            ("password", "password"),
            ("scope", scope),
        ])
        .await;
    response.assert_status_ok();
    response.json()
}

fn location(response: &axum_test::TestResponse) -> Url {
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    Url::parse(location).expect("absolute redirect")
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

// =============================================================================
// Token Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_password_grant_issues_usable_token() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[
            ("grant_type", "password"),
            ("username", "jlong"),
            ("password", "password"),
            ("scope", "read"),
        ])
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["scope"], "read");
    assert!(body["expires_in"].as_i64().unwrap() > 0);
    assert!(body["refresh_token"].is_string());

    let me = server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, bearer(body["access_token"].as_str().unwrap()))
        .await;
    me.assert_status_ok();
    let principal: Value = me.json();
    assert_eq!(principal["account_name"], "jlong");
    assert_eq!(principal["scope"], "read");
    assert_eq!(principal["client_id"], "acme");
    assert_eq!(principal["authorities"][0], "ROLE_ADMIN");
}

#[tokio::test]
async fn test_client_credentials_in_form_body() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "password"),
            ("client_id", "acme"),
            ("client_secret", "acmesecret"),
            ("username", "jlong"),
            ("password", "password"),
        ])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["scope"], "read");
}

#[tokio::test]
async fn test_client_credentials_grant_is_unauthorized_client() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("grant_type", "client_credentials")])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "unauthorized_client");
}

#[tokio::test]
async fn test_unknown_grant_type_is_unsupported() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("grant_type", "implicit")])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn test_bad_client_secret_is_invalid_client() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "wrong"))
        .form(&[
            ("grant_type", "password"),
            ("username", "jlong"),
            ("password", "password"),
        ])
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_some());
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_client");
}

#[tokio::test]
async fn test_owner_failures_are_indistinguishable() {
    let server = create_test_server(OAuth2Config::default());

    let mut bodies = Vec::new();
    for (username, password) in [("jlong", "wrong"), ("nobody", "password"), ("dsyer", "password")]
    {
        let response = server
            .post("/oauth/token")
            .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ])
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        bodies.push(response.json::<Value>());
    }

    for body in &bodies {
        assert_eq!(body["error"], "invalid_grant");
        assert_eq!(body["error_description"], "Bad credentials");
    }
}

#[tokio::test]
async fn test_invalid_scope_is_rejected() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[
            ("grant_type", "password"),
            ("username", "jlong"),
            ("password", "password"),
            ("scope", "write"),
        ])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_scope");
}

#[tokio::test]
async fn test_missing_username_is_invalid_request() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("grant_type", "password"), ("password", "password")])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_client_without_refresh_grant_gets_no_refresh_token() {
    let server = create_test_server(OAuth2Config::default());

    let body = password_token(&server, ("other", "othersecret"), "read write").await;
    assert!(body.get("refresh_token").is_none());
    assert_eq!(body["scope"], "read write");
}

// =============================================================================
// Refresh Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_keeps_refresh_token_by_default() {
    let server = create_test_server(OAuth2Config::default());
    let issued = password_token(&server, ("acme", "acmesecret"), "read").await;
    let refresh_token = issued["refresh_token"].as_str().unwrap();

    for _ in 0..2 {
        let response = server
            .post("/oauth/token")
            .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["refresh_token"], refresh_token);
        assert_ne!(body["access_token"], issued["access_token"]);
        assert_eq!(body["scope"], "read");
    }

    // The first access token is still good.
    server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, bearer(issued["access_token"].as_str().unwrap()))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_refresh_rotation_retires_old_token() {
    let server = create_test_server(OAuth2Config {
        reuse_refresh_tokens: false,
        ..OAuth2Config::default()
    });
    let issued = password_token(&server, ("acme", "acmesecret"), "read").await;
    let old = issued["refresh_token"].as_str().unwrap();

    let response = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("grant_type", "refresh_token"), ("refresh_token", old)])
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_ne!(body["refresh_token"], old);

    let replay = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("grant_type", "refresh_token"), ("refresh_token", old)])
        .await;
    replay.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = replay.json();
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_refresh_grant_needs_client_permission() {
    let server = create_test_server(OAuth2Config::default());
    let issued = password_token(&server, ("acme", "acmesecret"), "read").await;

    let response = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("other", "othersecret"))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", issued["refresh_token"].as_str().unwrap()),
        ])
        .await;

    // "other" is not allowed the refresh_token grant at all.
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "unauthorized_client");
}

// =============================================================================
// Authorization Code Tests
// =============================================================================

#[tokio::test]
async fn test_authorize_requires_owner_credentials() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .get("/oauth/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "acme")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let challenge = response.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Basic"));
}

#[tokio::test]
async fn test_authorize_invalid_client() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .get("/oauth/authorize")
        .add_header(header::AUTHORIZATION, basic("jlong", "password"))
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "nonexistent-client")
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_client");
}

#[tokio::test]
async fn test_authorize_invalid_redirect_uri() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .get("/oauth/authorize")
        .add_header(header::AUTHORIZATION, basic("jlong", "password"))
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "acme")
        .add_query_param("redirect_uri", "http://evil.com/callback")
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_authorize_client_without_registered_redirect_uri() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .get("/oauth/authorize")
        .add_header(header::AUTHORIZATION, basic("jlong", "password"))
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "other")
        .add_query_param("redirect_uri", "http://evil.com/callback")
        .add_query_param("scope", "nope")
        .await;

    // Nothing may be sent to an unregistered redirect URI, not even an error.
    response.assert_status_bad_request();
    assert!(response.headers().get(header::LOCATION).is_none());
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_authorize_bad_scope_is_redirected() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .get("/oauth/authorize")
        .add_header(header::AUTHORIZATION, basic("jlong", "password"))
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "acme")
        .add_query_param("scope", "admin")
        .add_query_param("state", "xyz")
        .await;

    response.assert_status_see_other();
    let url = location(&response);
    assert_eq!(url.host_str(), Some("acme.example"));
    assert_eq!(query_param(&url, "error").as_deref(), Some("invalid_scope"));
    assert_eq!(query_param(&url, "state").as_deref(), Some("xyz"));
}

#[tokio::test]
async fn test_authorization_code_flow() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .get("/oauth/authorize")
        .add_header(header::AUTHORIZATION, basic("jlong", "password"))
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "acme")
        .add_query_param("redirect_uri", REDIRECT_URI)
        .add_query_param("scope", "read")
        .add_query_param("state", "random-state")
        .await;

    response.assert_status_see_other();
    let url = location(&response);
    assert_eq!(query_param(&url, "state").as_deref(), Some("random-state"));
    let code = query_param(&url, "code").expect("code in redirect");

    let exchange = || {
        server
            .post("/oauth/token")
            .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", REDIRECT_URI),
            ])
    };

    let first = exchange().await;
    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["scope"], "read");

    let me = server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, bearer(body["access_token"].as_str().unwrap()))
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["account_name"], "jlong");

    let second = exchange().await;
    second.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = second.json();
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_authorization_code_with_pkce() {
    // RFC 7636 appendix B
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGwSstw-cM";
    let server = create_test_server(OAuth2Config::default());

    let mut codes = Vec::new();
    for _ in 0..2 {
        let response = server
            .get("/oauth/authorize")
            .add_header(header::AUTHORIZATION, basic("jlong", "password"))
            .add_query_param("response_type", "code")
            .add_query_param("client_id", "acme")
            .add_query_param("code_challenge", challenge)
            .add_query_param("code_challenge_method", "S256")
            .await;
        response.assert_status_see_other();
        codes.push(query_param(&location(&response), "code").expect("code"));
    }

    let wrong = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", codes[0].as_str()),
            ("code_verifier", "not-the-verifier"),
        ])
        .await;
    wrong.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(wrong.json::<Value>()["error"], "invalid_grant");

    let right = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", codes[1].as_str()),
            ("code_verifier", verifier),
        ])
        .await;
    right.assert_status_ok();
}

// =============================================================================
// Check Token Tests
// =============================================================================

#[tokio::test]
async fn test_check_token_reports_active_token() {
    let server = create_test_server(OAuth2Config::default());
    let issued = password_token(&server, ("acme", "acmesecret"), "read").await;

    let response = server
        .post("/oauth/check_token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("token", issued["access_token"].as_str().unwrap())])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["active"], true);
    assert_eq!(body["user_name"], "jlong");
    assert_eq!(body["client_id"], "acme");
    assert_eq!(body["scope"], "read");
    assert!(body["exp"].as_i64().is_some());
    assert_eq!(body["authorities"].as_array().unwrap().len(), 2);

    let unknown = server
        .post("/oauth/check_token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("token", "bogus")])
        .await;
    unknown.assert_status_ok();
    let body: Value = unknown.json();
    assert_eq!(body["active"], false);
    assert!(body.get("user_name").is_none());
}

#[tokio::test]
async fn test_check_token_requires_client_by_default() {
    let server = create_test_server(OAuth2Config::default());

    let response = server
        .post("/oauth/check_token")
        .form(&[("token", "whatever")])
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "invalid_client");
}

#[tokio::test]
async fn test_check_token_access_policies() {
    let deny = create_test_server(OAuth2Config {
        check_token_access: CheckTokenAccess::DenyAll,
        ..OAuth2Config::default()
    });
    deny.post("/oauth/check_token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("token", "whatever")])
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let open = create_test_server(OAuth2Config {
        check_token_access: CheckTokenAccess::PermitAll,
        ..OAuth2Config::default()
    });
    let issued = password_token(&open, ("acme", "acmesecret"), "read").await;
    let response = open
        .post("/oauth/check_token")
        .form(&[("token", issued["access_token"].as_str().unwrap())])
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["active"], true);
}

// =============================================================================
// Revocation Tests
// =============================================================================

#[tokio::test]
async fn test_revoked_access_token_stops_working() {
    let server = create_test_server(OAuth2Config::default());
    let issued = password_token(&server, ("acme", "acmesecret"), "read").await;
    let access = issued["access_token"].as_str().unwrap();

    server
        .post("/oauth/revoke")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("token", access)])
        .await
        .assert_status_ok();

    server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, bearer(access))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Revoking again is still a success.
    server
        .post("/oauth/revoke")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[("token", access)])
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_revoking_refresh_token_kills_its_access_tokens() {
    let server = create_test_server(OAuth2Config::default());
    let issued = password_token(&server, ("acme", "acmesecret"), "read").await;

    server
        .post("/oauth/revoke")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[
            ("token", issued["refresh_token"].as_str().unwrap()),
            ("token_type_hint", "refresh_token"),
        ])
        .await
        .assert_status_ok();

    server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, bearer(issued["access_token"].as_str().unwrap()))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let refresh = server
        .post("/oauth/token")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", issued["refresh_token"].as_str().unwrap()),
        ])
        .await;
    refresh.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_revoke_ignores_tokens_of_other_clients() {
    let server = create_test_server(OAuth2Config::default());
    let issued = password_token(&server, ("acme", "acmesecret"), "read").await;
    let access = issued["access_token"].as_str().unwrap();

    server
        .post("/oauth/revoke")
        .add_header(header::AUTHORIZATION, basic("other", "othersecret"))
        .form(&[("token", access)])
        .await
        .assert_status_ok();

    server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, bearer(access))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_revoke_requires_client_authentication() {
    let server = create_test_server(OAuth2Config::default());

    server
        .post("/oauth/revoke")
        .form(&[("token", "whatever")])
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Resource Tests
// =============================================================================

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let server = create_test_server(OAuth2Config {
        access_token_lifetime: 0,
        ..OAuth2Config::default()
    });
    let issued = password_token(&server, ("acme", "acmesecret"), "read").await;
    assert_eq!(issued["expires_in"], 0);

    let response = server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, bearer(issued["access_token"].as_str().unwrap()))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "invalid_token");
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let server = create_test_server(OAuth2Config::default());

    let missing = server.get("/api/me").await;
    missing.assert_status(StatusCode::UNAUTHORIZED);
    assert!(missing.headers().get(header::WWW_AUTHENTICATE).is_some());

    server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, basic("acme", "acmesecret"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_a_bearer_token() {
    let server = create_test_server(OAuth2Config::default());
    let issued = password_token(&server, ("acme", "acmesecret"), "read").await;

    server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, bearer(issued["refresh_token"].as_str().unwrap()))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_read_scope() {
    let server = create_test_server(OAuth2Config::default());
    let issued = password_token(&server, ("other", "othersecret"), "write").await;

    let response = server
        .get("/api/me")
        .add_header(header::AUTHORIZATION, bearer(issued["access_token"].as_str().unwrap()))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"], "insufficient_scope");
}

#[tokio::test]
async fn test_health_and_docs() {
    let server = create_test_server(OAuth2Config::default());

    let health = server.get("/healthz").await;
    health.assert_status_ok();
    health.assert_text("ok");

    server.get("/api-docs").await.assert_status_ok();
}
