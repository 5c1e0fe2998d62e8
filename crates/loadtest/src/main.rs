use goose::prelude::*;
use serde_json::Value;
use std::env;

struct Credentials {
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
}

impl Credentials {
    fn from_env() -> Self {
        let var = |name: &str, default: &str| env::var(name).unwrap_or_else(|_| default.to_string());
        Self {
            client_id: var("LOADTEST_CLIENT_ID", "acme"),
            client_secret: var("LOADTEST_CLIENT_SECRET", "acmesecret"),
            username: var("LOADTEST_USERNAME", "jlong"),
            password: var("LOADTEST_PASSWORD", "password"),
        }
    }
}

/// Access token obtained by this user, kept between transactions.
struct Session {
    access_token: String,
}

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

async fn password_grant(user: &mut GooseUser) -> TransactionResult {
    let creds = Credentials::from_env();
    let form = [
        ("grant_type", "password"),
        ("client_id", creds.client_id.as_str()),
        ("client_secret", creds.client_secret.as_str()),
        ("username", creds.username.as_str()),
        ("password", creds.password.as_str()),
        ("scope", "read"),
    ];
    let goose = user.post_form("/oauth/token", &form).await?;

    if let Ok(response) = goose.response {
        if let Ok(body) = response.json::<Value>().await {
            if let Some(token) = body["access_token"].as_str() {
                user.set_session_data(Session {
                    access_token: token.to_string(),
                });
            }
        }
    }
    Ok(())
}

async fn get_me(user: &mut GooseUser) -> TransactionResult {
    let Some(token) = user
        .get_session_data::<Session>()
        .map(|s| s.access_token.clone())
    else {
        return password_grant(user).await;
    };

    let request_builder = user
        .get_request_builder(&GooseMethod::Get, "/api/me")?
        .bearer_auth(token);
    let goose_request = GooseRequest::builder()
        .set_request_builder(request_builder)
        .build();
    let _goose_metrics = user.request(goose_request).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    let creds = Credentials::from_env();
    println!(
        "Requesting tokens as {} via client {}",
        creds.username, creds.client_id
    );

    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("PasswordGrant").register_transaction(transaction!(password_grant)),
        )
        .register_scenario(
            scenario!("ProtectedResource")
                .register_transaction(transaction!(password_grant).set_on_start())
                .register_transaction(transaction!(get_me)),
        )
        .execute()
        .await?;

    Ok(())
}
