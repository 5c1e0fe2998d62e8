use oauth2_auth::api::start_webserver;
use oauth2_auth::config::{CheckTokenAccess, load_config_or_panic};
use oauth2_auth::oauth2::{OAuth2State, spawn_sweep_task};
use sea_orm::Database;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "oauth2_auth=info,tower_http=info,sea_orm=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    // A missing .env is fine; the real configuration lives in config.yaml.
    let _ = dotenvy::dotenv();

    initialize_tracing();

    let config = load_config_or_panic();

    let db = match config.database_url.as_deref() {
        Some(url) => Some(Arc::new(Database::connect(url).await?)),
        None => None,
    };

    if config.oauth2.check_token_access == CheckTokenAccess::PermitAll {
        tracing::warn!(
            "oauth2.check_token_access is permit_all: anyone can introspect tokens. \
             Use client_authenticated outside of development."
        );
    }
    tracing::info!(
        access_token_lifetime = config.oauth2.access_token_lifetime,
        refresh_token_lifetime = ?config.oauth2.refresh_token_lifetime,
        reuse_refresh_tokens = config.oauth2.reuse_refresh_tokens,
        "oauth2 configuration"
    );

    let state = OAuth2State::from_config(&config, db)?;

    if config.oauth2.sweep_interval > 0 {
        spawn_sweep_task(
            state.tokens.clone(),
            Duration::from_secs(config.oauth2.sweep_interval),
        );
    }

    start_webserver(state, &config.listen_addr).await?;
    Ok(())
}
