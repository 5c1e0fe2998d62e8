use config::Config;
use sea_orm_migration::prelude::*;
use std::env;

#[tokio::main]
async fn main() {
    // DATABASE_URL wins; otherwise use the server's config.yaml
    if env::var("DATABASE_URL").is_err() {
        let settings = Config::builder()
            .add_source(config::File::with_name("config.yaml").required(false))
            .build();
        match settings.map(|s| s.get_string("database_url")) {
            Ok(Ok(url)) => env::set_var("DATABASE_URL", url),
            Ok(Err(_)) => eprintln!("config.yaml has no database_url; set DATABASE_URL"),
            Err(e) => eprintln!("Failed to read config.yaml: {e}"),
        }
    }
    cli::run_cli(migration::Migrator).await;
}
