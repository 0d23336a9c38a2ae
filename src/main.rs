use log::info;
use std::sync::Arc;

use user_purge::config::Config;
use user_purge::data_service::DataService;
use user_purge::db::{ensure_schema, establish_db};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    let db_pool = establish_db(&config.database_url, config.max_connections).await?;
    info!("Database connection established.");

    ensure_schema(&db_pool, &config.plan).await?;
    info!(
        "Cascade order: {} -> {}",
        config.plan.dependents().join(", "),
        config.plan.owner()
    );

    let service = DataService::new(Arc::new(db_pool), config.plan);

    info!("Starting Rocket server...");
    user_purge::build_rocket(service)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket failed: {e}"))?;

    Ok(())
}
