use std::sync::Arc;

use usermanage::{
    app, config::AppConfig, db, state::AppState, telemetry, users::repo::PgUserStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let _log_guard = telemetry::init_tracing(&config.log)?;

    let pool = db::connect(&config).await?;
    let state = AppState::from_parts(Arc::new(PgUserStore::new(pool.clone())))?;

    let app = app::build_app(state);
    app::serve_then_close(app, config.bind_addr()?, pool).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
