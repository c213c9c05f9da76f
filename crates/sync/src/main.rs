use std::sync::Arc;

use anyhow::Context;
use killstreaks_core::StaticMedalCatalog;
use killstreaks_infra::db;
use killstreaks_infra::{SqliteAchievementStore, SqliteSessionStore};
use killstreaks_sync::{RemoteClient, SyncConfig, SyncEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    killstreaks_observability::init();

    let config = SyncConfig::from_env().context("loading sync configuration")?;
    let pool = db::open(&config.db)
        .await
        .context("opening achievements database")?;

    // Uploads only need raw rows, so no medal catalog is required here.
    let store = Arc::new(SqliteAchievementStore::new(
        pool.clone(),
        Arc::new(StaticMedalCatalog::default()),
    ));
    let session = Arc::new(SqliteSessionStore::new(pool));
    let client = RemoteClient::new(config.clone()).context("building HTTP client")?;

    let engine = SyncEngine::new(client, store, session);
    let client_uuid = engine.ensure_client_uuid_exists().await?;
    tracing::info!(%client_uuid, base_url = %config.base_url, "sync starting");

    let (queue, worker) = engine.clone().spawn_worker();
    if !engine.sync_if_logged_in(&queue).await? {
        tracing::info!(signup_url = %config.signup_url(), "not logged in, nothing to sync");
    }
    drop(queue);

    let stats = worker.shutdown().await;
    if stats.jobs_failed > 0 {
        tracing::warn!(failed = stats.jobs_failed, "sync did not complete; see errors above");
    }

    Ok(())
}
