use anyhow::anyhow;
use database::DocumentStore;

use crate::views;

use super::MongoConfig;

pub async fn healthcheck_cmd(mongo_config: MongoConfig) -> anyhow::Result<()> {
    let store = DocumentStore::new(mongo_config.into_store_config()).await?;

    let result = views::check_health(&store)
        .await
        .map_err(|e| anyhow!("healthcheck failed: {e}"));
    store.shutdown().await;
    result?;

    tracing::info!("✅ Healthcheck passed");
    Ok(())
}
