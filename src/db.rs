use std::sync::Arc;

use sqlx::MySqlPool;
use tracing::info;

use crate::config::{Config, StoreKind};
use crate::error::AppResult;
use crate::store::{MemoryStore, MySqlStore, Store};

pub async fn init_db(database_url: &str) -> AppResult<MySqlPool> {
    let pool = MySqlPool::connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Builds the configured store backend.
pub async fn init_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match (config.store, &config.database_url) {
        (StoreKind::MySql, Some(url)) => {
            let pool = init_db(url).await?;
            info!("Connected to MySQL, migrations applied");
            Ok(Arc::new(MySqlStore::new(pool)))
        }
        (StoreKind::MySql, None) => anyhow::bail!("DATABASE_URL must be set when STORE=mysql"),
        (StoreKind::Memory, _) => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
