use std::sync::Arc;

use sqlx::PgPool;

use super::{config::Config, database::init_postgres};

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let pool = init_postgres(&config).await;

        Arc::new(Self { config, pool })
    }
}
