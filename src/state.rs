use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, IdeaService, Mailer, SeaOrmAuthService, SeaOrmIdeaService, mailer,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub idea_service: Arc<dyn IdeaService>,
}

impl SharedState {
    /// Connects the store, runs migrations and builds the mail transport the
    /// configuration asks for.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer = mailer::from_config(&config.mailer)?;
        Self::with_mailer(config, mailer).await
    }

    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
            config.general.query_timeout(),
        )
        .await?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
            mailer,
        )) as Arc<dyn AuthService>;

        let idea_service = Arc::new(SeaOrmIdeaService::new(store.clone())) as Arc<dyn IdeaService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
            idea_service,
        })
    }
}
