use std::sync::Arc;

use crate::auth::repo::UserStore;
use crate::auth::session::SessionKeys;
use crate::config::AppConfig;
use crate::db::PgStore;
use crate::meals::repo::MealStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: SessionKeys,
    pub users: Arc<dyn UserStore>,
    pub meals: Arc<dyn MealStore>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = PgStore::connect(&config.database_url).await?;
        store.migrate().await?;
        let store = Arc::new(store);
        Ok(Self::from_parts(Arc::new(config), store.clone(), store))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        meals: Arc<dyn MealStore>,
    ) -> Self {
        let keys = SessionKeys::new(&config.jwt);
        Self {
            config,
            keys,
            users,
            meals,
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> (Self, Arc<crate::db::memory::MemoryStore>) {
        let store = Arc::new(crate::db::memory::MemoryStore::default());
        let state = Self::from_parts(
            Arc::new(AppConfig::for_tests()),
            store.clone(),
            store.clone(),
        );
        (state, store)
    }
}
