//! Application wiring.

use axum::{http::HeaderName, Router};
use dianping_cache::{CacheClient, CacheStore, MemoryCacheStore, RedisCacheStore};
use dianping_config::AppConfig;
use dianping_core::{DianpingError, DianpingResult, HealthCheck};
use dianping_repository::{
    create_pool, MySqlShopRepository, MySqlShopTypeRepository, ShopRepository, ShopTypeRepository,
};
use dianping_rest::{create_router, AppState};
use dianping_service::{SessionServiceImpl, ShopServiceImpl, ShopTypeServiceImpl};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Storage backends the services run on.
pub struct Components {
    pub shop_repository: Arc<dyn ShopRepository>,
    pub shop_type_repository: Arc<dyn ShopTypeRepository>,
    pub cache_store: Arc<dyn CacheStore>,
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
}

impl Components {
    /// Connects to MySQL and, if enabled, Redis.
    ///
    /// With Redis disabled the cache runs on a process-local store.
    pub async fn connect(config: &AppConfig) -> DianpingResult<Self> {
        let db_pool = create_pool(&config.database).await?;
        if config.database.run_migrations {
            db_pool.run_migrations().await?;
        }

        let mut health_checks: Vec<Arc<dyn HealthCheck>> = Vec::new();
        health_checks.push(db_pool.clone());

        let cache_store: Arc<dyn CacheStore> = if config.redis.enabled {
            let redis_pool = dianping_cache::create_pool(&config.redis).await?;
            let store = Arc::new(RedisCacheStore::new(redis_pool));
            health_checks.push(store.clone());
            store
        } else {
            warn!("Redis disabled; cache entries live in this process only");
            let store = Arc::new(MemoryCacheStore::new());
            health_checks.push(store.clone());
            store
        };

        Ok(Self {
            shop_repository: Arc::new(MySqlShopRepository::new(db_pool.clone())),
            shop_type_repository: Arc::new(MySqlShopTypeRepository::new(db_pool)),
            cache_store,
            health_checks,
        })
    }
}

/// The assembled server.
pub struct Application {
    config: AppConfig,
    router: Router,
    cache: CacheClient,
}

impl Application {
    /// Builds the cache client, services and router.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        config: AppConfig,
        components: Components,
        metrics: Option<PrometheusHandle>,
    ) -> DianpingResult<Self> {
        let token_header = HeaderName::from_bytes(config.session.token_header.as_bytes())
            .map_err(|e| {
                DianpingError::Configuration(format!(
                    "Invalid session token header '{}': {}",
                    config.session.token_header, e
                ))
            })?;

        let cache = CacheClient::from_config(components.cache_store, &config.cache, &config.rebuild);

        let shop_service = Arc::new(ShopServiceImpl::from_config(
            components.shop_repository,
            cache.clone(),
            &config.cache,
        ));
        let shop_type_service = Arc::new(ShopTypeServiceImpl::new(
            components.shop_type_repository,
            cache.clone(),
            config.cache.shop_type_ttl(),
        ));
        let session_service = Arc::new(SessionServiceImpl::new(cache.clone(), config.session.ttl()));

        let mut state = AppState::new(
            shop_service,
            shop_type_service,
            session_service,
            token_header,
            config.cache.logical_lease(),
        );
        for check in components.health_checks {
            state = state.with_health_check(check);
        }
        if let Some(handle) = metrics {
            state = state.with_metrics(handle);
        }

        let router = create_router(state, &config.server, &config.observability);

        Ok(Self {
            config,
            router,
            cache,
        })
    }

    /// The HTTP router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The shared cache client.
    pub fn cache(&self) -> &CacheClient {
        &self.cache
    }

    /// Serves HTTP until `shutdown` resolves, then stops the rebuild scheduler.
    pub async fn serve<F>(self, shutdown: F) -> DianpingResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let rest_addr = self.config.server.rest_addr();
        let listener = TcpListener::bind(&rest_addr)
            .await
            .map_err(|e| DianpingError::Internal(format!("Failed to bind REST: {}", e)))?;
        info!("Starting REST server on http://{}", rest_addr);

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await;

        self.cache.scheduler().shutdown();
        let stats = self.cache.scheduler().stats();
        info!(
            completed = stats.tasks_completed,
            failed = stats.tasks_failed,
            "Rebuild scheduler stopped"
        );

        result.map_err(|e| DianpingError::Internal(format!("REST server error: {}", e)))
    }
}
