use std::sync::Arc;

use printdesk_db::checks::pg_repository::PgAutomatedCheckRepository;
use printdesk_db::orders::pg_repository::PgOrderRepository;
use printdesk_db::products::pg_repository::PgProductRepository;
use printdesk_db::sync::pg_repository::PgSyncRepository;
use printdesk_marketplace::{SpApiClient, SpApiConfig};
use printdesk_sync::{
    AlertCheckRunner, MarketplaceSyncer, OrderSynchronizer, ProductReconciler, SyncSettings,
};
use sqlx::PgPool;

use crate::email::client::{ResendClient, ResendConfig};
use crate::error::ApiError;

pub type PgMarketplaceSyncer =
    MarketplaceSyncer<SpApiClient, PgProductRepository, PgOrderRepository, PgSyncRepository>;

/// A dependency that may be unusable because its configuration is missing.
///
/// The server still starts; routes needing the dependency answer 500 with
/// the configuration error until it is fixed.
pub enum Component<T> {
    Ready(Arc<T>),
    Misconfigured(String),
}

impl<T> Clone for Component<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready(inner) => Self::Ready(Arc::clone(inner)),
            Self::Misconfigured(msg) => Self::Misconfigured(msg.clone()),
        }
    }
}

impl<T> Component<T> {
    pub fn get(&self) -> Result<&T, ApiError> {
        match self {
            Self::Ready(inner) => Ok(inner),
            Self::Misconfigured(msg) => Err(ApiError::internal(msg.clone())),
        }
    }
}

/// Marketplace client plus the sync pipeline built on it.
pub struct MarketplaceServices {
    pub client: Arc<SpApiClient>,
    pub syncer: Arc<PgMarketplaceSyncer>,
}

impl MarketplaceServices {
    pub fn new(config: SpApiConfig, settings: SyncSettings, pool: &PgPool) -> Result<Self, String> {
        let client = Arc::new(
            SpApiClient::new(config).map_err(|e| format!("failed to build SP-API client: {e}"))?,
        );

        let products =
            ProductReconciler::new(PgProductRepository::new(pool.clone()), settings.store_retry.clone());
        let orders = OrderSynchronizer::new(
            Arc::clone(&client),
            products,
            PgOrderRepository::new(pool.clone()),
            settings.pacing.between_items,
            settings.store_retry.clone(),
        );
        let syncer = Arc::new(MarketplaceSyncer::new(
            Arc::clone(&client),
            orders,
            PgSyncRepository::new(pool.clone()),
            settings,
        ));

        Ok(Self { client, syncer })
    }

    /// Build from `AMAZON_*` and `SYNC_*` variables.
    pub fn from_env(pool: &PgPool) -> Component<Self> {
        let built = SpApiConfig::from_env()
            .map_err(|e| e.to_string())
            .and_then(|config| {
                let settings = SyncSettings::from_env().map_err(|e| e.to_string())?;
                Self::new(config, settings, pool)
            });

        match built {
            Ok(services) => Component::Ready(Arc::new(services)),
            Err(msg) => {
                tracing::warn!(error = %msg, "marketplace sync disabled");
                Component::Misconfigured(msg)
            }
        }
    }

    pub fn reconciler(&self) -> &ProductReconciler<PgProductRepository> {
        self.syncer.order_synchronizer().products()
    }
}

fn email_from_env() -> Component<ResendClient> {
    let built = ResendConfig::from_env()
        .map_err(|e| e.to_string())
        .and_then(|config| {
            ResendClient::new(config).map_err(|e| format!("failed to build email client: {e}"))
        });

    match built {
        Ok(client) => Component::Ready(Arc::new(client)),
        Err(msg) => {
            tracing::warn!(error = %msg, "alert email disabled");
            Component::Misconfigured(msg)
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub marketplace: Component<MarketplaceServices>,
    pub alert_checks: Arc<AlertCheckRunner<PgAutomatedCheckRepository>>,
    pub email: Component<ResendClient>,
}

impl AppState {
    pub fn from_env(pool: PgPool) -> Self {
        Self {
            marketplace: MarketplaceServices::from_env(&pool),
            alert_checks: Arc::new(AlertCheckRunner::new(PgAutomatedCheckRepository::new(
                pool,
            ))),
            email: email_from_env(),
        }
    }
}
