use crate::api::idempotency::IdempotencyStore;
use crate::api::oauth::token_manager::TokenManager;
use crate::api::quote_auto::service::QuoteAutoService;
use crate::clients::ClientRegistry;
use crate::config::MockinConfig;
use crate::mocks;
use crate::resources::ResourceDirectory;
use crate::store::consents::ConsentDocuments;
use crate::store::{DocumentStore, Store};
use crate::webhook::WebhookNotifier;
use consent_engine::{AuthorizationFlow, Clock, ConsentService, SystemClock};
use log::warn;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MockinConfig>,
    pub store: Store,
    pub clock: Arc<dyn Clock>,
    pub clients: Arc<ClientRegistry>,
    pub resources: Arc<ResourceDirectory>,
    pub consents: ConsentService,
    pub flow: AuthorizationFlow,
    pub tokens: TokenManager,
    pub idempotency: IdempotencyStore,
    pub quotes: QuoteAutoService,
}

impl AppState {
    pub fn new(config: MockinConfig, store: Store) -> Result<Self, std::io::Error> {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Builds the state around an explicit clock, so expiry can be driven in tests.
    pub fn with_clock(
        config: MockinConfig,
        store: Store,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, std::io::Error> {
        let clients = Arc::new(ClientRegistry::from_config(&config));
        let webhooks = WebhookNotifier::new(&config.webhook, clients.clone()).map_err(|e| {
            std::io::Error::other(format!("Failed to create webhook client: {}", e))
        })?;

        let max_awaiting = chrono::Duration::from_std(config.max_awaiting_authorisation())
            .unwrap_or(chrono::TimeDelta::MAX);
        let consents = ConsentService::new(
            Arc::new(ConsentDocuments::new(store.clone())),
            clock.clone(),
            max_awaiting,
        )
        .with_namespace(config.consent_namespace.clone());
        let flow = AuthorizationFlow::new(consents.clone(), Arc::new(mocks::users()));

        Ok(Self {
            tokens: TokenManager::new(
                store.clone(),
                config.oauth.token_ttl,
                config.oauth.code_ttl,
                clock.clone(),
            ),
            idempotency: IdempotencyStore::new(store.clone()),
            quotes: QuoteAutoService::new(store.clone(), webhooks, clock.clone()),
            resources: Arc::new(mocks::resources()),
            config: Arc::new(config),
            store,
            clock,
            clients,
            consents,
            flow,
        })
    }

    /// Check if all components are healthy
    pub async fn health_check(&self) -> bool {
        match self.store.health_check().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Store health check failed: {}", e);
                false
            }
        }
    }
}
