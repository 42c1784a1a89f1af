use crate::error::StoreError;
use crate::model::Consent;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keyed persistence for consents. Writes replace the whole document.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Consent>, StoreError>;

    async fn upsert(&self, consent: &Consent) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryConsentStore {
    consents: RwLock<HashMap<String, Consent>>,
}

impl InMemoryConsentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsentStore for InMemoryConsentStore {
    async fn get(&self, id: &str) -> Result<Option<Consent>, StoreError> {
        Ok(self.consents.read().await.get(id).cloned())
    }

    async fn upsert(&self, consent: &Consent) -> Result<(), StoreError> {
        self.consents
            .write()
            .await
            .insert(consent.id.clone(), consent.clone());
        Ok(())
    }
}
