use super::{DocumentStore, Store};
use async_trait::async_trait;
use consent_engine::{Consent, ConsentStore, StoreError as ConsentStoreError};

/// Consent persistence on top of the shared document store, one document per
/// consent under `consent:{id}`. Consents are written without expiry; a
/// rejected consent stays readable.
#[derive(Clone)]
pub struct ConsentDocuments {
    store: Store,
}

impl ConsentDocuments {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    fn key(id: &str) -> String {
        format!("consent:{}", id)
    }
}

#[async_trait]
impl ConsentStore for ConsentDocuments {
    async fn get(&self, id: &str) -> Result<Option<Consent>, ConsentStoreError> {
        self.store
            .get(&Self::key(id))
            .await
            .map_err(|err| ConsentStoreError(err.to_string()))
    }

    async fn upsert(&self, consent: &Consent) -> Result<(), ConsentStoreError> {
        self.store
            .set_persistent(&Self::key(&consent.id), consent)
            .await
            .map_err(|err| ConsentStoreError(err.to_string()))
    }
}
