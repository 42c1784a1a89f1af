use crate::clock::Clock;
use crate::error::{ConsentError, ValidationError};
use crate::model::{
    Consent, ConsentRequest, ConsentStatus, RejectedBy, Rejection, RejectionReason,
};
use crate::permission::{validate_permissions, Permission};
use crate::scope::consent_id_from_scopes;
use crate::store::ConsentStore;
use chrono::{DateTime, Duration, Months, Utc};
use log::{debug, error, info};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_NAMESPACE: &str = "mockin";

/// Owns the consent aggregate: admission, lazy expiration and every status
/// transition. All reads go through [`ConsentService::fetch`] or its internal
/// counterpart so the expiration policy is always applied first.
#[derive(Clone)]
pub struct ConsentService {
    store: Arc<dyn ConsentStore>,
    clock: Arc<dyn Clock>,
    max_awaiting: Duration,
    namespace: String,
}

impl ConsentService {
    pub fn new(store: Arc<dyn ConsentStore>, clock: Arc<dyn Clock>, max_awaiting: Duration) -> Self {
        Self {
            store,
            clock,
            max_awaiting,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn create(&self, mut request: ConsentRequest) -> Result<Consent, ConsentError> {
        let now = self.clock.now();
        request.permissions = dedup(request.permissions);
        if let Err(err) = validate_request(&request, now) {
            debug!("Rejecting consent request from client {}: {}", request.client_id, err);
            return Err(err.into());
        }

        let consent = Consent {
            id: format!("urn:{}:{}", self.namespace, Uuid::new_v4()),
            status: ConsentStatus::AwaitingAuthorisation,
            owner_tax_id: request.owner_tax_id,
            business_tax_id: request.business_tax_id,
            client_id: request.client_id,
            permissions: request.permissions,
            created_at: now,
            updated_at: now,
            expires_at: request.expires_at,
            rejection: None,
            endorsement_request: request.endorsement_request,
        };
        self.save(&consent).await?;
        info!("Created consent {} for client {}", consent.id, consent.client_id);
        Ok(consent)
    }

    /// Loads a consent on behalf of `client_id`, applying lazy expiration.
    pub async fn fetch(&self, id: &str, client_id: &str) -> Result<Consent, ConsentError> {
        let consent = self.load(id).await?;
        if consent.client_id != client_id {
            debug!("Client {} is not allowed to access consent {}", client_id, id);
            return Err(ConsentError::Forbidden);
        }
        Ok(consent)
    }

    /// Marks an awaiting consent as authorised with the permissions the owner
    /// confirmed. The grant is trusted to be a subset of the validated request.
    pub async fn authorize(
        &self,
        id: &str,
        granted: Vec<Permission>,
    ) -> Result<Consent, ConsentError> {
        let mut consent = self.load(id).await?;
        if let Err(err) = consent.authorize(self.clock.now(), granted) {
            debug!("Cannot authorize consent {} in status {:?}", id, consent.status);
            return Err(err);
        }
        self.save(&consent).await?;
        info!("Authorised consent {}", id);
        Ok(consent)
    }

    pub async fn reject(
        &self,
        id: &str,
        client_id: &str,
        rejection: Rejection,
    ) -> Result<Consent, ConsentError> {
        let mut consent = self.fetch(id, client_id).await?;
        consent.reject(self.clock.now(), rejection)?;
        self.save(&consent).await?;
        info!("Rejected consent {} ({:?})", id, rejection.reason);
        Ok(consent)
    }

    /// Rejects a consent at the owner's request. An authorised consent is
    /// revoked, anything else is rejected.
    pub async fn revoke(&self, id: &str, client_id: &str) -> Result<Consent, ConsentError> {
        let consent = self.fetch(id, client_id).await?;
        let reason = if consent.is_authorised() {
            RejectionReason::CustomerManuallyRevoked
        } else {
            RejectionReason::CustomerManuallyRejected
        };
        self.reject(id, client_id, Rejection::new(RejectedBy::User, reason))
            .await
    }

    /// Consumes an authorised consent and returns it as it was right before
    /// consumption.
    pub async fn fetch_and_consume(&self, id: &str, client_id: &str) -> Result<Consent, ConsentError> {
        let snapshot = self.fetch(id, client_id).await?;
        let mut consent = snapshot.clone();
        consent.consume(self.clock.now())?;
        self.save(&consent).await?;
        info!("Consumed consent {}", id);
        Ok(snapshot)
    }

    pub async fn verify_permissions(
        &self,
        id: &str,
        client_id: &str,
        required: &[Permission],
    ) -> Result<Consent, ConsentError> {
        let consent = self.fetch(id, client_id).await?;
        if !consent.is_authorised() {
            return Err(ConsentError::InvalidStatus(
                "consent is not authorized".to_string(),
            ));
        }
        if !consent.has_permissions(required) {
            debug!("Consent {} lacks one of {:?}", id, required);
            return Err(ConsentError::InvalidPermissions);
        }
        Ok(consent)
    }

    /// Called before a token is issued. A grant bound to a consent is only
    /// allowed once that consent is authorised.
    pub async fn handle_grant(&self, client_id: &str, scopes: &str) -> Result<(), ConsentError> {
        let Some(id) = consent_id_from_scopes(scopes) else {
            return Ok(());
        };
        let consent = self.fetch(id, client_id).await?;
        if !consent.is_authorised() {
            debug!("Refusing grant for consent {} in status {:?}", id, consent.status);
            return Err(ConsentError::InvalidStatus(
                "consent is not authorized".to_string(),
            ));
        }
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Consent, ConsentError> {
        let mut consent = self
            .store
            .get(id)
            .await
            .map_err(|err| {
                error!("Failed to load consent {}: {}", id, err);
                ConsentError::from(err)
            })?
            .ok_or(ConsentError::NotFound)?;

        if consent.apply_expiration_policy(self.clock.now(), self.max_awaiting) {
            debug!("Consent {} expired, now {:?}", id, consent.rejection);
            self.save(&consent).await?;
        }
        Ok(consent)
    }

    async fn save(&self, consent: &Consent) -> Result<(), ConsentError> {
        self.store.upsert(consent).await.map_err(|err| {
            error!("Failed to save consent {}: {}", consent.id, err);
            ConsentError::from(err)
        })
    }
}

/// Drops repeated permissions, keeping the first occurrence of each.
fn dedup(permissions: Vec<Permission>) -> Vec<Permission> {
    let mut unique = Vec::with_capacity(permissions.len());
    for permission in permissions {
        if !unique.contains(&permission) {
            unique.push(permission);
        }
    }
    unique
}

fn validate_request(request: &ConsentRequest, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if request.expires_at < now {
        return Err(ValidationError::ExpirationInPast);
    }
    let max_expiration = now
        .checked_add_months(Months::new(12))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    if request.expires_at > max_expiration {
        return Err(ValidationError::ExpirationTooFar);
    }
    if request.permissions.is_empty() {
        return Err(ValidationError::EmptyPermissions);
    }
    validate_permissions(&request.permissions)?;
    if request.permissions.contains(&Permission::ENDORSEMENT_REQUEST_CREATE)
        && request.endorsement_request.is_none()
    {
        return Err(ValidationError::MissingEndorsementRequest);
    }
    Ok(())
}
