use crate::error::ConsentError;
use crate::permission::Permission;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStatus {
    AwaitingAuthorisation,
    Authorised,
    Rejected,
    Consumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectedBy {
    User,
    Aspsp,
    Tpp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    ConsentExpired,
    CustomerManuallyRejected,
    CustomerManuallyRevoked,
    ConsentMaxDateReached,
    ConsentTechnicalIssue,
    InternalSecurityReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub rejected_by: RejectedBy,
    pub reason: RejectionReason,
}

impl Rejection {
    pub fn new(rejected_by: RejectedBy, reason: RejectionReason) -> Self {
        Self {
            rejected_by,
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndorsementType {
    Alteracao,
    Cancelamento,
    Inclusao,
    Exclusao,
}

/// Endorsement the owner agrees to when granting `ENDORSEMENT_REQUEST_CREATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementRequest {
    pub policy_number: String,
    pub endorsement_type: EndorsementType,
    pub description: String,
}

/// Input of `ConsentService::create`.
#[derive(Debug, Clone)]
pub struct ConsentRequest {
    pub client_id: String,
    pub owner_tax_id: String,
    pub business_tax_id: Option<String>,
    pub permissions: Vec<Permission>,
    pub expires_at: DateTime<Utc>,
    pub endorsement_request: Option<EndorsementRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consent {
    pub id: String,
    pub status: ConsentStatus,
    pub owner_tax_id: String,
    pub business_tax_id: Option<String>,
    pub client_id: String,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub rejection: Option<Rejection>,
    pub endorsement_request: Option<EndorsementRequest>,
}

impl Consent {
    pub fn is_authorised(&self) -> bool {
        self.status == ConsentStatus::Authorised
    }

    pub fn has_permissions(&self, required: &[Permission]) -> bool {
        required.iter().all(|p| self.permissions.contains(p))
    }

    /// Applies the time-driven transitions and reports whether anything changed.
    ///
    /// A consent left waiting longer than `max_awaiting` is rejected on behalf
    /// of the user, and an authorised consent past its expiration date is
    /// rejected on behalf of the institution. Calling it again is a no-op.
    pub fn apply_expiration_policy(&mut self, now: DateTime<Utc>, max_awaiting: Duration) -> bool {
        match self.status {
            ConsentStatus::AwaitingAuthorisation if now > self.created_at + max_awaiting => {
                self.set_rejected(
                    now,
                    Rejection::new(RejectedBy::User, RejectionReason::ConsentExpired),
                );
                true
            }
            ConsentStatus::Authorised if now > self.expires_at => {
                self.set_rejected(
                    now,
                    Rejection::new(RejectedBy::Aspsp, RejectionReason::ConsentMaxDateReached),
                );
                true
            }
            _ => false,
        }
    }

    pub fn authorize(
        &mut self,
        now: DateTime<Utc>,
        granted: Vec<Permission>,
    ) -> Result<(), ConsentError> {
        if self.status != ConsentStatus::AwaitingAuthorisation {
            return Err(ConsentError::InvalidStatus("invalid consent status".to_string()));
        }
        if granted.is_empty() {
            return Err(ConsentError::InvalidOperation(
                "cannot authorize a consent without permissions".to_string(),
            ));
        }
        self.status = ConsentStatus::Authorised;
        self.permissions = granted;
        self.updated_at = now;
        Ok(())
    }

    pub fn reject(&mut self, now: DateTime<Utc>, rejection: Rejection) -> Result<(), ConsentError> {
        match self.status {
            ConsentStatus::Rejected => Err(ConsentError::InvalidOperation(
                "the consent is already rejected".to_string(),
            )),
            ConsentStatus::Consumed => Err(ConsentError::InvalidOperation(
                "cannot reject a consumed consent".to_string(),
            )),
            _ => {
                self.set_rejected(now, rejection);
                Ok(())
            }
        }
    }

    pub fn consume(&mut self, now: DateTime<Utc>) -> Result<(), ConsentError> {
        if self.status != ConsentStatus::Authorised {
            return Err(ConsentError::InvalidOperation(
                "cannot consume a consent that is not authorized".to_string(),
            ));
        }
        self.status = ConsentStatus::Consumed;
        self.updated_at = now;
        Ok(())
    }

    fn set_rejected(&mut self, now: DateTime<Utc>, rejection: Rejection) {
        self.status = ConsentStatus::Rejected;
        self.rejection = Some(rejection);
        self.updated_at = now;
    }
}
