//! The interactive authorization flow a resource owner goes through to grant
//! a consent: `Setup -> Login -> Consent -> Finish`.
//!
//! The flow is resumed once per HTTP round-trip. The session records the
//! current step and is persisted by the caller between calls; each call
//! re-enters at the recorded step and runs forward until a step either needs
//! user input (suspend) or the flow ends.

use crate::model::{ConsentStatus, RejectedBy, Rejection, RejectionReason};
use crate::permission::Permission;
use crate::scope::consent_id_from_scopes;
use crate::service::ConsentService;
use crate::user::UserDirectory;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Authentication context reference set on every completed flow.
pub const ACR_LOA2: &str = "urn:brasil:openinsurance:loa2";

const ACCEPTED: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Setup,
    Login,
    Consent,
    Finish,
    Failed,
}

/// Durable state of one authorization attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthnSession {
    pub callback_id: String,
    pub client_id: String,
    /// Space-separated scopes of the authorization request.
    pub scopes: String,
    pub step: Step,
    pub consent_id: Option<String>,
    pub permissions: Vec<Permission>,
    pub owner_tax_id: Option<String>,
    pub user_id: Option<String>,
    pub granted_scopes: Option<String>,
    pub acr: Option<String>,
    pub auth_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl AuthnSession {
    pub fn new(
        callback_id: impl Into<String>,
        client_id: impl Into<String>,
        scopes: impl Into<String>,
    ) -> Self {
        Self {
            callback_id: callback_id.into(),
            client_id: client_id.into(),
            scopes: scopes.into(),
            step: Step::Setup,
            consent_id: None,
            permissions: Vec::new(),
            owner_tax_id: None,
            user_id: None,
            granted_scopes: None,
            acr: None,
            auth_time: None,
            error: None,
        }
    }
}

/// Form fields posted back by the login and consent pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowInput {
    pub login: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub consent: Option<String>,
}

impl FlowInput {
    /// Empty fields count as absent.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let field = |name: &str| form.get(name).filter(|v| !v.is_empty()).cloned();
        Self {
            login: field("login"),
            username: field("username"),
            password: field("password"),
            consent: field("consent"),
        }
    }
}

/// What the owner must be shown before the flow can continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Login {
        error: Option<String>,
    },
    Consent {
        permissions: Vec<Permission>,
        owner_name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    InProgress(Prompt),
    Success,
    Failure(String),
}

enum StepResult {
    Advance(Step),
    Suspend(Prompt),
    Fail(String),
}

#[derive(Clone)]
pub struct AuthorizationFlow {
    consents: ConsentService,
    users: Arc<dyn UserDirectory>,
}

impl AuthorizationFlow {
    pub fn new(consents: ConsentService, users: Arc<dyn UserDirectory>) -> Self {
        Self { consents, users }
    }

    pub async fn resume(&self, session: &mut AuthnSession, input: &FlowInput) -> Outcome {
        loop {
            let result = match session.step {
                Step::Setup => self.setup(session).await,
                Step::Login => self.login(session, input).await,
                Step::Consent => self.consent(session, input).await,
                Step::Finish => {
                    self.finish(session);
                    return Outcome::Success;
                }
                Step::Failed => {
                    return Outcome::Failure(session.error.clone().unwrap_or_default());
                }
            };

            match result {
                StepResult::Advance(next) => {
                    debug!("Session {} moved from {:?} to {:?}", session.callback_id, session.step, next);
                    session.step = next;
                }
                StepResult::Suspend(prompt) => return Outcome::InProgress(prompt),
                StepResult::Fail(reason) => {
                    warn!("Session {} failed at {:?}: {}", session.callback_id, session.step, reason);
                    session.step = Step::Failed;
                    session.error = Some(reason.clone());
                    return Outcome::Failure(reason);
                }
            }
        }
    }

    async fn setup(&self, session: &mut AuthnSession) -> StepResult {
        let Some(consent_id) = consent_id_from_scopes(&session.scopes) else {
            return StepResult::Fail("missing consent ID".to_string());
        };

        let consent = match self.consents.fetch(consent_id, &session.client_id).await {
            Ok(consent) => consent,
            Err(err) => return StepResult::Fail(err.to_string()),
        };
        if consent.status != ConsentStatus::AwaitingAuthorisation {
            return StepResult::Fail("consent not awaiting authorization".to_string());
        }

        session.consent_id = Some(consent.id);
        session.permissions = consent.permissions;
        session.owner_tax_id = Some(consent.owner_tax_id);
        StepResult::Advance(Step::Login)
    }

    async fn login(&self, session: &mut AuthnSession, input: &FlowInput) -> StepResult {
        let Some(login) = input.login.as_deref() else {
            return StepResult::Suspend(Prompt::Login { error: None });
        };
        if login != ACCEPTED {
            return self.refuse(session).await;
        }

        let retry = |error: &str| {
            StepResult::Suspend(Prompt::Login {
                error: Some(error.to_string()),
            })
        };

        let Some(user) = input
            .username
            .as_deref()
            .and_then(|username| self.users.user_by_username(username))
        else {
            return retry("invalid username");
        };
        if session.owner_tax_id.as_deref() != Some(user.tax_id.as_str()) {
            debug!("User {} does not own the consent of session {}", user.username, session.callback_id);
            return retry("invalid credentials");
        }
        if !self
            .users
            .verify_password(&user, input.password.as_deref().unwrap_or_default())
        {
            return retry("invalid credentials");
        }

        info!("User {} authenticated in session {}", user.username, session.callback_id);
        session.user_id = Some(user.username);
        StepResult::Advance(Step::Consent)
    }

    async fn consent(&self, session: &mut AuthnSession, input: &FlowInput) -> StepResult {
        let Some(decision) = input.consent.as_deref() else {
            let owner_name = session
                .owner_tax_id
                .as_deref()
                .and_then(|tax_id| self.users.user_by_tax_id(tax_id))
                .map(|user| user.name);
            return StepResult::Suspend(Prompt::Consent {
                permissions: session.permissions.clone(),
                owner_name,
            });
        };
        if decision != ACCEPTED {
            return self.refuse(session).await;
        }

        let Some(consent_id) = session.consent_id.as_deref() else {
            return StepResult::Fail("missing consent ID".to_string());
        };
        match self
            .consents
            .authorize(consent_id, session.permissions.clone())
            .await
        {
            Ok(_) => StepResult::Advance(Step::Finish),
            Err(err) => StepResult::Fail(err.to_string()),
        }
    }

    fn finish(&self, session: &mut AuthnSession) {
        session.granted_scopes = Some(session.scopes.clone());
        session.acr = Some(ACR_LOA2.to_string());
        session.auth_time = Some(self.consents.now());
    }

    /// The consent is rejected before the session is failed.
    async fn refuse(&self, session: &AuthnSession) -> StepResult {
        if let Some(consent_id) = session.consent_id.as_deref() {
            let rejection = Rejection::new(RejectedBy::User, RejectionReason::CustomerManuallyRejected);
            if let Err(err) = self
                .consents
                .reject(consent_id, &session.client_id, rejection)
                .await
            {
                error!("Failed to reject consent {}: {}", consent_id, err);
            }
        }
        StepResult::Fail("consent not granted".to_string())
    }
}
