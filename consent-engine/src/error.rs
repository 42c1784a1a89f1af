use thiserror::Error;

/// A create-consent request broke one of the admission rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the expiration time cannot be in the past")]
    ExpirationInPast,

    #[error("the expiration time cannot be greater than one year")]
    ExpirationTooFar,

    #[error("at least one permission must be requested")]
    EmptyPermissions,

    #[error("cannot request permission from phase 2 and 3 in the same request")]
    MixedPhases,

    #[error("the permission RESOURCES_READ is required for phase 2")]
    AnchorMissing,

    #[error("the permission RESOURCES_READ cannot be requested alone")]
    AnchorAlone,

    #[error("permissions of different phase 3 categories were requested")]
    CategoryConflict,

    #[error("all the permission from one category must be requested")]
    IncompleteCategory,

    #[error("endorsement information is required when requesting ENDORSEMENT_REQUEST_CREATE")]
    MissingEndorsementRequest,
}

impl ValidationError {
    /// Whether the rule concerns the permission set rather than the request envelope.
    pub fn is_permission_rule(&self) -> bool {
        matches!(
            self,
            Self::MixedPhases
                | Self::AnchorMissing
                | Self::AnchorAlone
                | Self::CategoryConflict
                | Self::IncompleteCategory
        )
    }

    /// Rules a well-formed request cannot satisfy by itself (processed as 422 upstream).
    pub fn is_unprocessable(&self) -> bool {
        matches!(self, Self::MixedPhases | Self::CategoryConflict)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not find the consent")]
    NotFound,

    #[error("client not authorized to perform this operation")]
    Forbidden,

    #[error("{0}")]
    InvalidStatus(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("consent missing permissions")]
    InvalidPermissions,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ConsentError {
    fn from(err: StoreError) -> Self {
        ConsentError::Internal(err.0)
    }
}
