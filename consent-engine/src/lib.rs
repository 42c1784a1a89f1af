//! # consent-engine
//!
//! The consent core of the Open Insurance mock authorization server.
//!
//! ## Components
//!
//! - **Permission catalog:** static permission categories and the rules for
//!   requesting them together.
//! - **Consent service:** creation, lazy expiration and the status machine.
//! - **Authorization flow:** the resumable login and consent review steps.

pub mod clock;
pub mod error;
pub mod flow;
pub mod model;
pub mod permission;
pub mod scope;
pub mod service;
pub mod store;
pub mod user;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConsentError, StoreError, ValidationError};
pub use flow::{AuthnSession, AuthorizationFlow, FlowInput, Outcome, Prompt, Step};
pub use model::{
    Consent, ConsentRequest, ConsentStatus, EndorsementRequest, EndorsementType, RejectedBy,
    Rejection, RejectionReason,
};
pub use permission::{Permission, Phase, validate_permissions};
pub use service::ConsentService;
pub use store::{ConsentStore, InMemoryConsentStore};
pub use user::{InMemoryUserDirectory, User, UserDirectory};
