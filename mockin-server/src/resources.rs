//! Insurance resources owned by the mock users.

use consent_engine::Permission;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

pub const RESOURCE_TYPES: &[&str] = &[
    "CAPITALIZATION_TITLES",
    "CAPITALIZATION_TITLE_WITHDRAWAL",
    "CLAIM_NOTIFICATION",
    "CONTRACT_LIFE_PENSION",
    "CONTRACT_PENSION_PLAN",
    "CUSTOMERS_BUSINESS_ADDITIONAL_INFO",
    "CUSTOMERS_BUSINESS_IDENTIFICATIONS",
    "CUSTOMERS_BUSINESS_QUALIFICATION",
    "CUSTOMERS_PERSONAL_ADDITIONAL_INFO",
    "CUSTOMERS_PERSONAL_IDENTIFICATIONS",
    "CUSTOMERS_PERSONAL_QUALIFICATION",
    "DAMAGES_AND_PEOPLE_ACCEPTANCE_AND_BRANCHES_ABROAD",
    "DAMAGES_AND_PEOPLE_AUTO",
    "DAMAGES_AND_PEOPLE_FINANCIAL_RISKS",
    "DAMAGES_AND_PEOPLE_HOUSING",
    "DAMAGES_AND_PEOPLE_PATRIMONIAL",
    "DAMAGES_AND_PEOPLE_PERSON",
    "DAMAGES_AND_PEOPLE_RESPONSIBILITY",
    "DAMAGES_AND_PEOPLE_RURAL",
    "DAMAGES_AND_PEOPLE_TRANSPORT",
    "ENDORSEMENT",
    "FINANCIAL_ASSISTANCE",
    "LIFE_PENSION",
    "PENSION_PLAN",
    "PENSION_WITHDRAWAL",
    "QUOTE_ACCEPTANCE_AND_BRANCHES_ABROAD",
    "QUOTE_AUTO",
    "QUOTE_CAPITALIZATION_TITLE",
    "QUOTE_FINANCIAL_RISK",
    "QUOTE_HOUSING",
    "QUOTE_PATRIMONIAL",
    "QUOTE_PERSON",
    "QUOTE_RESPONSIBILITY",
    "QUOTE_RURAL",
    "QUOTE_TRANSPORT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Available,
    Unavailable,
    TemporarilyUnavailable,
    PendingAuthorisation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub resource_id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub status: ResourceStatus,
}

/// Resources indexed by the owner's subject. Built once at start-up.
#[derive(Debug, Clone, Default)]
pub struct ResourceDirectory {
    resources: HashMap<String, Vec<Resource>>,
}

impl ResourceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, subject: impl Into<String>, resource: Resource) -> Self {
        self.resources.entry(subject.into()).or_default().push(resource);
        self
    }

    /// The subject's resources whose type is in `types`, in insertion order.
    pub fn resources(&self, subject: &str, types: &[&str]) -> Vec<Resource> {
        self.resources
            .get(subject)
            .map(|resources| {
                resources
                    .iter()
                    .filter(|r| types.contains(&r.resource_type.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn find(&self, subject: &str, resource_id: &str) -> Option<&Resource> {
        self.resources
            .get(subject)?
            .iter()
            .find(|r| r.resource_id == resource_id)
    }
}

/// Resource types covered by `permissions`. A permission covers a type when
/// it starts with the type name stripped of its trailing `S`.
pub fn consented_resource_types(permissions: &[Permission]) -> Vec<&'static str> {
    RESOURCE_TYPES
        .iter()
        .copied()
        .filter(|resource_type| {
            let prefix = resource_type.trim_end_matches('S');
            permissions.iter().any(|p| p.as_str().starts_with(prefix))
        })
        .collect()
}
