//! Canned owners and resources served by the mock.

use crate::resources::{Resource, ResourceDirectory, ResourceStatus};
use consent_engine::{InMemoryUserDirectory, User};

pub const MOCK_PASSWORD: &str = "pass";

pub const BOB_USERNAME: &str = "bob@mail.com";

pub fn users() -> InMemoryUserDirectory {
    InMemoryUserDirectory::new(MOCK_PASSWORD).with_user(User {
        username: BOB_USERNAME.to_string(),
        email: BOB_USERNAME.to_string(),
        tax_id: "78628584099".to_string(),
        name: "Mr. Bob".to_string(),
        company_tax_ids: vec!["27737785000136".to_string()],
    })
}

pub fn resources() -> ResourceDirectory {
    ResourceDirectory::new()
        .with_resource(
            BOB_USERNAME,
            Resource {
                resource_id: "cbad06ae-5f44-483a-bded-e61593ea195c".to_string(),
                resource_type: "CAPITALIZATION_TITLES".to_string(),
                status: ResourceStatus::Unavailable,
            },
        )
        .with_resource(
            BOB_USERNAME,
            Resource {
                resource_id: "111111".to_string(),
                resource_type: "DAMAGES_AND_PEOPLE_PATRIMONIAL".to_string(),
                status: ResourceStatus::Available,
            },
        )
}
