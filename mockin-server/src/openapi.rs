use crate::api::{consents, endorsement, health, oauth, quote_auto, resources};
use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const OAUTH_TAG: &str = "OAuth API";
pub(crate) const CONSENTS_TAG: &str = "Consents API";
pub(crate) const RESOURCES_TAG: &str = "Resources API";
pub(crate) const ENDORSEMENT_TAG: &str = "Endorsement API";
pub(crate) const QUOTE_AUTO_TAG: &str = "Quote Auto API";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::ready_check,
        health::startup_check,
        oauth::handlers::authorize,
        oauth::handlers::authorize_callback,
        oauth::handlers::token,
        oauth::handlers::introspect,
        consents::create_consent,
        consents::fetch_consent,
        consents::delete_consent,
        resources::list_resources,
        endorsement::create_endorsement,
        quote_auto::create_quote,
        quote_auto::quote_status,
        quote_auto::patch_quote,
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = OAUTH_TAG, description = "Authorization server endpoints"),
        (name = CONSENTS_TAG, description = "Consent lifecycle"),
        (name = RESOURCES_TAG, description = "Consented resources of the owner"),
        (name = ENDORSEMENT_TAG, description = "Endorsement requests"),
        (name = QUOTE_AUTO_TAG, description = "Auto insurance quotes"),
    ),
    info(
        title = "Mockin Open Insurance API",
        description = "Mock consent and authorization server for Open Insurance",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_protected_operations() {
        let doc = ApiDoc::openapi();
        for path in [
            "/open-insurance/consents/v2/consents",
            "/open-insurance/resources/v2/resources",
            "/open-insurance/quote-auto/v1/request",
            "/auth/token",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
