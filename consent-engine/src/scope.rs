//! Helpers for the dynamic `consent:<id>` OAuth scope.

pub const CONSENT_SCOPE_PREFIX: &str = "consent:";

/// Returns the consent id carried by the first `consent:` token of a
/// space-separated scope string.
pub fn consent_id_from_scopes(scopes: &str) -> Option<&str> {
    scopes
        .split_whitespace()
        .find_map(|scope| {
            scope
                .strip_prefix(CONSENT_SCOPE_PREFIX)
                .filter(|id| !id.is_empty())
        })
}

pub fn consent_scope(consent_id: &str) -> String {
    format!("{CONSENT_SCOPE_PREFIX}{consent_id}")
}

pub fn is_consent_scope(scope: &str) -> bool {
    scope.starts_with(CONSENT_SCOPE_PREFIX)
}
