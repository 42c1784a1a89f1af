use chrono::{Duration, Utc};
use consent_engine::{
    Clock, ConsentError, ConsentRequest, ConsentService, ConsentStatus, EndorsementRequest,
    EndorsementType, InMemoryConsentStore, ManualClock, Permission, RejectedBy, Rejection,
    RejectionReason, ValidationError,
};
use std::sync::Arc;

const CLIENT: &str = "client-a";

struct Harness {
    clock: Arc<ManualClock>,
    service: ConsentService,
}

fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn harness() -> Harness {
    init_logger();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let service = ConsentService::new(
        Arc::new(InMemoryConsentStore::new()),
        clock.clone(),
        Duration::hours(1),
    );
    Harness { clock, service }
}

fn request(clock: &ManualClock, permissions: Vec<Permission>) -> ConsentRequest {
    ConsentRequest {
        client_id: CLIENT.to_string(),
        owner_tax_id: "78628584099".to_string(),
        business_tax_id: None,
        permissions,
        expires_at: clock.now() + Duration::hours(1),
        endorsement_request: None,
    }
}

fn capitalization() -> Vec<Permission> {
    vec![Permission::RESOURCES_READ, Permission::CAPITALIZATION_TITLE_READ]
}

#[tokio::test]
async fn scenario_a_create_awaits_authorisation() {
    let h = harness();
    let consent = h
        .service
        .create(request(&h.clock, capitalization()))
        .await
        .unwrap();

    assert_eq!(consent.status, ConsentStatus::AwaitingAuthorisation);
    assert!(consent.id.starts_with("urn:mockin:"));
    assert_eq!(consent.permissions, capitalization());
    assert!(consent.rejection.is_none());
}

#[tokio::test]
async fn scenario_b_authorize() {
    let h = harness();
    let consent = h.service.create(request(&h.clock, capitalization())).await.unwrap();

    let authorised = h.service.authorize(&consent.id, capitalization()).await.unwrap();
    assert_eq!(authorised.status, ConsentStatus::Authorised);

    let fetched = h.service.fetch(&consent.id, CLIENT).await.unwrap();
    assert_eq!(fetched.status, ConsentStatus::Authorised);
}

#[tokio::test]
async fn scenario_c_authorised_consent_expires_on_read() {
    let h = harness();
    let consent = h.service.create(request(&h.clock, capitalization())).await.unwrap();
    h.service.authorize(&consent.id, capitalization()).await.unwrap();

    h.clock.advance(Duration::hours(1) + Duration::seconds(1));
    let fetched = h.service.fetch(&consent.id, CLIENT).await.unwrap();

    assert_eq!(fetched.status, ConsentStatus::Rejected);
    let rejection = fetched.rejection.unwrap();
    assert_eq!(rejection.reason, RejectionReason::ConsentMaxDateReached);
    assert_eq!(rejection.rejected_by, RejectedBy::Aspsp);
}

#[tokio::test]
async fn scenario_d_anchor_alone_is_refused() {
    let h = harness();
    let err = h
        .service
        .create(request(&h.clock, vec![Permission::RESOURCES_READ]))
        .await
        .unwrap_err();

    assert_eq!(err, ConsentError::Validation(ValidationError::AnchorAlone));
    assert!(err.to_string().contains("cannot be requested alone"));
}

#[tokio::test]
async fn scenario_e_mixed_phases_are_refused() {
    let h = harness();
    let err = h
        .service
        .create(request(
            &h.clock,
            vec![Permission::RESOURCES_READ, Permission::QUOTE_AUTO_READ],
        ))
        .await
        .unwrap_err();

    assert_eq!(err, ConsentError::Validation(ValidationError::MixedPhases));
}

#[tokio::test]
async fn status_never_moves_backward() {
    let h = harness();
    let consent = h.service.create(request(&h.clock, capitalization())).await.unwrap();
    h.service.authorize(&consent.id, capitalization()).await.unwrap();
    h.service.fetch_and_consume(&consent.id, CLIENT).await.unwrap();

    assert!(matches!(
        h.service.authorize(&consent.id, capitalization()).await,
        Err(ConsentError::InvalidStatus(_))
    ));
    assert!(h
        .service
        .reject(
            &consent.id,
            CLIENT,
            Rejection::new(RejectedBy::User, RejectionReason::CustomerManuallyRejected)
        )
        .await
        .is_err());

    // even far past every deadline a consumed consent stays consumed
    h.clock.advance(Duration::days(400));
    let fetched = h.service.fetch(&consent.id, CLIENT).await.unwrap();
    assert_eq!(fetched.status, ConsentStatus::Consumed);
}

#[tokio::test]
async fn rejected_consent_cannot_be_reopened() {
    let h = harness();
    let consent = h.service.create(request(&h.clock, capitalization())).await.unwrap();
    h.service.revoke(&consent.id, CLIENT).await.unwrap();

    assert!(matches!(
        h.service.authorize(&consent.id, capitalization()).await,
        Err(ConsentError::InvalidStatus(_))
    ));
    assert_eq!(
        h.service.revoke(&consent.id, CLIENT).await.unwrap_err(),
        ConsentError::InvalidOperation("the consent is already rejected".to_string())
    );
}

#[tokio::test]
async fn lazy_expiration_is_idempotent() {
    let h = harness();
    let consent = h.service.create(request(&h.clock, capitalization())).await.unwrap();

    h.clock.advance(Duration::hours(1) + Duration::seconds(1));
    let first = h.service.fetch(&consent.id, CLIENT).await.unwrap();
    h.clock.advance(Duration::minutes(5));
    let second = h.service.fetch(&consent.id, CLIENT).await.unwrap();

    assert_eq!(first.status, ConsentStatus::Rejected);
    assert_eq!(
        first.rejection,
        Some(Rejection::new(RejectedBy::User, RejectionReason::ConsentExpired))
    );
    assert_eq!(first, second);
}

#[tokio::test]
async fn authorize_after_timeout_fails() {
    let h = harness();
    let consent = h.service.create(request(&h.clock, capitalization())).await.unwrap();

    h.clock.advance(Duration::hours(2));
    assert!(matches!(
        h.service.authorize(&consent.id, capitalization()).await,
        Err(ConsentError::InvalidStatus(_))
    ));
}

#[tokio::test]
async fn grouped_category_must_be_complete_and_alone() {
    let h = harness();

    let partial = h
        .service
        .create(request(
            &h.clock,
            vec![Permission::QUOTE_AUTO_READ, Permission::QUOTE_AUTO_CREATE],
        ))
        .await
        .unwrap_err();
    assert_eq!(partial, ConsentError::Validation(ValidationError::IncompleteCategory));

    let two_categories = h
        .service
        .create(request(
            &h.clock,
            vec![
                Permission::QUOTE_TRAVEL_READ,
                Permission::QUOTE_TRAVEL_CREATE,
                Permission::QUOTE_TRAVEL_UPDATE,
                Permission::QUOTE_PERSON_LIFE_READ,
            ],
        ))
        .await
        .unwrap_err();
    assert_eq!(
        two_categories,
        ConsentError::Validation(ValidationError::CategoryConflict)
    );
}

#[tokio::test]
async fn anchor_plus_one_baseline_permission_succeeds() {
    let h = harness();
    for other in [
        Permission::CUSTOMERS_PERSONAL_IDENTIFICATIONS_READ,
        Permission::PENSION_PLAN_CLAIM,
        Permission::DAMAGES_AND_PEOPLE_AUTO_READ,
    ] {
        let consent = h
            .service
            .create(request(&h.clock, vec![Permission::RESOURCES_READ, other]))
            .await;
        assert!(consent.is_ok());
    }
}

#[tokio::test]
async fn fetch_checks_ownership_in_every_status() {
    let h = harness();
    let awaiting = h.service.create(request(&h.clock, capitalization())).await.unwrap();
    let authorised = h.service.create(request(&h.clock, capitalization())).await.unwrap();
    h.service.authorize(&authorised.id, capitalization()).await.unwrap();
    let rejected = h.service.create(request(&h.clock, capitalization())).await.unwrap();
    h.service.revoke(&rejected.id, CLIENT).await.unwrap();

    for id in [&awaiting.id, &authorised.id, &rejected.id] {
        assert_eq!(
            h.service.fetch(id, "client-b").await.unwrap_err(),
            ConsentError::Forbidden
        );
    }
    assert_eq!(
        h.service.fetch("urn:mockin:missing", CLIENT).await.unwrap_err(),
        ConsentError::NotFound
    );
}

#[tokio::test]
async fn consent_is_consumed_once() {
    let h = harness();
    let consent = h
        .service
        .create(ConsentRequest {
            endorsement_request: Some(EndorsementRequest {
                policy_number: "111111".to_string(),
                endorsement_type: EndorsementType::Exclusao,
                description: "remove driver".to_string(),
            }),
            ..request(&h.clock, vec![Permission::ENDORSEMENT_REQUEST_CREATE])
        })
        .await
        .unwrap();
    h.service
        .authorize(&consent.id, vec![Permission::ENDORSEMENT_REQUEST_CREATE])
        .await
        .unwrap();

    let snapshot = h.service.fetch_and_consume(&consent.id, CLIENT).await.unwrap();
    assert_eq!(snapshot.status, ConsentStatus::Authorised);
    assert_eq!(snapshot.endorsement_request.unwrap().policy_number, "111111");

    assert_eq!(
        h.service.fetch_and_consume(&consent.id, CLIENT).await.unwrap_err(),
        ConsentError::InvalidOperation("cannot consume a consent that is not authorized".to_string())
    );
}

#[tokio::test]
async fn revoke_picks_reason_from_status() {
    let h = harness();
    let awaiting = h.service.create(request(&h.clock, capitalization())).await.unwrap();
    let authorised = h.service.create(request(&h.clock, capitalization())).await.unwrap();
    h.service.authorize(&authorised.id, capitalization()).await.unwrap();

    let rejected = h.service.revoke(&awaiting.id, CLIENT).await.unwrap();
    assert_eq!(
        rejected.rejection.unwrap().reason,
        RejectionReason::CustomerManuallyRejected
    );
    let revoked = h.service.revoke(&authorised.id, CLIENT).await.unwrap();
    assert_eq!(
        revoked.rejection,
        Some(Rejection::new(RejectedBy::User, RejectionReason::CustomerManuallyRevoked))
    );
}

#[tokio::test]
async fn verify_permissions() {
    let h = harness();
    let consent = h.service.create(request(&h.clock, capitalization())).await.unwrap();

    assert!(matches!(
        h.service
            .verify_permissions(&consent.id, CLIENT, &[Permission::RESOURCES_READ])
            .await,
        Err(ConsentError::InvalidStatus(_))
    ));

    h.service.authorize(&consent.id, capitalization()).await.unwrap();
    assert!(h
        .service
        .verify_permissions(&consent.id, CLIENT, &[Permission::RESOURCES_READ])
        .await
        .is_ok());
    assert!(h.service.verify_permissions(&consent.id, CLIENT, &[]).await.is_ok());
    assert_eq!(
        h.service
            .verify_permissions(&consent.id, CLIENT, &[Permission::PENSION_PLAN_READ])
            .await
            .unwrap_err(),
        ConsentError::InvalidPermissions
    );
    // verification never mutates
    assert_eq!(
        h.service.fetch(&consent.id, CLIENT).await.unwrap().status,
        ConsentStatus::Authorised
    );
}

#[tokio::test]
async fn handle_grant_requires_authorised_consent() {
    let h = harness();
    let consent = h.service.create(request(&h.clock, capitalization())).await.unwrap();
    let scopes = format!("openid consent:{} resources", consent.id);

    assert!(h.service.handle_grant(CLIENT, "openid resources").await.is_ok());
    assert!(matches!(
        h.service.handle_grant(CLIENT, &scopes).await,
        Err(ConsentError::InvalidStatus(_))
    ));

    h.service.authorize(&consent.id, capitalization()).await.unwrap();
    assert!(h.service.handle_grant(CLIENT, &scopes).await.is_ok());
    assert_eq!(
        h.service.handle_grant("client-b", &scopes).await.unwrap_err(),
        ConsentError::Forbidden
    );
}
