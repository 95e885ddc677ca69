//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `LibraryApi` over
//! real HTTP through `ReqwestExecutor`. Validates that request building,
//! envelope unwrapping, case conversion, adaptation and the credential
//! refresh cycle work together against an actual server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use library_sync::{
    Anonymous, ApiClient, CacheKey, ClientConfig, Credential, CredentialUnavailable,
    DigitalPlatform, IdentityProvider, LibraryApi, NewDigitalLocation, NewPhysicalLocation,
    NewSublocation, NoopTelemetry, PhysicalLocationType, PhysicalLocationUpdate, StaticToken,
    SublocationType, SyncError,
};
use library_sync::{BillingCycle, CountSource, DigitalLocationUpdate, PaymentMethod};
use mock_server::AppState;

const TOKEN: &str = "valid-token";

async fn start_server(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener, state));
    format!("http://{addr}")
}

fn api(base_url: &str, identity: Arc<dyn IdentityProvider>) -> LibraryApi {
    let client = ApiClient::with_reqwest(
        ClientConfig::new(base_url),
        identity,
        Arc::new(NoopTelemetry),
    )
    .unwrap();
    LibraryApi::new(client)
}

/// Hands out `stale` until asked to refresh, then `fresh`.
struct RotatingIdentity {
    stale: &'static str,
    fresh: &'static str,
    refreshes: AtomicUsize,
}

impl RotatingIdentity {
    fn new(stale: &'static str, fresh: &'static str) -> Self {
        Self {
            stale,
            fresh,
            refreshes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityProvider for RotatingIdentity {
    async fn get_credential(&self) -> Result<Credential, CredentialUnavailable> {
        Ok(Credential::new(self.stale))
    }

    async fn refresh_credential(&self) -> Result<Credential, CredentialUnavailable> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(Credential::new(self.fresh))
    }
}

#[tokio::test]
async fn physical_lifecycle() {
    let base = start_server(AppState::new(TOKEN)).await;
    let api = api(&base, Arc::new(StaticToken::new(TOKEN)));

    // Step 1: empty backend.
    let batch = api.physical_locations_bff().await.unwrap();
    assert!(batch.locations.is_empty());
    assert!(batch.sublocations.is_empty());

    // Step 2: create a location with coordinates.
    let created = api
        .create_physical_location(&NewPhysicalLocation {
            name: "Home".to_string(),
            location_type: PhysicalLocationType::House,
            map_coordinates: Some("40.7, -74.0".to_string()),
            bg_color: None,
        })
        .await
        .unwrap();
    let home = created.value;
    assert_eq!(home.name, "Home");
    assert_eq!(home.location_type, PhysicalLocationType::House);
    assert!(home.coordinates.as_ref().unwrap().link.is_some());
    assert!(created.invalidates.contains(&CacheKey::PhysicalLocations));
    assert!(created.invalidates.contains(&CacheKey::Library));

    // Step 3: add a sublocation under it.
    let shelf = api
        .create_sublocation(&NewSublocation {
            name: "Living room shelf".to_string(),
            location_type: SublocationType::Shelf,
            parent_location_id: home.id.clone(),
            description: Some("left of the TV".to_string()),
            bg_color: None,
        })
        .await
        .unwrap();
    assert_eq!(shelf.value.parent_location_id.as_deref(), Some(home.id.as_str()));
    assert!(shelf
        .invalidates
        .contains(&CacheKey::PhysicalLocation(home.id.clone())));

    // Step 4: the aggregate links both ways.
    let batch = api.physical_locations_bff().await.unwrap();
    assert_eq!(batch.locations.len(), 1);
    assert_eq!(batch.sublocations.len(), 1);
    let sub = &batch.sublocations[0];
    assert_eq!(sub.parent_name, "Home");
    assert_eq!(sub.notes.as_deref(), Some("left of the TV"));
    assert_eq!(batch.locations[0].sublocations[0].id, sub.id);

    // Step 5: update keeps unset fields.
    let updated = api
        .update_physical_location(
            &home.id,
            &PhysicalLocationUpdate {
                name: Some("Cabin".to_string()),
                ..PhysicalLocationUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.value.name, "Cabin");
    assert_eq!(updated.value.location_type, PhysicalLocationType::House);
    assert_eq!(updated.value.sublocations.len(), 1);

    // Step 6: delete the sublocation, then the location.
    let removed = api.delete_sublocation(&sub.id, &home.id).await.unwrap();
    assert_eq!(removed.value.id, sub.id);
    let removed = api.delete_physical_location(&home.id).await.unwrap();
    assert_eq!(removed.value.id, home.id);

    // Step 7: it is gone.
    let missing = api.physical_location(&home.id).await.unwrap_err();
    assert!(matches!(missing, SyncError::NotFound));
}

#[tokio::test]
async fn digital_lifecycle_and_snapshot() {
    let base = start_server(AppState::new(TOKEN)).await;
    let api = api(&base, Arc::new(StaticToken::new(TOKEN)));

    let created = api
        .create_digital_location(&NewDigitalLocation {
            name: "Steam".to_string(),
            platform: DigitalPlatform::Steam,
            is_subscription: false,
            is_active: true,
            monthly_cost: None,
            billing_cycle: BillingCycle::Monthly,
            next_payment_date: None,
            payment_method: PaymentMethod::Generic,
        })
        .await
        .unwrap();
    let steam = created.value;
    assert_eq!(steam.platform, DigitalPlatform::Steam);
    assert!(steam.is_active);
    assert!(created.invalidates.contains(&CacheKey::DigitalLocations));

    let paused = api
        .update_digital_location(
            &steam.id,
            &DigitalLocationUpdate {
                is_active: Some(false),
                ..DigitalLocationUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(!paused.value.is_active);
    assert_eq!(paused.value.billing.cycle, BillingCycle::Monthly);

    let listed = api.digital_locations().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(api.digital_location(&steam.id).await.unwrap().id, steam.id);

    let snapshot = api.library_snapshot().await.unwrap();
    assert_eq!(snapshot.digital.len(), 1);
    assert_eq!(snapshot.metadata.source, CountSource::Recomputed);
    assert_eq!(snapshot.metadata.locations.digital, 1);
    assert_eq!(snapshot.metadata.locations.total, 1);

    api.delete_digital_location(&steam.id).await.unwrap();
    assert!(api.digital_locations().await.unwrap().is_empty());
}

#[tokio::test]
async fn stale_credential_is_refreshed_once() {
    let state = AppState::new(TOKEN);
    let base = start_server(state.clone()).await;
    let identity = Arc::new(RotatingIdentity::new("expired-token", TOKEN));
    let api = api(&base, identity.clone());

    let locations = api.digital_locations().await.unwrap();

    assert!(locations.is_empty());
    assert_eq!(identity.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(state.request_count(), 2);
}

#[tokio::test]
async fn rejected_refresh_surfaces_authentication_expired() {
    let state = AppState::new(TOKEN);
    let base = start_server(state.clone()).await;
    let identity = Arc::new(RotatingIdentity::new("expired-token", "also-wrong"));
    let api = api(&base, identity.clone());

    let error = api.digital_locations().await.unwrap_err();

    assert!(matches!(error, SyncError::AuthenticationExpired));
    assert!(error.requires_login());
    assert_eq!(identity.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(state.request_count(), 2);
}

#[tokio::test]
async fn anonymous_caller_cannot_refresh() {
    let state = AppState::new(TOKEN);
    let base = start_server(state.clone()).await;
    let api = api(&base, Arc::new(Anonymous));

    let error = api.library_snapshot().await.unwrap_err();

    assert!(matches!(error, SyncError::CredentialUnavailable { .. }));
    assert_eq!(state.request_count(), 1);
}

#[tokio::test]
async fn server_rotation_mid_session() {
    let state = AppState::new(TOKEN);
    let base = start_server(state.clone()).await;
    let api = api(&base, Arc::new(StaticToken::new(TOKEN)));

    api.digital_locations().await.unwrap();
    state.rotate_token("rotated").await;

    let error = api.digital_locations().await.unwrap_err();
    assert!(matches!(error, SyncError::AuthenticationExpired));
}

#[tokio::test]
async fn orphan_sublocation_request_reports_status() {
    let base = start_server(AppState::new(TOKEN)).await;
    let api = api(&base, Arc::new(StaticToken::new(TOKEN)));

    let error = api
        .create_sublocation(&NewSublocation {
            name: "Box".to_string(),
            location_type: SublocationType::Box,
            parent_location_id: "ghost".to_string(),
            description: None,
            bg_color: None,
        })
        .await
        .unwrap_err();

    match error {
        SyncError::Status { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "parent location not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = api(&format!("http://{addr}"), Arc::new(StaticToken::new(TOKEN)));

    let error = api.digital_locations().await.unwrap_err();

    assert!(matches!(error, SyncError::NetworkUnreachable { .. }));
    assert!(error.is_retryable());
}
