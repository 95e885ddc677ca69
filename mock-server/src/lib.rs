//! In-memory stand-in for the library backend.
//!
//! Speaks the same wire contract as the real service: `snake_case` JSON,
//! every body wrapped in `{ success, data?, error? }`, and a bearer token
//! checked on every route. The accepted token can be rotated at runtime so
//! tests can expire credentials mid-session.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicalLocation {
    pub id: String,
    pub name: String,
    pub location_type: String,
    pub map_coordinates: Option<String>,
    pub bg_color: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Sublocation {
    pub id: String,
    pub name: String,
    pub location_type: String,
    pub parent_location_id: String,
    pub description: Option<String>,
    pub bg_color: Option<String>,
    pub stored_items: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GameItem {
    pub id: String,
    pub name: String,
    pub platform_name: Option<String>,
    pub acquired_date: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DigitalLocation {
    pub id: String,
    pub name: String,
    pub location_type: String,
    pub is_subscription: bool,
    pub is_active: bool,
    pub monthly_cost: Option<f64>,
    pub billing_cycle: String,
    pub next_payment_date: Option<String>,
    pub payment_method: String,
    pub items: Vec<GameItem>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct CreatePhysicalLocation {
    pub name: String,
    pub location_type: String,
    pub map_coordinates: Option<String>,
    pub bg_color: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdatePhysicalLocation {
    pub name: Option<String>,
    pub location_type: Option<String>,
    pub map_coordinates: Option<String>,
    pub bg_color: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateSublocation {
    pub name: String,
    pub location_type: String,
    pub parent_location_id: String,
    pub description: Option<String>,
    pub bg_color: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDigitalLocation {
    pub name: String,
    pub location_type: String,
    #[serde(default)]
    pub is_subscription: bool,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    pub monthly_cost: Option<f64>,
    #[serde(default = "monthly")]
    pub billing_cycle: String,
    pub next_payment_date: Option<String>,
    #[serde(default = "generic")]
    pub payment_method: String,
}

#[derive(Deserialize)]
pub struct UpdateDigitalLocation {
    pub name: Option<String>,
    pub location_type: Option<String>,
    pub is_subscription: Option<bool>,
    pub is_active: Option<bool>,
    pub monthly_cost: Option<f64>,
    pub billing_cycle: Option<String>,
    pub next_payment_date: Option<String>,
    pub payment_method: Option<String>,
}

fn active_by_default() -> bool {
    true
}

fn monthly() -> String {
    "monthly".to_string()
}

fn generic() -> String {
    "generic".to_string()
}

#[derive(Debug, Default)]
pub struct Store {
    pub physical: Vec<PhysicalLocation>,
    pub sublocations: Vec<Sublocation>,
    pub digital: Vec<DigitalLocation>,
}

/// Shared server state. Clones share the same store and token.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    token: Arc<RwLock<String>>,
    requests: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(token: &str) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            token: Arc::new(RwLock::new(token.to_string())),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Accept only `token` from now on.
    pub async fn rotate_token(&self, token: &str) {
        *self.token.write().await = token.to_string();
    }

    /// Requests received so far, including rejected ones.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub async fn seed(&self, store: Store) {
        *self.store.write().await = store;
    }
}

pub fn app(token: &str) -> Router {
    router(AppState::new(token))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/library/bff", get(library_bff))
        .route("/v1/locations/physical/bff", get(physical_bff))
        .route(
            "/v1/locations/physical",
            get(list_physical).post(create_physical),
        )
        .route(
            "/v1/locations/physical/{id}",
            get(get_physical).patch(update_physical).delete(delete_physical),
        )
        .route(
            "/v1/locations/sublocations",
            axum::routing::post(create_sublocation),
        )
        .route(
            "/v1/locations/sublocations/{id}",
            axum::routing::delete(delete_sublocation),
        )
        .route("/v1/locations/digital", get(list_digital).post(create_digital))
        .route(
            "/v1/locations/digital/{id}",
            get(get_digital).patch(update_digital).delete(delete_digital),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

type Reply = (StatusCode, Json<Value>);

fn ok(data: impl Serialize) -> Reply {
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

fn created(data: impl Serialize) -> Reply {
    (StatusCode::CREATED, Json(json!({ "success": true, "data": data })))
}

fn fail(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "success": false, "error": message })))
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let expected = format!("Bearer {}", state.token.read().await);
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented != Some(expected.as_str()) {
        tracing::debug!(path = %request.uri().path(), "rejecting request without valid bearer");
        return fail(StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }
    next.run(request).await
}

fn with_sublocations(location: &PhysicalLocation, sublocations: &[Sublocation]) -> Value {
    let mut value = json!(location);
    value["sublocations"] = json!(sublocations
        .iter()
        .filter(|s| s.parent_location_id == location.id)
        .collect::<Vec<_>>());
    value
}

async fn library_bff(State(state): State<AppState>) -> Reply {
    let store = state.store.read().await;
    let items: usize = store.sublocations.iter().map(|s| s.stored_items as usize).sum::<usize>()
        + store.digital.iter().map(|d| d.items.len()).sum::<usize>();
    ok(json!({
        "physical_locations": store.physical,
        "sublocations": store.sublocations,
        "digital_locations": store.digital,
        "totals": {
            "locations": store.physical.len() + store.digital.len(),
            "items": items,
        },
    }))
}

async fn physical_bff(State(state): State<AppState>) -> Reply {
    let store = state.store.read().await;
    ok(json!({
        "physical_locations": store.physical,
        "sublocations": store.sublocations,
    }))
}

async fn list_physical(State(state): State<AppState>) -> Reply {
    let store = state.store.read().await;
    let locations: Vec<Value> = store
        .physical
        .iter()
        .map(|location| with_sublocations(location, &store.sublocations))
        .collect();
    ok(locations)
}

async fn get_physical(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let store = state.store.read().await;
    match store.physical.iter().find(|l| l.id == id) {
        Some(location) => ok(with_sublocations(location, &store.sublocations)),
        None => fail(StatusCode::NOT_FOUND, "location not found"),
    }
}

async fn create_physical(
    State(state): State<AppState>,
    Json(input): Json<CreatePhysicalLocation>,
) -> Reply {
    let stamp = now();
    let location = PhysicalLocation {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        location_type: input.location_type,
        map_coordinates: input.map_coordinates,
        bg_color: input.bg_color,
        created_at: stamp.clone(),
        updated_at: stamp,
    };
    state.store.write().await.physical.push(location.clone());
    created(with_sublocations(&location, &[]))
}

async fn update_physical(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePhysicalLocation>,
) -> Reply {
    let mut store = state.store.write().await;
    let Some(location) = store.physical.iter_mut().find(|l| l.id == id) else {
        return fail(StatusCode::NOT_FOUND, "location not found");
    };
    if let Some(name) = input.name {
        location.name = name;
    }
    if let Some(location_type) = input.location_type {
        location.location_type = location_type;
    }
    if input.map_coordinates.is_some() {
        location.map_coordinates = input.map_coordinates;
    }
    if input.bg_color.is_some() {
        location.bg_color = input.bg_color;
    }
    location.updated_at = now();
    let location = location.clone();
    ok(with_sublocations(&location, &store.sublocations))
}

async fn delete_physical(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let mut store = state.store.write().await;
    let before = store.physical.len();
    store.physical.retain(|l| l.id != id);
    if store.physical.len() == before {
        return fail(StatusCode::NOT_FOUND, "location not found");
    }
    store.sublocations.retain(|s| s.parent_location_id != id);
    ok(json!({ "id": id }))
}

async fn create_sublocation(
    State(state): State<AppState>,
    Json(input): Json<CreateSublocation>,
) -> Reply {
    let mut store = state.store.write().await;
    if !store.physical.iter().any(|l| l.id == input.parent_location_id) {
        return fail(StatusCode::UNPROCESSABLE_ENTITY, "parent location not found");
    }
    let stamp = now();
    let sublocation = Sublocation {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        location_type: input.location_type,
        parent_location_id: input.parent_location_id,
        description: input.description,
        bg_color: input.bg_color,
        stored_items: 0,
        created_at: stamp.clone(),
        updated_at: stamp,
    };
    store.sublocations.push(sublocation.clone());
    created(sublocation)
}

async fn delete_sublocation(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let mut store = state.store.write().await;
    let Some(index) = store.sublocations.iter().position(|s| s.id == id) else {
        return fail(StatusCode::NOT_FOUND, "sublocation not found");
    };
    let removed = store.sublocations.remove(index);
    ok(json!({ "id": removed.id, "parent_location_id": removed.parent_location_id }))
}

async fn list_digital(State(state): State<AppState>) -> Reply {
    ok(&state.store.read().await.digital)
}

async fn get_digital(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let store = state.store.read().await;
    match store.digital.iter().find(|d| d.id == id) {
        Some(location) => ok(location),
        None => fail(StatusCode::NOT_FOUND, "location not found"),
    }
}

async fn create_digital(
    State(state): State<AppState>,
    Json(input): Json<CreateDigitalLocation>,
) -> Reply {
    let stamp = now();
    let location = DigitalLocation {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        location_type: input.location_type,
        is_subscription: input.is_subscription,
        is_active: input.is_active,
        monthly_cost: input.monthly_cost,
        billing_cycle: input.billing_cycle,
        next_payment_date: input.next_payment_date,
        payment_method: input.payment_method,
        items: Vec::new(),
        created_at: stamp.clone(),
        updated_at: stamp,
    };
    state.store.write().await.digital.push(location.clone());
    created(location)
}

async fn update_digital(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateDigitalLocation>,
) -> Reply {
    let mut store = state.store.write().await;
    let Some(location) = store.digital.iter_mut().find(|d| d.id == id) else {
        return fail(StatusCode::NOT_FOUND, "location not found");
    };
    if let Some(name) = input.name {
        location.name = name;
    }
    if let Some(location_type) = input.location_type {
        location.location_type = location_type;
    }
    if let Some(is_subscription) = input.is_subscription {
        location.is_subscription = is_subscription;
    }
    if let Some(is_active) = input.is_active {
        location.is_active = is_active;
    }
    if input.monthly_cost.is_some() {
        location.monthly_cost = input.monthly_cost;
    }
    if let Some(billing_cycle) = input.billing_cycle {
        location.billing_cycle = billing_cycle;
    }
    if input.next_payment_date.is_some() {
        location.next_payment_date = input.next_payment_date;
    }
    if let Some(payment_method) = input.payment_method {
        location.payment_method = payment_method;
    }
    location.updated_at = now();
    ok(&*location)
}

async fn delete_digital(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let mut store = state.store.write().await;
    let before = store.digital.len();
    store.digital.retain(|d| d.id != id);
    if store.digital.len() == before {
        return fail(StatusCode::NOT_FOUND, "location not found");
    }
    ok(json!({ "id": id }))
}
