//! Client-side data synchronization layer for the media library backend.
//!
//! # Overview
//! Sits between the UI's query cache and the HTTP backend. Requests go out
//! with `snake_case` bodies and a bearer credential; responses come back in
//! a `{ success, data, error }` envelope which is validated, unwrapped and
//! converted to `camelCase` before the domain adapters normalize it into
//! cross-referenced entities.
//!
//! # Design
//! - `case`, `envelope` and `adapters` are pure and synchronous; only the
//!   transport awaits (credential lookup, the network call, the refresh).
//! - `ApiClient` is constructed explicitly from a `ClientConfig` and its
//!   collaborators (executor, identity provider, telemetry sink); there is
//!   no global instance.
//! - A `401` triggers exactly one credential refresh and resend per logical
//!   request. `SingleFlightIdentity` optionally collapses concurrent
//!   refreshes across requests.
//! - `LibraryApi` exposes the fetchers and mutators the query cache calls.

pub mod adapters;
pub mod api;
pub mod case;
pub mod client;
pub mod config;
pub mod dto;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod http;
pub mod identity;
pub mod telemetry;
pub mod types;

pub use adapters::{AdapterNotice, Adapted};
pub use api::{
    CacheKey, DeleteConfirmation, DigitalLocationUpdate, EntityRef, LibraryApi, Mutation,
    NewDigitalLocation, NewPhysicalLocation, NewSublocation, PhysicalLocationUpdate,
};
pub use client::{ApiClient, ApiRequest, RequestBody};
pub use config::ClientConfig;
pub use error::SyncError;
pub use executor::ReqwestExecutor;
pub use http::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse, TransportFailure};
pub use identity::{
    Anonymous, Credential, CredentialUnavailable, IdentityProvider, SingleFlightIdentity,
    StaticToken,
};
pub use telemetry::{NoopTelemetry, RequestEvent, TelemetrySink, TracingTelemetry};
pub use types::{
    AggregateMetadata, Billing, BillingCycle, CountSource, DigitalLocation, DigitalPlatform,
    GameItem, IconColor, ItemCounts, ItemOwner, LibrarySnapshot, LocationCounts, MapCoordinates,
    PaymentMethod, PhysicalBatch, PhysicalLocation, PhysicalLocationType, PhysicalMedia,
    Sublocation, SublocationType,
};
