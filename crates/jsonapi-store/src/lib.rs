//! JSON:API normalization with a synchronized client-side store.
//!
//! `jsonapi-store` converts resources between the JSON:API document format
//! and a flattened, store-friendly normalized representation, keeps a
//! two-level `type → id → record` store in sync with a REST-style server,
//! and exposes CRUD actions over a pluggable async transport.
//!
//! # Core Concepts
//!
//! - **`Resource` / `Document`**: the JSON:API wire shapes
//! - **`NormalizedItem` / `NormalizedData`**: the flat in-memory shape with
//!   attributes at top level and metadata under the reserved `_jv` key
//! - **`Store`**: the two-level client-side cache with reducer mutations
//!   and getter queries
//! - **`StoreContext`**: the hosting-store seam (commit + getters), with
//!   `MemoryContext` as the in-memory adapter
//! - **`Transport`**: the injectable HTTP collaborator, with
//!   `HttpTransport` as the `reqwest`-backed adapter
//! - **`JsonApiClient`**: the action layer tying the above together
//!
//! # Quick Start
//!
//! ```
//! use jsonapi_store::{Identifier, NormalizedData, NormalizedItem, Store};
//! use serde_json::json;
//!
//! let widget = NormalizedItem::new("widget")
//!     .with_id("1")
//!     .with_attr("foo", json!(1))
//!     .unwrap();
//!
//! let mut store = Store::new();
//! store.add_records(&NormalizedData::Item(widget));
//!
//! let fetched = store.query(&Identifier::from("widget/1"), None).unwrap();
//! assert_eq!(fetched.as_item().unwrap().attributes["foo"], json!(1));
//! ```
//!
//! # Actions
//!
//! Actions resolve `(type, id)` from their payload, perform one request,
//! commit the outcome, and return the normalized result. Transport
//! failures come back as the `Err` variant with the HTTP status attached:
//!
//! ```ignore
//! let client = JsonApiClient::new(HttpTransport::new("http://example.com")?);
//! let ctx = MemoryContext::new();
//!
//! match client.get(&ctx, "widget/1").await {
//!     Ok(data) => { /* normalized item, already committed */ }
//!     Err(err) => { /* err.status() exposes e.g. Some(500) */ }
//! }
//! ```

mod actions;
mod context;
mod error;
mod ident;
mod norm;
mod resource;
mod store;
mod transport;

pub use actions::{ActionPayload, JsonApiClient};
pub use context::{MemoryContext, StoreContext};
pub use error::{JsonApiError, JsonApiResult};
pub use ident::Identifier;
pub use norm::{Collection, Meta, NormalizedData, NormalizedItem, RESERVED_KEY};
pub use resource::{Document, PrimaryData, Resource};
pub use store::{filter_collection, Mutation, Record, Store};
pub use transport::{
    HttpTransport, RequestConfig, Transport, TransportError, TransportResponse,
};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
