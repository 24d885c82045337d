//! Action layer: request building, transport invocation, normalization,
//! store commit, and read-back.
//!
//! Each action performs exactly one outbound request with a single
//! suspension point awaiting the transport. Transport failures surface as
//! the `Err` variant carrying the HTTP status, never as a panic, so
//! callers branch on the result value when composing action chains.

use tracing::debug;

use crate::context::StoreContext;
use crate::error::{JsonApiError, JsonApiResult};
use crate::ident::Identifier;
use crate::norm::{NormalizedData, NormalizedItem};
use crate::store::Mutation;
use crate::transport::{RequestConfig, Transport};

/// Action input: a target plus optional passthrough transport config.
///
/// Built from a path string, a normalized item, or either paired with a
/// [`RequestConfig`] in a tuple.
#[derive(Clone, Debug)]
pub struct ActionPayload {
    target: Target,
    config: Option<RequestConfig>,
}

#[derive(Clone, Debug)]
enum Target {
    Ident(Identifier),
    Item(NormalizedItem),
}

impl Target {
    fn identifier(&self) -> Identifier {
        match self {
            Target::Ident(ident) => ident.clone(),
            Target::Item(item) => Identifier::from(item),
        }
    }

    fn item(&self) -> Option<&NormalizedItem> {
        match self {
            Target::Ident(_) => None,
            Target::Item(item) => Some(item),
        }
    }
}

impl ActionPayload {
    /// Attach transport config (builder pattern).
    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = Some(config);
        self
    }
}

impl From<&str> for ActionPayload {
    fn from(path: &str) -> Self {
        ActionPayload {
            target: Target::Ident(Identifier::from(path)),
            config: None,
        }
    }
}

impl From<String> for ActionPayload {
    fn from(path: String) -> Self {
        ActionPayload {
            target: Target::Ident(Identifier::from(path)),
            config: None,
        }
    }
}

impl From<Identifier> for ActionPayload {
    fn from(ident: Identifier) -> Self {
        ActionPayload {
            target: Target::Ident(ident),
            config: None,
        }
    }
}

impl From<NormalizedItem> for ActionPayload {
    fn from(item: NormalizedItem) -> Self {
        ActionPayload {
            target: Target::Item(item),
            config: None,
        }
    }
}

impl From<&NormalizedItem> for ActionPayload {
    fn from(item: &NormalizedItem) -> Self {
        ActionPayload::from(item.clone())
    }
}

impl<T: Into<ActionPayload>> From<(T, RequestConfig)> for ActionPayload {
    fn from((target, config): (T, RequestConfig)) -> Self {
        target.into().with_config(config)
    }
}

/// CRUD actions over a transport, keeping a store context synchronized.
pub struct JsonApiClient<T> {
    transport: T,
}

impl<T: Transport> JsonApiClient<T> {
    /// Create a client over the given transport.
    pub fn new(transport: T) -> Self {
        JsonApiClient { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn request_path(kind: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{kind}/{id}"),
            None => kind.to_owned(),
        }
    }

    /// GET an item or collection, merge it into the store, return it.
    ///
    /// A bodiless response (204) yields the empty collection and commits
    /// nothing.
    pub async fn get(
        &self,
        ctx: &dyn StoreContext,
        payload: impl Into<ActionPayload>,
    ) -> JsonApiResult<NormalizedData> {
        let payload = payload.into();
        let (kind, id) = payload.target.identifier().resolve()?;
        let path = Self::request_path(&kind, id.as_deref());
        debug!(%path, "get");
        let response = self.transport.get(&path, payload.config.as_ref()).await?;
        let records = NormalizedData::from_document(response.data())?;
        if !records.is_empty() {
            ctx.commit(Mutation::AddRecords {
                records: records.clone(),
            })?;
        }
        Ok(records)
    }

    /// Alias for [`get`](Self::get).
    #[inline]
    pub async fn fetch(
        &self,
        ctx: &dyn StoreContext,
        payload: impl Into<ActionPayload>,
    ) -> JsonApiResult<NormalizedData> {
        self.get(ctx, payload).await
    }

    /// POST a new item to `/type`.
    ///
    /// The normalized response is committed, then the result is read back
    /// through the context getter using the request item's identifier, so
    /// server-assigned fields surfaced via committed state are visible.
    pub async fn post(
        &self,
        ctx: &dyn StoreContext,
        payload: impl Into<ActionPayload>,
    ) -> JsonApiResult<NormalizedData> {
        let payload = payload.into();
        let item = payload.target.item().ok_or_else(|| {
            JsonApiError::invalid_identifier("post requires a normalized item payload")
        })?;
        let (kind, _) = payload.target.identifier().resolve()?;
        debug!(path = %kind, "post");
        let body = item.to_resource();
        let response = self
            .transport
            .post(&kind, &body, payload.config.as_ref())
            .await?;
        let records = NormalizedData::from_document(response.data())?;
        if !records.is_empty() {
            ctx.commit(Mutation::AddRecords { records })?;
        }
        ctx.get(&Identifier::from(item), None)
    }

    /// Alias for [`post`](Self::post).
    #[inline]
    pub async fn create(
        &self,
        ctx: &dyn StoreContext,
        payload: impl Into<ActionPayload>,
    ) -> JsonApiResult<NormalizedData> {
        self.post(ctx, payload).await
    }

    /// PATCH an item at `/type/id`.
    ///
    /// The *input* patch, not the response, is shallow-merged into the
    /// store, then the result is read back through the context getter.
    pub async fn patch(
        &self,
        ctx: &dyn StoreContext,
        payload: impl Into<ActionPayload>,
    ) -> JsonApiResult<NormalizedData> {
        let payload = payload.into();
        let item = payload.target.item().ok_or_else(|| {
            JsonApiError::invalid_identifier("patch requires a normalized item payload")
        })?;
        let (kind, id) = payload.target.identifier().resolve()?;
        let id = id.ok_or_else(|| {
            JsonApiError::invalid_identifier(format!("cannot patch {kind} without an id"))
        })?;
        let path = Self::request_path(&kind, Some(&id));
        debug!(%path, "patch");
        let body = item.to_resource();
        self.transport
            .patch(&path, &body, payload.config.as_ref())
            .await?;
        ctx.commit(Mutation::UpdateRecord {
            record: item.clone(),
        })?;
        ctx.get(&Identifier::from(item), None)
    }

    /// Alias for [`patch`](Self::patch).
    #[inline]
    pub async fn update(
        &self,
        ctx: &dyn StoreContext,
        payload: impl Into<ActionPayload>,
    ) -> JsonApiResult<NormalizedData> {
        self.patch(ctx, payload).await
    }

    /// DELETE `/type/id` and drop the entry from the store.
    pub async fn delete(
        &self,
        ctx: &dyn StoreContext,
        payload: impl Into<ActionPayload>,
    ) -> JsonApiResult<()> {
        let payload = payload.into();
        let target = payload.target.identifier();
        let (kind, id) = target.resolve()?;
        let id = id.ok_or_else(|| {
            JsonApiError::invalid_identifier(format!("cannot delete {kind} without an id"))
        })?;
        let path = Self::request_path(&kind, Some(&id));
        debug!(%path, "delete");
        self.transport
            .delete(&path, payload.config.as_ref())
            .await?;
        ctx.commit(Mutation::DeleteRecord { target })?;
        Ok(())
    }
}
