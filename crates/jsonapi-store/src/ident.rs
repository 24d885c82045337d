//! Identifier resolution: path strings and item metadata to `(type, id)`.

use serde::{Deserialize, Serialize};

use crate::error::{JsonApiError, JsonApiResult};
use crate::norm::{Meta, NormalizedItem};

/// Something that names a resource or collection.
///
/// Either a flexible `"type[/id]"` path string or the identifying metadata
/// of a normalized item. Both shapes resolve to a `(type, Option<id>)` pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    /// A `"type"` or `"type/id"` path string.
    Path(String),
    /// Item metadata carrying `type` and optionally `id`.
    Meta(Meta),
}

impl Identifier {
    /// Resolve to a `(type, Option<id>)` pair.
    ///
    /// Path strings split on `/`; empty leading segments are skipped, so a
    /// leading slash parses the same as none. Extra trailing segments are
    /// ignored. An input yielding no type is an [`InvalidIdentifier`]
    /// error.
    ///
    /// [`InvalidIdentifier`]: JsonApiError::InvalidIdentifier
    pub fn resolve(&self) -> JsonApiResult<(String, Option<String>)> {
        match self {
            Identifier::Path(path) => {
                let mut segments = path.split('/').skip_while(|segment| segment.is_empty());
                let kind = segments
                    .next()
                    .filter(|segment| !segment.is_empty())
                    .ok_or_else(|| JsonApiError::invalid_identifier(path.clone()))?;
                let id = segments
                    .next()
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_owned);
                Ok((kind.to_owned(), id))
            }
            Identifier::Meta(meta) => {
                if meta.kind.is_empty() {
                    return Err(JsonApiError::invalid_identifier(
                        "metadata missing `type`",
                    ));
                }
                Ok((meta.kind.clone(), meta.id.clone()))
            }
        }
    }
}

impl From<&str> for Identifier {
    fn from(path: &str) -> Self {
        Identifier::Path(path.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(path: String) -> Self {
        Identifier::Path(path)
    }
}

impl From<Meta> for Identifier {
    fn from(meta: Meta) -> Self {
        Identifier::Meta(meta)
    }
}

impl From<&NormalizedItem> for Identifier {
    fn from(item: &NormalizedItem) -> Self {
        Identifier::Meta(item.meta.clone())
    }
}
