//! YAML projection of catalog entities
//!
//! Every persisted node holds a YAML document. This module maps entities to
//! their document form and back; it performs no I/O.
//!
//! Empty collections are omitted from table documents, so a bare table is the
//! single line `name: foo_table`. Readers treat an absent collection as empty.

pub mod table;
pub mod view;

pub use table::{YamlColumn, YamlConstraint, YamlIndex, YamlTable};
pub use view::YamlView;

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Document stored at a schema's tables-collection node.
pub const EMPTY_SCHEMA_DOCUMENT: &str = "";

/// Mapping between an entity and its YAML document model.
pub trait YamlProjection: Sized {
    type Document: Serialize + DeserializeOwned + Default;

    fn to_yaml(&self) -> Self::Document;

    fn from_yaml(document: Self::Document) -> Self;
}

/// Render an entity as the text stored in the repository.
pub fn to_document<T: YamlProjection>(entity: &T) -> Result<String> {
    Ok(serde_yaml::to_string(&entity.to_yaml())?)
}

/// Parse the text stored at `key`.
///
/// A missing or blank document yields the default entity; text that does not
/// match the document model is `Error::MalformedDocument`.
pub fn from_document<T: YamlProjection>(key: &str, document: Option<&str>) -> Result<T> {
    let text = match document {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Ok(T::from_yaml(T::Document::default())),
    };
    let parsed = serde_yaml::from_str(text).map_err(|source| Error::MalformedDocument {
        key: key.to_string(),
        source,
    })?;
    Ok(T::from_yaml(parsed))
}
