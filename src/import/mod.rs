//! Entity batch types and validation for the import endpoint.
//!
//! A batch is a list of [`DynamicEntity`] values, each carrying a key that is
//! unique within the batch and a set of [`DynamicProperty`] values whose
//! `(id, language)` pairs are unique within the entity. Validation runs
//! locally before any network call; see [`validate_entities`].

mod validator;

pub use validator::{ValidationError, validate_entities};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entity in an import batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DynamicEntity {
    /// Identifier of the entity, unique within the batch.
    pub key: String,

    /// When set, the import removes the entity instead of upserting it.
    #[serde(default)]
    pub delete: bool,

    /// Properties of the entity. Missing collections deserialize to empty.
    #[serde(default)]
    pub properties: Vec<DynamicProperty>,
}

impl DynamicEntity {
    /// Creates an entity with the given key and no properties.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            delete: false,
            properties: Vec::new(),
        }
    }

    /// Adds a property, builder style.
    #[must_use]
    pub fn with_property(mut self, property: DynamicProperty) -> Self {
        self.properties.push(property);
        self
    }
}

/// One property of an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DynamicProperty {
    /// Property identifier.
    pub id: String,

    /// Property value.
    pub value: String,

    /// Optional language tag; absent or empty means "no language".
    #[serde(default)]
    pub language: Option<String>,
}

impl DynamicProperty {
    /// Creates a language-neutral property.
    #[must_use]
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            language: None,
        }
    }

    /// Creates a property in a specific language.
    #[must_use]
    pub fn localized(
        id: impl Into<String>,
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            language: Some(language.into()),
        }
    }
}

/// Request body for the import endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct ImportRequest<'a> {
    #[serde(rename = "Entities")]
    pub entities: &'a [DynamicEntity],
}

/// Identifier assigned by the service when a batch is accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatchResult {
    /// Server-assigned batch id, usable for cross-system tracing.
    pub id: Uuid,
}

/// Outcome of starting an entity import.
#[derive(Debug, Clone)]
pub struct StartImportResponse {
    /// The accepted batch, when the service returned one.
    pub result: Option<ImportBatchResult>,
    /// HTTP status of the import call (202 when accepted).
    pub status_code: u16,
    /// Reason phrase of the import call.
    pub message: String,
}

impl StartImportResponse {
    /// Whether the batch was accepted by the service.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status_code == 202
    }
}
