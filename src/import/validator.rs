//! Local validation of entity batches, run before any network call.

use std::collections::HashSet;

use thiserror::Error;

use super::DynamicEntity;

/// Caller-fixable payload problems detected before submission. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required string argument was empty or whitespace.
    #[error("Value cannot be null or whitespace: {name}")]
    BlankArgument {
        /// Name of the offending argument.
        name: &'static str,
    },

    /// At least one entity has an empty or whitespace-only key.
    #[error("Entities must not have null or empty Key identifiers.")]
    BlankEntityKey,

    /// The batch contains entities sharing a key.
    #[error("Collection contains duplicate keys: {keys}.")]
    DuplicateKeys {
        /// All duplicated keys, comma-joined, in first-seen order.
        keys: String,
    },

    /// Entities whose properties repeat an `(id, language)` pair.
    #[error("Entities: {keys} contain duplicated properties")]
    DuplicateProperties {
        /// Keys of all offending entities, comma-joined.
        keys: String,
    },

    /// A unique identifier is required for this operation but was empty.
    #[error("UniqueIdentifier can not be null or empty")]
    BlankUniqueIdentifier,
}

/// Validates a batch of entities, returning the batch ready for submission.
///
/// Rules, in priority order:
/// 1. every entity key must be non-blank,
/// 2. keys must be unique across the batch - the error lists all duplicated
///    keys in first-seen order,
/// 3. within one entity, `(property id, language)` pairs must be unique - the
///    error lists the keys of all offending entities. The same property id in
///    different languages is legal; an absent language and an empty language
///    compare equal.
///
/// Purely local and synchronous; the transport is never touched.
pub fn validate_entities(entities: &[DynamicEntity]) -> Result<Vec<DynamicEntity>, ValidationError> {
    if entities.iter().any(|e| e.key.trim().is_empty()) {
        return Err(ValidationError::BlankEntityKey);
    }

    let duplicate_keys = duplicated_keys(entities);
    if !duplicate_keys.is_empty() {
        return Err(ValidationError::DuplicateKeys {
            keys: duplicate_keys.join(","),
        });
    }

    let offenders: Vec<&str> = entities
        .iter()
        .filter(|e| has_duplicate_properties(e))
        .map(|e| e.key.as_str())
        .collect();
    if !offenders.is_empty() {
        return Err(ValidationError::DuplicateProperties {
            keys: offenders.join(","),
        });
    }

    Ok(entities.to_vec())
}

/// Collects each key that appears more than once, in first-seen order.
fn duplicated_keys(entities: &[DynamicEntity]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for entity in entities {
        if !seen.insert(entity.key.as_str()) && reported.insert(entity.key.as_str()) {
            duplicates.push(entity.key.clone());
        }
    }
    duplicates
}

/// Whether an entity repeats any `(id, language)` pair among its properties.
fn has_duplicate_properties(entity: &DynamicEntity) -> bool {
    let mut seen = HashSet::new();
    entity
        .properties
        .iter()
        .any(|p| !seen.insert((p.id.as_str(), p.language.as_deref().unwrap_or(""))))
}
