//! Partial-success aggregation for batch operations.
//!
//! A single request can logically represent N independent sub-operations
//! (batch file lookup, link uploads). [`PartialSuccessResponse`] keeps the
//! per-item outcomes in two disjoint maps so that one item's failure never
//! invalidates the others. Every "add" returns a new instance; a response
//! handed to a caller is never mutated afterwards, which makes incrementally
//! built batch results safe to share across concurrent readers.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Deserialize;

/// Batch outcome split into disjoint succeeded / failed mappings.
///
/// Invariant: no key appears in both maps.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSuccessResponse<K, S, F>
where
    K: Eq + Hash,
{
    #[serde(default = "HashMap::new")]
    succeeded: HashMap<K, S>,
    #[serde(default = "HashMap::new")]
    failures: HashMap<K, F>,
}

impl<K, S, F> Default for PartialSuccessResponse<K, S, F>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<K, S, F> PartialSuccessResponse<K, S, F>
where
    K: Eq + Hash,
{
    /// A response with no outcomes recorded.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            succeeded: HashMap::new(),
            failures: HashMap::new(),
        }
    }

    /// The successful outcomes, keyed per item.
    #[must_use]
    pub fn succeeded(&self) -> &HashMap<K, S> {
        &self.succeeded
    }

    /// The failed outcomes, keyed per item.
    #[must_use]
    pub fn failures(&self) -> &HashMap<K, F> {
        &self.failures
    }

    /// Whether every item succeeded.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<K, S, F> PartialSuccessResponse<K, S, F>
where
    K: Eq + Hash + Clone,
    S: Clone,
    F: Clone,
{
    /// Returns a new response with an additional successful outcome.
    #[must_use]
    pub fn add_success(&self, key: K, value: S) -> Self {
        let mut succeeded = self.succeeded.clone();
        succeeded.insert(key, value);
        Self {
            succeeded,
            failures: self.failures.clone(),
        }
    }

    /// Returns a new response with an additional failed outcome.
    #[must_use]
    pub fn add_failure(&self, key: K, value: F) -> Self {
        let mut failures = self.failures.clone();
        failures.insert(key, value);
        Self {
            succeeded: self.succeeded.clone(),
            failures,
        }
    }

    /// Returns a new response with every successful value transformed.
    #[must_use]
    pub fn map<S2>(&self, mut transform: impl FnMut(&S) -> S2) -> PartialSuccessResponse<K, S2, F> {
        PartialSuccessResponse {
            succeeded: self
                .succeeded
                .iter()
                .map(|(k, v)| (k.clone(), transform(v)))
                .collect(),
            failures: self.failures.clone(),
        }
    }

    /// Returns a new response with every key transformed in both maps.
    #[must_use]
    pub fn map_keys(&self, mut transform: impl FnMut(&K) -> K) -> Self {
        Self {
            succeeded: self
                .succeeded
                .iter()
                .map(|(k, v)| (transform(k), v.clone()))
                .collect(),
            failures: self
                .failures
                .iter()
                .map(|(k, v)| (transform(k), v.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    type Resp = PartialSuccessResponse<String, u32, String>;

    // ==================== Functional Update Tests ====================

    #[test]
    fn test_empty_has_no_outcomes() {
        let resp = Resp::empty();
        assert!(resp.succeeded().is_empty());
        assert!(resp.failures().is_empty());
        assert!(resp.is_complete_success());
    }

    #[test]
    fn test_add_success_does_not_mutate_original() {
        let original = Resp::empty();
        let updated = original.add_success("a".to_string(), 1);
        assert!(original.succeeded().is_empty());
        assert_eq!(updated.succeeded().get("a"), Some(&1));
    }

    #[test]
    fn test_add_failure_does_not_mutate_original() {
        let original = Resp::empty().add_success("a".to_string(), 1);
        let updated = original.add_failure("b".to_string(), "boom".to_string());
        assert!(original.failures().is_empty());
        assert_eq!(updated.succeeded().len(), 1);
        assert_eq!(updated.failures().get("b"), Some(&"boom".to_string()));
        assert!(!updated.is_complete_success());
    }

    #[test]
    fn test_maps_stay_disjoint() {
        let resp = Resp::empty()
            .add_success("a".to_string(), 1)
            .add_failure("b".to_string(), "boom".to_string());
        for key in resp.succeeded().keys() {
            assert!(!resp.failures().contains_key(key));
        }
    }

    #[test]
    fn test_map_transforms_successes_only() {
        let resp = Resp::empty()
            .add_success("a".to_string(), 2)
            .add_failure("b".to_string(), "boom".to_string());
        let doubled = resp.map(|v| v * 2);
        assert_eq!(doubled.succeeded().get("a"), Some(&4));
        assert_eq!(doubled.failures().len(), 1);
    }

    #[test]
    fn test_map_keys_transforms_both_maps() {
        let resp = Resp::empty()
            .add_success("a".to_string(), 1)
            .add_failure("b".to_string(), "boom".to_string());
        let upper = resp.map_keys(|k| k.to_uppercase());
        assert!(upper.succeeded().contains_key("A"));
        assert!(upper.failures().contains_key("B"));
    }

    // ==================== Wire Decode Tests ====================

    #[test]
    fn test_deserializes_from_wire_shape() {
        let json = r#"{"succeeded":{"id1":7},"failures":{"id2":"missing"}}"#;
        let resp: Resp = serde_json::from_str(json).unwrap();
        assert_eq!(resp.succeeded().get("id1"), Some(&7));
        assert_eq!(resp.failures().get("id2"), Some(&"missing".to_string()));
    }

    #[test]
    fn test_missing_maps_default_to_empty() {
        let resp: Resp = serde_json::from_str("{}").unwrap();
        assert!(resp.succeeded().is_empty());
        assert!(resp.failures().is_empty());
    }
}
