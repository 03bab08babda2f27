//! In-memory vector-set backend for testing

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::backend::{RawHit, SimilarityParams, VectorSetBackend};
use crate::error::{VectorError, VectorResult};
use crate::predicate::Predicate;
use crate::types::{Entry, Vector};

const BACKEND: &str = "memory";

type VectorSet = HashMap<String, (Vector, Option<String>)>;

/// In-memory backend mirroring vector-set semantics.
///
/// Scores use the `(1 + cosine) / 2` scale of the server, so they fall in
/// `[0, 1]` with 1 meaning identical direction.
#[derive(Debug, Default)]
pub struct InMemoryVectorSetBackend {
    sets: RwLock<HashMap<String, VectorSet>>,
}

impl InMemoryVectorSetBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements stored under `key`
    pub fn cardinality(&self, key: &str) -> VectorResult<usize> {
        Ok(self.read()?.get(key).map_or(0, HashMap::len))
    }

    fn read(&self) -> VectorResult<RwLockReadGuard<'_, HashMap<String, VectorSet>>> {
        self.sets
            .read()
            .map_err(|_| VectorError::backend(BACKEND, "lock poisoned"))
    }

    fn write(&self) -> VectorResult<RwLockWriteGuard<'_, HashMap<String, VectorSet>>> {
        self.sets
            .write()
            .map_err(|_| VectorError::backend(BACKEND, "lock poisoned"))
    }
}

fn similarity_score(query: &Vector, candidate: &Vector) -> f64 {
    (1.0 + f64::from(query.cosine_similarity(candidate))) / 2.0
}

impl VectorSetBackend for InMemoryVectorSetBackend {
    fn vector_add(&self, key: &str, entry: &Entry) -> VectorResult<bool> {
        let mut sets = self.write()?;
        let set = sets.entry(key.to_string()).or_default();

        if let Some((existing, _)) = set.values().next() {
            if existing.len() != entry.vector.len() {
                return Err(VectorError::InvalidDimension {
                    expected: existing.len(),
                    actual: entry.vector.len(),
                });
            }
        }

        set.insert(
            entry.id.clone(),
            (
                entry.vector.clone(),
                entry.metadata.as_ref().map(|m| m.as_str().to_string()),
            ),
        );
        Ok(true)
    }

    fn vector_remove(&self, key: &str, id: &str) -> VectorResult<bool> {
        let mut sets = self.write()?;
        let Some(set) = sets.get_mut(key) else {
            return Ok(false);
        };
        let removed = set.remove(id).is_some();
        if set.is_empty() {
            sets.remove(key);
        }
        Ok(removed)
    }

    fn vector_fetch(&self, key: &str, id: &str) -> VectorResult<Option<Vector>> {
        Ok(self
            .read()?
            .get(key)
            .and_then(|set| set.get(id))
            .map(|(vector, _)| vector.clone()))
    }

    fn vector_similarity_search(
        &self,
        key: &str,
        query: &Vector,
        params: &SimilarityParams,
    ) -> VectorResult<Vec<RawHit>> {
        let predicate = params
            .filter
            .as_deref()
            .map(Predicate::parse)
            .transpose()
            .map_err(|e| VectorError::backend(BACKEND, format!("invalid filter expression: {e}")))?;

        let sets = self.read()?;
        let Some(set) = sets.get(key) else {
            return Ok(Vec::new());
        };
        if let Some((stored, _)) = set.values().next() {
            if stored.len() != query.len() {
                return Err(VectorError::InvalidDimension {
                    expected: stored.len(),
                    actual: query.len(),
                });
            }
        }

        let floor = params.tolerance.map(|tolerance| 1.0 - tolerance);
        let mut hits: Vec<(f64, &String, &Option<String>)> = set
            .iter()
            .map(|(id, (vector, attributes))| (similarity_score(query, vector), id, attributes))
            .filter(|(score, _, _)| floor.map_or(true, |floor| *score >= floor))
            .filter(|(_, _, attributes)| {
                predicate
                    .as_ref()
                    .map_or(true, |p| p.matches(attributes.as_deref()))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });
        hits.truncate(params.count);

        Ok(hits
            .into_iter()
            .map(|(score, id, attributes)| RawHit::scored(id.clone(), score, attributes.clone()))
            .collect())
    }

    fn delete_key(&self, key: &str) -> VectorResult<()> {
        self.write()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    fn entry(id: &str, data: Vec<f32>, metadata: Option<&str>) -> Entry {
        Entry {
            id: id.to_string(),
            vector: Vector::new(data),
            metadata: metadata.map(Metadata::from),
        }
    }

    fn params(count: usize) -> SimilarityParams {
        SimilarityParams {
            count,
            tolerance: None,
            filter: None,
        }
    }

    #[test]
    fn add_fetch_and_replace() {
        let backend = InMemoryVectorSetBackend::new();
        assert!(backend.vector_add("k", &entry("a", vec![1.0, 0.0], None)).unwrap());
        assert!(backend.vector_add("k", &entry("a", vec![0.0, 1.0], None)).unwrap());

        assert_eq!(
            backend.vector_fetch("k", "a").unwrap(),
            Some(Vector::new(vec![0.0, 1.0]))
        );
        assert_eq!(backend.cardinality("k").unwrap(), 1);
    }

    #[test]
    fn rejects_mismatched_dimension() {
        let backend = InMemoryVectorSetBackend::new();
        backend.vector_add("k", &entry("a", vec![1.0, 0.0], None)).unwrap();

        let err = backend
            .vector_add("k", &entry("b", vec![1.0, 0.0, 0.0], None))
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidDimension { expected: 2, actual: 3 }));
    }

    #[test]
    fn search_rejects_query_of_other_dimension() {
        let backend = InMemoryVectorSetBackend::new();
        backend.vector_add("k", &entry("a", vec![1.0, 0.0], None)).unwrap();

        let err = backend
            .vector_similarity_search("k", &Vector::new(vec![0.0, 0.0, 1.0]), &params(10))
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidDimension { expected: 2, actual: 3 }));

        let hits = backend
            .vector_similarity_search("missing", &Vector::new(vec![0.0, 0.0, 1.0]), &params(10))
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn remove_reports_presence() {
        let backend = InMemoryVectorSetBackend::new();
        backend.vector_add("k", &entry("a", vec![1.0], None)).unwrap();

        assert!(backend.vector_remove("k", "a").unwrap());
        assert!(!backend.vector_remove("k", "a").unwrap());
        assert_eq!(backend.cardinality("k").unwrap(), 0);
    }

    #[test]
    fn search_orders_by_score_and_truncates() {
        let backend = InMemoryVectorSetBackend::new();
        backend.vector_add("k", &entry("far", vec![0.0, 1.0], None)).unwrap();
        backend.vector_add("k", &entry("near", vec![1.0, 0.1], None)).unwrap();
        backend.vector_add("k", &entry("same", vec![1.0, 0.0], None)).unwrap();

        let hits = backend
            .vector_similarity_search("k", &Vector::new(vec![1.0, 0.0]), &params(2))
            .unwrap();

        let ids: Vec<_> = hits.iter().map(|h| h.id.as_deref().unwrap()).collect();
        assert_eq!(ids, ["same", "near"]);
        let top = hits[0].payload.as_ref().unwrap().score.unwrap();
        assert!((top - 1.0).abs() < 1e-6);
    }

    #[test]
    fn search_applies_tolerance() {
        let backend = InMemoryVectorSetBackend::new();
        backend.vector_add("k", &entry("same", vec![1.0, 0.0], None)).unwrap();
        backend.vector_add("k", &entry("orthogonal", vec![0.0, 1.0], None)).unwrap();

        let hits = backend
            .vector_similarity_search(
                "k",
                &Vector::new(vec![1.0, 0.0]),
                &SimilarityParams {
                    tolerance: Some(0.2),
                    ..params(10)
                },
            )
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_deref(), Some("same"));
    }

    #[test]
    fn search_applies_filter_to_attributes() {
        let backend = InMemoryVectorSetBackend::new();
        backend
            .vector_add("k", &entry("alice", vec![1.0, 0.0], Some(r#"{"name":"alice"}"#)))
            .unwrap();
        backend
            .vector_add("k", &entry("bob", vec![1.0, 0.0], Some(r#"{"name":"bob"}"#)))
            .unwrap();
        backend.vector_add("k", &entry("anon", vec![1.0, 0.0], None)).unwrap();

        let hits = backend
            .vector_similarity_search(
                "k",
                &Vector::new(vec![1.0, 0.0]),
                &SimilarityParams {
                    filter: Some(r#".name=="bob""#.to_string()),
                    ..params(10)
                },
            )
            .unwrap();

        assert_eq!(hits, vec![RawHit::scored("bob", 1.0, Some(r#"{"name":"bob"}"#.to_string()))]);
    }

    #[test]
    fn malformed_filter_is_a_backend_error() {
        let backend = InMemoryVectorSetBackend::new();
        backend.vector_add("k", &entry("a", vec![1.0], None)).unwrap();

        let result = backend.vector_similarity_search(
            "k",
            &Vector::new(vec![1.0]),
            &SimilarityParams {
                filter: Some(".name ==".to_string()),
                ..params(10)
            },
        );
        assert!(matches!(result, Err(VectorError::Backend { backend: "memory", .. })));
    }

    #[test]
    fn delete_key_drops_everything() {
        let backend = InMemoryVectorSetBackend::new();
        backend.vector_add("k", &entry("a", vec![1.0], None)).unwrap();
        backend.delete_key("k").unwrap();

        assert_eq!(backend.cardinality("k").unwrap(), 0);
        assert_eq!(backend.vector_fetch("k", "a").unwrap(), None);
    }
}
