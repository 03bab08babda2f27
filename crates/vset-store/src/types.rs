//! Core types for vector-set storage

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use vset_filter::FilterExpr;

use crate::error::{VectorError, VectorResult};

/// Default cap on the number of matches a search returns
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Vector representation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector {
    /// Vector data
    pub data: Vec<f32>,
}

impl Vector {
    /// Create a new vector
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Number of dimensions
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the vector has no dimensions
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Calculate cosine similarity with another vector.
    ///
    /// Vectors of different dimensions have a similarity of 0.
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.len() != other.len() {
            return 0.0;
        }

        let dot: f32 = self.data.iter().zip(&other.data).map(|(a, b)| a * b).sum();
        let mag_a: f32 = self.data.iter().map(|x| x * x).sum::<f32>().sqrt();
        let mag_b: f32 = other.data.iter().map(|x| x * x).sum::<f32>().sqrt();

        if mag_a == 0.0 || mag_b == 0.0 {
            0.0
        } else {
            dot / (mag_a * mag_b)
        }
    }

    /// Check that the vector can be written to or queried against a vector
    /// set: at least one dimension and only finite components
    pub fn validate(&self) -> VectorResult<()> {
        if self.data.is_empty() {
            return Err(VectorError::invalid_input("vector cannot be empty"));
        }
        if let Some(position) = self.data.iter().position(|x| !x.is_finite()) {
            return Err(VectorError::invalid_input(format!(
                "vector component {position} is not a finite number"
            )));
        }
        Ok(())
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

/// Opaque attribute payload stored next to a vector.
///
/// The store round-trips it verbatim. Filters only see its fields when it
/// holds a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(String);

impl Metadata {
    /// Wrap a raw attribute payload
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw payload
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw payload
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Serialize a record as JSON metadata
    pub fn from_record<T: Serialize>(record: &T) -> VectorResult<Self> {
        Ok(Self(serde_json::to_string(record)?))
    }

    /// Parse JSON metadata back into a record
    pub fn to_record<T: DeserializeOwned>(&self) -> VectorResult<T> {
        Ok(serde_json::from_str(&self.0)?)
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Metadata {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Metadata {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// A vector as written to the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub vector: Vector,
    pub metadata: Option<Metadata>,
}

/// One similarity search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Entry ID
    pub id: String,
    /// Similarity score reported by the backend
    pub score: f64,
    /// Stored vector
    pub vector: Vector,
    /// Stored attribute payload
    pub metadata: Option<Metadata>,
}

/// Similarity search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query vector; a request without one matches nothing
    pub query_vector: Option<Vector>,
    /// Metadata filter
    pub filter: Option<FilterExpr>,
    /// Maximum number of matches
    pub max_results: usize,
    /// Similarity floor, only honoured strictly inside (0, 1)
    pub min_score: f64,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query_vector: None,
            filter: None,
            max_results: DEFAULT_MAX_RESULTS,
            min_score: 0.0,
        }
    }
}

impl SearchRequest {
    /// Create a new search request
    pub fn new(query_vector: Vector) -> Self {
        Self {
            query_vector: Some(query_vector),
            ..Default::default()
        }
    }

    /// Set filter
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set result limit
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set minimum score threshold
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Backend tolerance derived from `min_score`.
    ///
    /// The backend bounds distance rather than similarity, so a floor `s` in
    /// (0, 1) becomes a tolerance of `1 - s`. Floors outside that range are
    /// ignored, not clamped.
    pub fn tolerance(&self) -> Option<f64> {
        (self.min_score > 0.0 && self.min_score < 1.0).then(|| 1.0 - self.min_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_defaults() {
        let req = SearchRequest::new(Vector::new(vec![1.0, 0.0]));
        assert_eq!(req.max_results, 10);
        assert_eq!(req.min_score, 0.0);
        assert!(req.filter.is_none());
        assert_eq!(req.tolerance(), None);
    }

    #[test]
    fn tolerance_is_inverse_of_min_score() {
        let req = SearchRequest::new(Vector::new(vec![1.0])).with_min_score(0.8);
        let tolerance = req.tolerance().unwrap();
        assert!((tolerance - 0.2).abs() < 1e-9);
    }

    #[test]
    fn tolerance_ignores_bounds_and_out_of_range() {
        for min_score in [0.0, 1.0, -0.5, 1.5] {
            let req = SearchRequest::new(Vector::new(vec![1.0])).with_min_score(min_score);
            assert_eq!(req.tolerance(), None, "min_score {min_score}");
        }
    }

    #[test]
    fn metadata_record_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Sentence {
            name: String,
            age: u32,
        }

        let sentence = Sentence {
            name: "alice".to_string(),
            age: 30,
        };
        let metadata = Metadata::from_record(&sentence).unwrap();

        assert_eq!(metadata.as_str(), r#"{"name":"alice","age":30}"#);
        assert_eq!(metadata.to_record::<Sentence>().unwrap(), sentence);
    }

    #[test]
    fn metadata_is_opaque() {
        let metadata = Metadata::new("not json at all");
        assert_eq!(metadata.to_string(), "not json at all");
        assert!(metadata.to_record::<serde_json::Value>().is_err());
    }

    #[test]
    fn validate_rejects_empty_and_non_finite_vectors() {
        assert!(Vector::new(vec![0.5, -1.0]).validate().is_ok());
        assert!(matches!(
            Vector::default().validate(),
            Err(VectorError::InvalidInput(_))
        ));
        assert!(matches!(
            Vector::new(vec![1.0, f32::NAN]).validate(),
            Err(VectorError::InvalidInput(_))
        ));
        assert!(Vector::new(vec![f32::INFINITY]).validate().is_err());
    }

    #[test]
    fn vector_serializes_as_plain_array() {
        let json = serde_json::to_string(&Vector::new(vec![0.5, 0.25])).unwrap();
        assert_eq!(json, "[0.5,0.25]");
    }

    #[test]
    fn cosine_similarity_of_different_lengths_is_zero() {
        let a = Vector::new(vec![1.0, 0.0]);
        let b = Vector::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors() {
        let a = Vector::new(vec![1.0, 0.0]);
        let b = Vector::new(vec![0.0, 1.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
        assert!((a.cosine_similarity(&a) - 1.0).abs() < 1e-6);
    }
}
