//! Embedding capability
//!
//! Turning text into vectors is left to an external model; the store only
//! needs a synchronous `embed` call.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{VectorError, VectorResult};
use crate::types::Vector;

/// Text embedding model
pub trait Embedder: Send + Sync {
    /// Dimension of the vectors this model produces
    fn dimension(&self) -> usize;

    /// Embed one text
    fn embed(&self, text: &str) -> VectorResult<Vector>;
}

/// Embedder returning canned vectors for known texts and a constant vector
/// otherwise
#[derive(Debug, Default)]
pub struct MockEmbedder {
    dimension: usize,
    responses: Mutex<HashMap<String, Vector>>,
}

impl MockEmbedder {
    /// Create a mock producing vectors of `dimension` components
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            responses: Mutex::new(HashMap::new()),
        }
    }

    /// Return `vector` whenever `text` is embedded
    pub fn with_response(self, text: impl Into<String>, vector: Vector) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(text.into(), vector);
        }
        self
    }

    fn generate_constant_embedding(&self) -> Vector {
        Vector::new(vec![0.1; self.dimension])
    }
}

impl Embedder for MockEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> VectorResult<Vector> {
        let responses = self
            .responses
            .lock()
            .map_err(|_| VectorError::backend("mock-embedding", "lock poisoned"))?;
        Ok(responses
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.generate_constant_embedding()))
    }
}
