//! Redis vector-set backend
//!
//! Maps the backend primitives onto `VADD`, `VREM`, `VEMB`, `VSIM` and
//! `UNLINK`. Calls are blocking; the connection is shared behind a mutex so a
//! single backend can serve several threads one request at a time.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use redis::{Client, Cmd, Connection, Value};
use tracing::{debug, info};

use crate::backend::{HitPayload, RawHit, SimilarityParams, VectorSetBackend};
use crate::config::StoreConfig;
use crate::error::{VectorError, VectorResult};
use crate::types::{Entry, Vector};

/// Vector-set backend over a synchronous Redis connection
pub struct RedisVectorSetBackend {
    connection: Mutex<Connection>,
}

impl RedisVectorSetBackend {
    /// Open a connection using `config.url` and `config.connect_timeout_secs`
    pub fn connect(config: &StoreConfig) -> VectorResult<Self> {
        config.validate()?;
        let client = Client::open(config.url.as_str())?;
        let connection = client
            .get_connection_with_timeout(Duration::from_secs(config.connect_timeout_secs))?;

        info!(url = %config.url, key = %config.key, "Redis vector-set backend connected");

        Ok(Self::from_connection(connection))
    }

    /// Wrap an already established connection
    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    fn connection(&self) -> VectorResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| VectorError::backend("redis", "connection lock poisoned"))
    }
}

fn push_values(cmd: &mut Cmd, vector: &Vector) {
    cmd.arg("VALUES").arg(vector.len()).arg(&vector.data);
}

fn vadd_command(key: &str, entry: &Entry) -> Cmd {
    let mut cmd = redis::cmd("VADD");
    cmd.arg(key);
    push_values(&mut cmd, &entry.vector);
    cmd.arg(&entry.id);
    if let Some(metadata) = &entry.metadata {
        cmd.arg("SETATTR").arg(metadata.as_str());
    }
    cmd
}

fn vsim_command(key: &str, query: &Vector, params: &SimilarityParams) -> Cmd {
    let mut cmd = redis::cmd("VSIM");
    cmd.arg(key);
    push_values(&mut cmd, query);
    cmd.arg("WITHSCORES")
        .arg("WITHATTRIBS")
        .arg("COUNT")
        .arg(params.count);
    if let Some(tolerance) = params.tolerance {
        cmd.arg("EPSILON").arg(tolerance);
    }
    if let Some(filter) = &params.filter {
        cmd.arg("FILTER").arg(filter);
    }
    cmd
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes.clone()).ok(),
        Value::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Double(d) => Some(*d),
        #[allow(clippy::cast_precision_loss)]
        Value::Int(i) => Some(*i as f64),
        other => as_string(other).and_then(|s| s.trim().parse().ok()),
    }
}

/// Decode a `VSIM ... WITHSCORES WITHATTRIBS` reply.
///
/// RESP2 replies are a flat array of `id, score, attributes` triples; RESP3
/// replies map each id to a `[score, attributes]` pair.
fn decode_hits(reply: &Value) -> Vec<RawHit> {
    match reply {
        Value::Array(items) => items
            .chunks(3)
            .map(|chunk| RawHit {
                id: chunk.first().and_then(as_string),
                payload: chunk.get(1).map(|score| HitPayload {
                    score: as_f64(score),
                    attributes: chunk.get(2).and_then(as_string),
                }),
            })
            .collect(),
        Value::Map(pairs) => pairs
            .iter()
            .map(|(id, value)| RawHit {
                id: as_string(id),
                payload: match value {
                    Value::Nil => None,
                    Value::Array(parts) => Some(HitPayload {
                        score: parts.first().and_then(as_f64),
                        attributes: parts.get(1).and_then(as_string),
                    }),
                    score => Some(HitPayload {
                        score: as_f64(score),
                        attributes: None,
                    }),
                },
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl VectorSetBackend for RedisVectorSetBackend {
    fn vector_add(&self, key: &str, entry: &Entry) -> VectorResult<bool> {
        let mut conn = self.connection()?;
        Ok(vadd_command(key, entry).query::<bool>(&mut *conn)?)
    }

    fn vector_remove(&self, key: &str, id: &str) -> VectorResult<bool> {
        let mut conn = self.connection()?;
        Ok(redis::cmd("VREM").arg(key).arg(id).query::<bool>(&mut *conn)?)
    }

    fn vector_fetch(&self, key: &str, id: &str) -> VectorResult<Option<Vector>> {
        let mut conn = self.connection()?;
        let raw: Option<Vec<f64>> = redis::cmd("VEMB").arg(key).arg(id).query(&mut *conn)?;
        #[allow(clippy::cast_possible_truncation)]
        Ok(raw.map(|values| Vector::new(values.into_iter().map(|v| v as f32).collect())))
    }

    fn vector_similarity_search(
        &self,
        key: &str,
        query: &Vector,
        params: &SimilarityParams,
    ) -> VectorResult<Vec<RawHit>> {
        let mut conn = self.connection()?;
        let reply: Value = vsim_command(key, query, params).query(&mut *conn)?;
        let hits = decode_hits(&reply);
        debug!(key = %key, hits = hits.len(), "VSIM completed");
        Ok(hits)
    }

    fn delete_key(&self, key: &str) -> VectorResult<()> {
        let mut conn = self.connection()?;
        redis::cmd("UNLINK").arg(key).query::<()>(&mut *conn)?;
        Ok(())
    }
}
