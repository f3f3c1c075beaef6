//! Flat inner-product vector index.
//!
//! Exact nearest-neighbor search over unit vectors. Row `i` of the index is
//! row `i` of the corpus; the index never stores ids of its own.
//!
//! File layout (little endian):
//!
//! ```text
//! magic "SOVX" | u32 version | u32 dims | u64 count | count * dims f32
//! ```

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use super::embeddings::{dot, normalize_l2};
use crate::error::{HubError, Result};

const MAGIC: &[u8; 4] = b"SOVX";
const FORMAT_VERSION: u32 = 1;
/// magic + version + dims + count
const HEADER_LEN: u64 = 20;

/// Below this many rows scoring stays on the calling thread.
const PARALLEL_THRESHOLD: usize = 4096;

/// Immutable flat index of unit vectors.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dims: usize,
    count: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Build an index from one vector per corpus row, normalizing each.
    ///
    /// Vectors with NaN or infinite components are rejected.
    pub fn build(dims: usize, vectors: impl IntoIterator<Item = Vec<f32>>) -> Result<Self> {
        if dims == 0 {
            return Err(HubError::InvalidInput("index dimension must be positive".into()));
        }
        let mut data = Vec::new();
        let mut count = 0;
        for mut vector in vectors {
            if vector.len() != dims {
                return Err(HubError::DimensionMismatch {
                    expected: dims,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(HubError::InvalidInput(format!(
                    "vector for row {count} has non-finite components"
                )));
            }
            normalize_l2(&mut vector);
            data.extend_from_slice(&vector);
            count += 1;
        }
        debug!(dims, count, "built vector index");
        Ok(Self { dims, count, data })
    }

    #[must_use]
    pub const fn dims(&self) -> usize {
        self.dims
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Top `k` rows by inner product with `query`, best first.
    ///
    /// `query` must already be unit length. `k` is clamped to the row count
    /// and equal scores keep ascending row order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dims {
            return Err(HubError::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }
        let k = k.min(self.count);
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = if self.count >= PARALLEL_THRESHOLD {
            self.data
                .par_chunks_exact(self.dims)
                .map(|row| dot(row, query))
                .enumerate()
                .collect()
        } else {
            self.data
                .chunks_exact(self.dims)
                .map(|row| dot(row, query))
                .enumerate()
                .collect()
        };

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank_order);
            scored.truncate(k);
        }
        scored.sort_by(rank_order);
        Ok(scored)
    }

    /// Write the index to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(MAGIC)?;
        out.write_all(&FORMAT_VERSION.to_le_bytes())?;
        out.write_all(&u32::try_from(self.dims).map_err(|_| too_large("dims"))?.to_le_bytes())?;
        out.write_all(&(self.count as u64).to_le_bytes())?;
        for value in &self.data {
            out.write_all(&value.to_le_bytes())?;
        }
        out.flush()?;
        info!(path = %path.display(), rows = self.count, dims = self.dims, "vector index written");
        Ok(())
    }

    /// Read an index written by [`save`](Self::save). Vectors are
    /// re-normalized on load.
    ///
    /// The header must agree with the file size before anything is
    /// allocated, and every stored component must be finite.
    pub fn load(path: &Path) -> Result<Self> {
        let open_err =
            |err: std::io::Error| HubError::IndexLoad(format!("open {}: {err}", path.display()));
        let file = File::open(path).map_err(open_err)?;
        let file_len = file.metadata().map_err(open_err)?.len();
        let index = Self::read_from(BufReader::new(file), file_len)
            .map_err(|err| HubError::IndexLoad(format!("{}: {err}", path.display())))?;
        info!(path = %path.display(), rows = index.count, dims = index.dims, "vector index loaded");
        Ok(index)
    }

    fn read_from(mut reader: impl Read, file_len: u64) -> std::result::Result<Self, String> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|e| format!("header: {e}"))?;
        if &magic != MAGIC {
            return Err("not a vector index file".to_string());
        }
        let version = read_u32(&mut reader)?;
        if version != FORMAT_VERSION {
            return Err(format!("unsupported format version {version}"));
        }
        let dims = read_u32(&mut reader)? as usize;
        if dims == 0 {
            return Err("zero dimension".to_string());
        }
        let count = read_u64(&mut reader)?;

        let payload = count
            .checked_mul(dims as u64 * 4)
            .ok_or_else(|| format!("row count {count} overflows"))?;
        let available = file_len.saturating_sub(HEADER_LEN);
        if payload > available {
            return Err(format!(
                "truncated: header declares {count} vectors of {dims} dims, \
                 file holds {available} payload bytes"
            ));
        }
        if payload < available {
            return Err("trailing bytes after last vector".to_string());
        }
        let count = usize::try_from(count).map_err(|_| "row count overflow")?;
        let total = count * dims;

        let mut data = Vec::with_capacity(total);
        let mut buf = [0u8; 4];
        for _ in 0..total {
            reader
                .read_exact(&mut buf)
                .map_err(|_| format!("truncated: expected {count} vectors of {dims} dims"))?;
            data.push(f32::from_le_bytes(buf));
        }
        let mut trailing = [0u8; 1];
        if reader.read(&mut trailing).map_err(|e| e.to_string())? != 0 {
            return Err("trailing bytes after last vector".to_string());
        }

        for (row, values) in data.chunks_exact_mut(dims).enumerate() {
            if values.iter().any(|v| !v.is_finite()) {
                return Err(format!("row {row} has non-finite components"));
            }
            normalize_l2(values);
        }
        Ok(Self { dims, count, data })
    }
}

fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

fn read_u32(reader: &mut impl Read) -> std::result::Result<u32, String> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| format!("header: {e}"))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(reader: &mut impl Read) -> std::result::Result<u64, String> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf).map_err(|e| format!("header: {e}"))?;
    Ok(u64::from_le_bytes(buf))
}

fn too_large(what: &str) -> HubError {
    HubError::InvalidInput(format!("index {what} too large for file format"))
}
