//! Safetensors container for a [`MemoryStore`].
//!
//! One file per recording block. Layout:
//!
//! ```text
//! iface/<name>      F64 [C, T]   one tensor per interface
//! trials/onset      F64 [n]
//! trials/offset     F64 [n]
//! __metadata__      { "fs/<name>": "<Hz>", "comment/<name>": "<provenance>",
//!                     "locations": "[…json…]", "bad_channels": "[…json…]" }
//! ```
//!
//! Raw interfaces may also be stored as `F32`; they are widened on load.
//! [`save_store`] writes a sibling temporary file and renames it over the
//! target, so readers see either the old container or the new one.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use ndarray::Array2;
use serde_json::Value;

use crate::error::{EcogError, Result};
use crate::store::{Interface, MemoryStore};

const IFACE_PREFIX: &str = "iface/";
const ONSET_KEY: &str = "trials/onset";
const OFFSET_KEY: &str = "trials/offset";

/// `{dir}/{subject}_B{block}.safetensors`.
pub fn block_path(dir: &Path, subject: &str, block: &str) -> PathBuf {
    dir.join(format!("{subject}_B{block}.safetensors"))
}

// ── Reader ────────────────────────────────────────────────────────────────────

fn parse_header(bytes: &[u8]) -> Result<(serde_json::Map<String, Value>, usize)> {
    let len_bytes: [u8; 8] = bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| EcogError::Store("container too small".into()))?;
    let n = u64::from_le_bytes(len_bytes);
    let end = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_add(8))
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| EcogError::Store(format!("header length {n} exceeds file")))?;
    let header: serde_json::Map<String, Value> = serde_json::from_slice(&bytes[8..end])
        .map_err(|e| EcogError::Store(format!("malformed container header: {e}")))?;
    Ok((header, end))
}

fn tensor_f64(bytes: &[u8], data_start: usize, name: &str, entry: &Value) -> Result<(Vec<usize>, Vec<f64>)> {
    let bad = |what: &str| EcogError::Store(format!("tensor `{name}`: {what}"));
    let shape: Vec<usize> = entry["shape"]
        .as_array()
        .ok_or_else(|| bad("missing shape"))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).ok_or_else(|| bad("bad shape")))
        .collect::<Result<_>>()?;
    let offsets = entry["data_offsets"].as_array().ok_or_else(|| bad("missing data_offsets"))?;
    let (s, e) = match offsets.as_slice() {
        [s, e] => (
            s.as_u64().ok_or_else(|| bad("bad offset"))? as usize,
            e.as_u64().ok_or_else(|| bad("bad offset"))? as usize,
        ),
        _ => return Err(bad("data_offsets must have two entries")),
    };
    let raw = data_start
        .checked_add(s)
        .zip(data_start.checked_add(e))
        .and_then(|(s, e)| bytes.get(s..e))
        .ok_or_else(|| bad("data past end of file"))?;
    let values: Vec<f64> = match entry["dtype"].as_str() {
        Some("F64") => raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect(),
        Some("F32") => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        other => return Err(bad(&format!("unsupported dtype {other:?}"))),
    };
    if values.len() != shape.iter().product::<usize>() {
        return Err(bad("shape does not match data length"));
    }
    Ok((shape, values))
}

/// Load a container written by [`save_store`].
pub fn load_store(path: &Path) -> Result<MemoryStore> {
    let bytes = std::fs::read(path)
        .map_err(|e| EcogError::Store(format!("reading {}: {e}", path.display())))?;
    let (header, data_start) = parse_header(&bytes)?;
    let meta: HashMap<String, String> = match header.get("__metadata__") {
        Some(m) => serde_json::from_value(m.clone())
            .map_err(|e| EcogError::Store(format!("malformed container metadata: {e}")))?,
        None => HashMap::new(),
    };

    let mut store = MemoryStore::default();
    for (key, entry) in &header {
        if key == "__metadata__" {
            continue;
        }
        let (shape, values) = tensor_f64(&bytes, data_start, key, entry)?;
        if let Some(name) = key.strip_prefix(IFACE_PREFIX) {
            let &[c, t] = shape.as_slice() else {
                return Err(EcogError::Store(format!("interface `{name}` is not 2-D")));
            };
            let data = Array2::from_shape_vec((c, t), values)
                .map_err(|e| EcogError::Store(format!("interface `{name}`: {e}")))?;
            let fs = meta
                .get(&format!("fs/{name}"))
                .and_then(|v| v.parse::<f64>().ok())
                .ok_or_else(|| EcogError::Store(format!("interface `{name}` has no sampling rate")))?;
            let comment = meta.get(&format!("comment/{name}")).cloned().unwrap_or_default();
            store.interfaces.insert(name.to_string(), Interface { data, fs, comment });
        } else if key == ONSET_KEY {
            store.onsets = values;
        } else if key == OFFSET_KEY {
            store.offsets = values;
        } else {
            debug!("ignoring tensor `{key}` in {}", path.display());
        }
    }
    if let Some(locs) = meta.get("locations") {
        store.locations = serde_json::from_str(locs)
            .map_err(|e| EcogError::Store(format!("malformed `locations` metadata: {e}")))?;
    }
    if let Some(bad) = meta.get("bad_channels") {
        store.bad = serde_json::from_str::<BTreeSet<usize>>(bad)
            .map_err(|e| EcogError::Store(format!("malformed `bad_channels` metadata: {e}")))?;
    }
    Ok(store)
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Minimal safetensors writer (`F64` tensors + string metadata).
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, Vec<usize>)>,
    metadata: BTreeMap<String, String>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, shape.to_vec()));
    }

    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_metadata(&mut self, key: &str, value: impl Into<String>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        let mut header = serde_json::Map::new();
        if !self.metadata.is_empty() {
            header.insert("__metadata__".into(), serde_json::to_value(&self.metadata)?);
        }
        let mut offset = 0usize;
        for (name, data, shape) in &self.entries {
            header.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": "F64",
                    "shape": shape,
                    "data_offsets": [offset, offset + data.len()],
                }),
            );
            offset += data.len();
        }
        let mut hdr = serde_json::to_vec(&header)?;
        hdr.resize(hdr.len().div_ceil(8) * 8, b' ');
        w.write_all(&(hdr.len() as u64).to_le_bytes())?;
        w.write_all(&hdr)?;
        for (_, data, _) in &self.entries {
            w.write_all(data)?;
        }
        w.flush()?;
        Ok(())
    }

    /// Write to `path` via a temporary sibling and an atomic rename.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        let result = std::fs::File::create(&tmp)
            .map_err(EcogError::from)
            .and_then(|f| self.write_to(std::io::BufWriter::new(f)))
            .and_then(|()| std::fs::rename(&tmp, path).map_err(EcogError::from));
        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        result
    }
}

/// Save every interface, trial list and metadata field of `store` to `path`.
pub fn save_store(store: &MemoryStore, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    for (name, iface) in &store.interfaces {
        w.add_f64_arr2(&format!("{IFACE_PREFIX}{name}"), &iface.data);
        w.add_metadata(&format!("fs/{name}"), iface.fs.to_string());
        w.add_metadata(&format!("comment/{name}"), iface.comment.clone());
    }
    w.add_f64(ONSET_KEY, &store.onsets, &[store.onsets.len()]);
    w.add_f64(OFFSET_KEY, &store.offsets, &[store.offsets.len()]);
    w.add_metadata("locations", serde_json::to_string(&store.locations)?);
    w.add_metadata("bad_channels", serde_json::to_string(&store.bad)?);
    debug!("writing {} interfaces → {}", store.interfaces.len(), path.display());
    w.write(path)
}
