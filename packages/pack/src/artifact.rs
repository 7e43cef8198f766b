//! Gzip-compressed JSON pack artifacts on disk.
//!
//! Every write goes to a temporary sibling file first and is then renamed
//! into place, so a reader never sees a partially written pack or index.

use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use hotspot_map_pack_models::{PackData, PackIndex, PackRecords};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// File name of the pack index.
pub const INDEX_FILE: &str = "packs.json.gz";

/// File name of the storage-layer pack records.
pub const RECORDS_FILE: &str = "pack_records.json";

/// Errors from reading or writing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Filesystem or gzip stream failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gzip stream failure outside any file.
    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// File name of a region's pack, e.g. `US-CA.json.gz`.
#[must_use]
pub fn pack_file_name(region: &str) -> String {
    format!("{region}.json.gz")
}

/// Serializes `value` as JSON and gzips it.
///
/// The gzip header carries no timestamp, so identical values encode to
/// identical bytes.
///
/// # Errors
///
/// * If serialization fails
/// * If the compressor fails
pub fn encode_gzip_json<T: Serialize>(value: &T) -> Result<Vec<u8>, ArtifactError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    let json = serde_json::to_vec(value)?;
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`encode_gzip_json`].
///
/// # Errors
///
/// * If the bytes are not valid gzip
/// * If the JSON does not match `T`
pub fn decode_gzip_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ArtifactError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Writes `bytes` to `path` through a temporary sibling and a rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes).map_err(io_error(&tmp))?;
    std::fs::rename(&tmp, path).map_err(io_error(path))?;
    Ok(())
}

fn read_gzip_file<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    decode_gzip_json(&bytes)
}

/// Writes a region's pack into `dir` and returns its compressed size in
/// bytes.
///
/// # Errors
///
/// * If encoding fails
/// * If the file cannot be written
pub fn write_pack(dir: &Path, region: &str, data: &PackData) -> Result<u64, ArtifactError> {
    let bytes = encode_gzip_json(data)?;
    let path = dir.join(pack_file_name(region));
    write_atomic(&path, &bytes)?;

    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());

    Ok(bytes.len() as u64)
}

/// Reads a region's pack from `dir`.
///
/// # Errors
///
/// * If the file is missing or unreadable
/// * If its contents are not a gzip-compressed pack
pub fn read_pack(dir: &Path, region: &str) -> Result<PackData, ArtifactError> {
    read_gzip_file(&dir.join(pack_file_name(region)))
}

/// Reads the pack index from `dir`. A missing index reads as empty.
///
/// # Errors
///
/// * If the index exists but cannot be read or decoded
pub fn read_index(dir: &Path) -> Result<PackIndex, ArtifactError> {
    let path = dir.join(INDEX_FILE);
    if !path.exists() {
        return Ok(PackIndex::default());
    }
    read_gzip_file(&path)
}

/// Writes the pack index into `dir`.
///
/// # Errors
///
/// * If encoding fails
/// * If the file cannot be written
pub fn write_index(dir: &Path, index: &PackIndex) -> Result<(), ArtifactError> {
    let bytes = encode_gzip_json(index)?;
    let path = dir.join(INDEX_FILE);
    write_atomic(&path, &bytes)?;

    log::info!("Wrote {} with {} packs", path.display(), index.packs.len());

    Ok(())
}

/// Reads `pack_records.json` from `dir`. A missing file reads as empty.
///
/// # Errors
///
/// * If the file exists but cannot be read or parsed
pub fn read_records(dir: &Path) -> Result<PackRecords, ArtifactError> {
    let path = dir.join(RECORDS_FILE);
    if !path.exists() {
        return Ok(PackRecords::default());
    }
    let bytes = std::fs::read(&path).map_err(io_error(&path))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Writes `pack_records.json` into `dir` as pretty-printed JSON.
///
/// # Errors
///
/// * If serialization fails
/// * If the file cannot be written
pub fn write_records(dir: &Path, records: &PackRecords) -> Result<(), ArtifactError> {
    let json = serde_json::to_vec_pretty(records)?;
    write_atomic(&dir.join(RECORDS_FILE), &json)
}

/// Region codes of every pack file in `dir`, sorted.
///
/// # Errors
///
/// * If the directory cannot be listed
pub fn list_pack_regions(dir: &Path) -> Result<Vec<String>, ArtifactError> {
    let mut regions = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name == INDEX_FILE {
            continue;
        }
        if let Some(region) = name.strip_suffix(".json.gz") {
            regions.push(region.to_string());
        }
    }
    regions.sort();
    Ok(regions)
}
