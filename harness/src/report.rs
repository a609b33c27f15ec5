//! `RunReportV1`: the auditable outcome of one harness run.
//!
//! A report is digest-stamped. The digest covers the report's normative
//! projection, which is every field except `wall_time_us`, serialized as
//! compact JSON with sorted keys. Two runs of the same world, initial state,
//! and configuration produce the same digest.
//!
//! # Directory layout
//!
//! ```text
//! <dir>/
//!   report.json         compact JSON of the full report
//!   report_digest.txt   "sha256:<hex>" over the normative projection
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use wayfinder_search::engine::{EngineStatus, SearchStatistics};

use crate::policy::RunConfigV1;

pub const REPORT_SCHEMA_VERSION: &str = "run_report.v1";
pub const REPORT_FILENAME: &str = "report.json";
pub const DIGEST_FILENAME: &str = "report_digest.txt";

/// Fields excluded from the digest basis.
const OBSERVATIONAL_FIELDS: &[&str] = &["wall_time_us"];

/// Outcome of a harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunReportV1 {
    pub schema_version: String,
    pub world_id: String,
    /// Engine name as reported by the algorithm.
    pub algorithm: String,
    pub config: RunConfigV1,
    pub status: EngineStatus,
    pub solved: bool,
    /// Plan actions rendered by the world.
    pub plan: Vec<String>,
    pub plan_cost: Option<f64>,
    pub statistics: SearchStatistics,
    /// Peak open-list size (frontier-based algorithms only).
    pub open_high_water: Option<u64>,
    /// Iteration thresholds (iterative deepening only).
    pub thresholds: Vec<f64>,
    /// Shuffle seed, present only when action shuffling was enabled.
    pub seed: Option<u64>,
    /// Observational: excluded from the digest.
    pub wall_time_us: u64,
}

/// Error computing a report digest.
#[derive(Debug, Error)]
#[error("serializing report: {0}")]
pub struct DigestError(#[from] serde_json::Error);

impl RunReportV1 {
    /// Compact, key-sorted JSON of every normative field.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if the report cannot be serialized.
    pub fn digest_basis(&self) -> Result<Vec<u8>, DigestError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(fields) = value.as_object_mut() {
            for name in OBSERVATIONAL_FIELDS {
                fields.remove(*name);
            }
        }
        Ok(serde_json::to_vec(&value)?)
    }

    /// `sha256:<hex>` over [`RunReportV1::digest_basis`].
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if the report cannot be serialized.
    pub fn digest(&self) -> Result<String, DigestError> {
        let basis = self.digest_basis()?;
        Ok(format!("sha256:{}", hex::encode(Sha256::digest(&basis))))
    }
}

/// Error writing a report directory.
#[derive(Debug, Error)]
pub enum ReportWriteError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Digest(#[from] DigestError),
}

/// Error reading or verifying a report directory.
#[derive(Debug, Error)]
pub enum ReportReadError {
    #[error("missing report file {name}")]
    MissingFile { name: &'static str },
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing report: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported schema version {found:?}")]
    SchemaMismatch { found: String },
    #[error(transparent)]
    Digest(#[from] DigestError),
    #[error("digest mismatch: stored {stored}, recomputed {recomputed}")]
    DigestMismatch { stored: String, recomputed: String },
}

/// Write `report` into `dir` (created if missing). Returns the digest.
///
/// Files are written through a temporary sibling and renamed into place.
///
/// # Errors
///
/// Returns [`ReportWriteError`] on serialization or I/O failure.
pub fn write_report(report: &RunReportV1, dir: &Path) -> Result<String, ReportWriteError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportWriteError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let digest = report.digest()?;
    let body = serde_json::to_vec(report).map_err(DigestError::from)?;
    write_atomic(&dir.join(REPORT_FILENAME), &body)?;
    write_atomic(&dir.join(DIGEST_FILENAME), digest.as_bytes())?;
    info!(dir = %dir.display(), %digest, "report written");
    Ok(digest)
}

/// Read a report directory and verify its stored digest.
///
/// # Errors
///
/// Returns [`ReportReadError`] when a file is missing or unreadable, the
/// report does not parse, the schema version is unknown, or the stored
/// digest differs from the recomputed one.
pub fn read_report(dir: &Path) -> Result<RunReportV1, ReportReadError> {
    let body = read_required(dir, REPORT_FILENAME)?;
    let stored = read_required(dir, DIGEST_FILENAME)?;
    let stored = String::from_utf8_lossy(&stored).trim().to_owned();

    let report: RunReportV1 = serde_json::from_slice(&body)?;
    if report.schema_version != REPORT_SCHEMA_VERSION {
        return Err(ReportReadError::SchemaMismatch {
            found: report.schema_version,
        });
    }
    let recomputed = report.digest()?;
    if stored != recomputed {
        return Err(ReportReadError::DigestMismatch { stored, recomputed });
    }
    debug!(dir = %dir.display(), digest = %recomputed, "report verified");
    Ok(report)
}

fn read_required(dir: &Path, name: &'static str) -> Result<Vec<u8>, ReportReadError> {
    let path = dir.join(name);
    match std::fs::read(&path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ReportReadError::MissingFile { name })
        }
        Err(source) => Err(ReportReadError::Io { path, source }),
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ReportWriteError> {
    let temp_name = format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = path.with_file_name(temp_name);
    std::fs::write(&temp_path, content).map_err(|source| ReportWriteError::Io {
        path: temp_path.clone(),
        source,
    })?;
    std::fs::rename(&temp_path, path).map_err(|source| ReportWriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}
