//! Persistent trajectory records stored under `.nanoagent/` by default.
//!
//! One record is written per run, on every exit path, so a run is auditable
//! regardless of how it ended. Records are never updated after being
//! written.

use crate::api::Telemetry;
use crate::types::{Message, RunOutcome};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default root directory for the trajectory store.
const DEFAULT_STORE_ROOT: &str = ".nanoagent";
/// Subdirectory under the store root that contains per-run JSON files.
const TRAJECTORIES_DIR: &str = "trajectories";
/// Canonical file extension for persisted trajectories.
const TRAJECTORY_FILE_EXT: &str = "json";
/// On-disk schema version for [`TrajectoryRecord`].
const TRAJECTORY_FILE_VERSION: u32 = 1;

/// The complete durable record of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// File-format version for forward compatibility checks.
    version: u32,
    /// Stable run identifier, also used as the default file name.
    pub id: String,
    /// The task text the run was started with.
    pub task: String,
    /// Human-readable terminal status label.
    pub exit_status: String,
    /// Submitted result, last thought, or error message.
    pub result: String,
    /// Optional structured context, e.g. a captured failure trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<serde_json::Value>,
    /// Ordered conversation transcript.
    pub messages: Vec<Message>,
    /// Telemetry snapshot read from the model port at exit.
    pub telemetry: Telemetry,
    /// Save timestamp in Unix epoch milliseconds.
    pub saved_at_millis: u64,
}

impl TrajectoryRecord {
    /// Assemble the record for one finished run.
    pub fn new(
        task: &str,
        messages: Vec<Message>,
        telemetry: Telemetry,
        outcome: &RunOutcome,
    ) -> Self {
        Self {
            version: TRAJECTORY_FILE_VERSION,
            id: generate_run_id(),
            task: task.to_string(),
            exit_status: outcome.exit_status.as_str().to_string(),
            result: outcome.result.clone(),
            extra_info: outcome.extra_info.clone(),
            messages,
            telemetry,
            saved_at_millis: now_unix_millis(),
        }
    }
}

/// Where a run's record lands on disk.
#[derive(Debug, Clone)]
enum RecordTarget {
    /// Store directory; the file name is derived from the run id.
    Directory(PathBuf),
    /// Exact file path requested by the caller (`--output`).
    ExplicitFile(PathBuf),
}

/// Filesystem sink for trajectory records.
#[derive(Debug, Clone)]
pub struct TrajectoryRecorder {
    target: RecordTarget,
}

impl TrajectoryRecorder {
    /// Open/create the default local store (`.nanoagent/trajectories`).
    pub fn open_default() -> Result<Self, String> {
        Self::open(DEFAULT_STORE_ROOT)
    }

    /// Open/create a store rooted under the given directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, String> {
        let dir = root.as_ref().join(TRAJECTORIES_DIR);
        fs::create_dir_all(&dir)
            .map_err(|e| format!("failed to create trajectory directory {}: {e}", dir.display()))?;
        Ok(Self {
            target: RecordTarget::Directory(dir),
        })
    }

    /// Recorder that writes exactly one explicit file path.
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            target: RecordTarget::ExplicitFile(path.into()),
        }
    }

    /// Write one record and return the path it landed at.
    pub fn persist(&self, record: &TrajectoryRecord) -> Result<PathBuf, String> {
        let path = match &self.target {
            RecordTarget::Directory(dir) => {
                dir.join(format!("{}.{TRAJECTORY_FILE_EXT}", record.id))
            }
            RecordTarget::ExplicitFile(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| {
                        format!("failed to create output directory {}: {e}", parent.display())
                    })?;
                }
                path.clone()
            }
        };

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| format!("failed to serialize trajectory {}: {e}", record.id))?;
        // Write to a sibling temporary file first so partial writes do not
        // corrupt an existing record at the same path.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| {
            format!(
                "failed to write temporary trajectory file {}: {e}",
                tmp_path.display()
            )
        })?;
        // Rename is atomic on most filesystems, making this "all or nothing".
        fs::rename(&tmp_path, &path).map_err(|e| {
            format!(
                "failed to move trajectory file into place {}: {e}",
                path.display()
            )
        })?;
        Ok(path)
    }
}

/// Load a persisted record, rejecting unknown schema versions.
pub fn load_trajectory(path: impl AsRef<Path>) -> Result<TrajectoryRecord, String> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read trajectory {}: {e}", path.display()))?;
    let record: TrajectoryRecord = serde_json::from_str(&raw)
        .map_err(|e| format!("failed to parse trajectory {}: {e}", path.display()))?;
    if record.version != TRAJECTORY_FILE_VERSION {
        return Err(format!(
            "unsupported trajectory file version {} for {}",
            record.version,
            path.display()
        ));
    }
    Ok(record)
}

/// Current Unix timestamp in milliseconds.
fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Generate a unique-ish hex run id (`xxxx-xxxx-xxxx-xxxx`).
pub fn generate_run_id() -> String {
    let mut bytes = [0u8; 8];
    // OS RNG is sufficient for low-collision opaque IDs.
    OsRng.fill_bytes(&mut bytes);
    let hex = format!("{:016x}", u64::from_be_bytes(bytes));
    format!(
        "{}-{}-{}-{}",
        &hex[0..4],
        &hex[4..8],
        &hex[8..12],
        &hex[12..16]
    )
}
