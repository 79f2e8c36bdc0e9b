//! Model object persistence

use crate::error::{Result, TabfitError};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Serialize an object as pretty JSON to the given path, creating parent
/// directories as needed. The file handle is scoped and released on all
/// exit paths.
pub fn save_object<T: Serialize>(path: &Path, obj: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| TabfitError::PersistenceError(format!("{}: {}", parent.display(), e)))?;
    }

    let file = File::create(path)
        .map_err(|e| TabfitError::PersistenceError(format!("{}: {}", path.display(), e)))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, obj)
        .map_err(|e| TabfitError::PersistenceError(e.to_string()))?;

    Ok(())
}

/// Build the artifact filename for a persisted model.
///
/// Format: `<timestamp>_<model>_<score as percent, 4 decimals>_%.json`.
/// The timestamp carries millisecond precision so reruns within the same
/// second do not collide.
pub fn artifact_filename(model_name: &str, score: f64, now: DateTime<Local>) -> String {
    format!(
        "{}_{}_{:.4}_%.json",
        now.format("%Y-%m-%d_%H-%M-%S%.3f"),
        model_name,
        score * 100.0
    )
}
