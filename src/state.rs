//! JSON state file so `update` can reuse the report computed by an earlier `fetch`

use crate::error::{RelsyncError, Result};
use crate::report::ReleaseReport;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Write the report as pretty-printed JSON
pub fn save(report: &ReleaseReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    debug!(path = %path.display(), submodules = report.submodules.len(), "saved state");
    Ok(())
}

/// Read a saved report. A missing file is `None`; an unreadable one is an error.
pub fn load(path: &Path) -> Result<Option<ReleaseReport>> {
    if !path.is_file() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let report = serde_json::from_str(&raw).map_err(|e| {
        RelsyncError::state(format!("State file {} is invalid: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), "loaded state");
    Ok(Some(report))
}
