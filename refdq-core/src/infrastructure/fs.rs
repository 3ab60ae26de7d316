// refdq-core/src/infrastructure/fs.rs

use std::io::Write;
use std::path::Path;

use crate::domain::session::SessionReport;
use crate::infrastructure::error::InfrastructureError;

/// Writes `content` to a sibling temp file, then renames it over `path`.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Pretty JSON dump of a session.
pub fn write_report(path: &Path, report: &SessionReport) -> Result<(), InfrastructureError> {
    let json = serde_json::to_string_pretty(report)?;
    atomic_write(path, json)?;
    tracing::info!("Session report written to {:?}", path);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_overwrites_existing() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("report.json");

        atomic_write(&file_path, "{}")?;
        atomic_write(&file_path, "{\"a\": 1}")?;

        assert_eq!(fs::read_to_string(file_path)?, "{\"a\": 1}");
        Ok(())
    }
}
