//! JSON documents on disk, replaced wholesale with write-to-temp-then-rename.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{CoachError, Result};

/// Read a JSON document. A missing file is `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CoachError::io(path, e)),
    };
    let value = serde_json::from_str(&content).map_err(|e| CoachError::json(path, e))?;
    Ok(Some(value))
}

pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(|e| CoachError::json(path, e))?;
    write_atomic(path, content.as_bytes())
}

/// Write `content` next to `path` first and rename it into place, so readers
/// only ever observe the previous or the new document.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CoachError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, content).map_err(|e| CoachError::io(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(CoachError::io(path, e));
    }
    debug!(path = %path.display(), bytes = content.len(), "document persisted");
    Ok(())
}

pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("document"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn missing_document_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let value: Option<BTreeMap<String, u32>> =
            read_json(&dir.path().join("absent.json")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn write_then_read_should_work() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let doc = BTreeMap::from([("116A".to_string(), 800u32)]);

        write_json_atomic(&path, &doc).unwrap();

        let back: BTreeMap<String, u32> = read_json(&path).unwrap().unwrap();
        assert_eq!(back, doc);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn interrupted_write_leaves_primary_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &BTreeMap::from([("a", 1)])).unwrap();

        // a crash after the temp write but before the rename leaves a torn temp file
        fs::write(temp_path(&path), b"{\"a\": 1, \"b\"").unwrap();
        let before: BTreeMap<String, u32> = read_json(&path).unwrap().unwrap();
        assert_eq!(before.get("a"), Some(&1));

        write_json_atomic(&path, &BTreeMap::from([("a", 1), ("b", 2)])).unwrap();
        let after: BTreeMap<String, u32> = read_json(&path).unwrap().unwrap();
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn corrupt_document_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "not json").unwrap();
        let err = read_json::<BTreeMap<String, u32>>(&path).unwrap_err();
        assert!(matches!(err, CoachError::Json { .. }));
    }
}
