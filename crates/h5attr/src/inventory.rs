use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Sorted names of the `.h5` regular files directly inside `dir`.
pub fn list_h5_files(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let is_file = entry
            .file_type()
            .map(|t| t.is_file())
            .map_err(|e| Error::io(entry.path(), e))?;
        if !is_file {
            continue;
        }
        let path = entry.path();
        let is_h5 = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("h5"));
        if let (true, Some(name)) = (is_h5, path.file_name().and_then(|n| n.to_str())) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
