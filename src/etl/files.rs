use crate::error::{EtlError, EtlResult};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const JSON_EXTENSION: &str = "json";

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(JSON_EXTENSION))
        .unwrap_or(false)
}

/// Every `*.json` file below `dir`, recursively, in path order.
pub fn collect_json_files(dir: &Path) -> EtlResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(EtlError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Input directory {:?} does not exist", dir),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && is_json_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
