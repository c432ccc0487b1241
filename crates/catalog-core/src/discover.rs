use crate::error::{CatalogError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// One candidate definition handed to the pipeline by file discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub file_name: String,
    /// Path relative to the source root, `/`-separated.
    pub file_path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(
        file_name: impl Into<String>,
        file_path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_path: file_path.into(),
            content: content.into(),
        }
    }

    /// Name of the directory directly containing the file, or `""` at the root.
    pub fn parent_dir(&self) -> &str {
        self.file_path
            .rsplit_once('/')
            .and_then(|(dir, _)| dir.rsplit('/').next())
            .unwrap_or("")
    }
}

/// Recursively collect every `.md` file under `source_dir`, sorted by
/// relative path. `.git` is skipped; unreadable files are logged and skipped.
pub fn discover(source_dir: &Path) -> Result<Vec<SourceFile>> {
    if !source_dir.is_dir() {
        return Err(CatalogError::SourceNotFound(
            source_dir.display().to_string(),
        ));
    }
    let mut out = Vec::new();
    walk(source_dir, source_dir, &mut out)?;
    out.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    Ok(out)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<SourceFile>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if name == ".git" {
                continue;
            }
            walk(root, &path, out)?;
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(&path);
        match std::fs::read_to_string(&path) {
            Ok(content) => out.push(SourceFile {
                file_name: name,
                file_path: paths::to_slash(rel),
                content,
            }),
            Err(e) => warn!("skipping unreadable file {}: {e}", path.display()),
        }
    }
    Ok(())
}
