//! Mount source resolution.
//!
//! Resolution depends on the working directory at assembly time, so the
//! directory is passed in explicitly rather than read behind the caller's
//! back.

use std::path::{Component, Path, PathBuf};

use crate::error::{HarnessError, Result};

/// Resolve `source` against `working_dir` and clean it lexically
/// (`.` dropped, `..` pops a component, never above the root).
pub fn absolutize(working_dir: &Path, source: &str) -> Result<PathBuf> {
    if source.trim().is_empty() {
        return Err(HarnessError::InvalidInput(
            "invalid mount source: empty path".to_string(),
        ));
    }
    if !working_dir.is_absolute() {
        return Err(HarnessError::InvalidInput(format!(
            "invalid mount source: working directory {} is not absolute",
            working_dir.display()
        )));
    }

    let joined = working_dir.join(source);
    let mut cleaned = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => cleaned.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if cleaned.parent().is_some() {
                    cleaned.pop();
                }
            }
            Component::Normal(part) => cleaned.push(part),
        }
    }
    Ok(cleaned)
}
