//! Output binary path resolution

use super::BuildError;
use std::path::{Component, Path, PathBuf};

/// Computes where the built binary goes.
///
/// An explicit `output` wins and is made absolute against `working_dir`.
/// Otherwise the binary is named after the last segment of `working_dir` and
/// placed inside it; module projects replace `_` with `-` in that name, the
/// way the go command names module binaries.
///
/// `temp_dir` must already be set: resolution only makes sense once the
/// workspace has been relocated.
pub fn resolve_output_path(
    temp_dir: &Path,
    working_dir: &Path,
    is_module: bool,
    output: Option<&Path>,
) -> Result<PathBuf, BuildError> {
    if temp_dir.as_os_str().is_empty() {
        return Err(BuildError::CallSequenceViolation(
            "output path can only be resolved after the workspace is relocated".to_string(),
        ));
    }

    if let Some(output) = output.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(absolutize(working_dir, output));
    }

    let mut name = working_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if is_module {
        name = name.replace('_', "-");
    }

    Ok(working_dir.join(name))
}

/// Joins `path` onto `base` unless it is already absolute, then removes `.`
/// and `..` components without touching the filesystem.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
