//! Canonical locations of the installation's data files.
//!
//! Relative paths in the config are resolved against [`data_dir`], which is
//! the workspace `data/` directory unless `COLOR_WORLD_DATA_DIR` says
//! otherwise.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "COLOR_WORLD_DATA_DIR";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the workspace root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the data directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV).map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Resolves `path` against `base` unless it is already absolute.
#[must_use]
pub fn resolve_in(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_holds_workspace_manifest() {
        assert!(project_root().join("Cargo.toml").is_file());
    }

    #[test]
    fn absolute_paths_are_kept() {
        let base = Path::new("/srv/color-world");
        assert_eq!(
            resolve_in(base, Path::new("/tmp/samples.csv")),
            PathBuf::from("/tmp/samples.csv")
        );
        assert_eq!(
            resolve_in(base, Path::new("samples.csv")),
            PathBuf::from("/srv/color-world/samples.csv")
        );
    }
}
