// Filesystem locations.
// Resolves the config, identity, log and asset cache paths for the current platform.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Name of the timestamp database kept next to the asset caches.
pub const META_DB_NAME: &str = "sw-cache-meta";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "schockpanel")
}

/// Path to the TOML configuration file.
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Base directory for persisted panel data.
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Path to the stored local identity (user id and display name).
pub fn identity_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("identity.json"))
}

/// Path to the log file used while the terminal UI owns the screen.
pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("schockpanel.log"))
}

/// Root directory holding one subdirectory per named asset cache.
pub fn asset_cache_root() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join("caches"))
}

/// Directory of the timestamp database.
pub fn meta_db_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join(META_DB_NAME))
}

/// Sanitize a name for use as a single path component.
/// Replaces problematic characters with underscores.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("tele-schocken-static-v1"), "tele-schocken-static-v1");
        assert_eq!(sanitize_name("v1/beta"), "v1_beta");
        assert_eq!(sanitize_name("a:b"), "a_b");
    }

    #[test]
    fn test_paths_layout() {
        // Path construction only; nothing is created on disk.
        if let Some(path) = identity_path() {
            assert!(path.ends_with("identity.json"));
        }
        if let Some(path) = meta_db_dir() {
            assert!(path.ends_with(META_DB_NAME));
        }
        if let Some(path) = config_path() {
            assert!(path.ends_with("config.toml"));
        }
    }
}
