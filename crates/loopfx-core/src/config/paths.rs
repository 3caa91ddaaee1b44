//! Standard locations for loopfx configuration files

use std::path::PathBuf;

/// Directory name under the platform config directory
pub const APP_DIR_NAME: &str = "loopfx";

/// Platform config directory for loopfx
///
/// Returns `<config_dir>/loopfx` (e.g. `~/.config/loopfx` on Linux), or
/// `./loopfx` when the platform has no config directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Path of a config file inside [`config_dir`]
pub fn default_config_path(filename: &str) -> PathBuf {
    config_dir().join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_app_name() {
        assert!(config_dir().ends_with(APP_DIR_NAME));
    }

    #[test]
    fn test_config_path_includes_filename() {
        let path = default_config_path("config.yaml");
        assert!(path.ends_with("loopfx/config.yaml"));
    }
}
