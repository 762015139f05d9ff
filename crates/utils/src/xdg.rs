use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "antoine";

/// XDG Base Directory paths for antoine
pub struct XdgPaths;

impl XdgPaths {
    /// `$XDG_CONFIG_HOME/antoine`, else `~/.config/antoine`
    pub fn config_dir() -> PathBuf {
        xdg_dir("XDG_CONFIG_HOME", ".config")
    }

    /// `$XDG_CACHE_HOME/antoine`, else `~/.cache/antoine`
    pub fn cache_dir() -> PathBuf {
        xdg_dir("XDG_CACHE_HOME", ".cache")
    }
}

/// Resolve the app directory under `var`, falling back to `home/fallback`
///
/// An empty or relative `var` is ignored.
fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    let base = env::var_os(var)
        .map(PathBuf::from)
        .filter(|path| path.is_absolute())
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(fallback)
        });
    base.join(APP_DIR)
}
