//! Centralized path definitions for civic-ledger
//!
//! ## Storage Layout
//!
//! ```text
//! project/
//! ├── civic-ledger.toml          # Catalog, plausibility rules, engine tunables
//! └── .civic-ledger/             # Local state
//!     └── state.json            # Records, contributions, audit log
//! ```
//!
//! When no project config exists, `~/.config/civic-ledger/config.toml` is
//! used instead.

use std::path::{Path, PathBuf};

/// Directory name for local state
pub const DATA_DIR: &str = ".civic-ledger";

/// Project configuration filename
pub const CONFIG_FILE: &str = "civic-ledger.toml";

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "CIVIC_LEDGER_CONFIG";

/// Snapshot filename inside the data directory
const STATE_FILE: &str = "state.json";

/// Global config directory name
const GLOBAL_DIR: &str = "civic-ledger";

/// Global config filename
const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// `civic-ledger.toml` under `root`
#[must_use]
pub fn config_file(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// `.civic-ledger/` under `root`
#[must_use]
pub fn data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR)
}

/// `.civic-ledger/state.json` under `root`
#[must_use]
pub fn state_file(root: &Path) -> PathBuf {
    data_dir(root).join(STATE_FILE)
}

/// `~/.config/civic-ledger/config.toml` (platform equivalent elsewhere)
#[must_use]
pub fn global_config() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join(GLOBAL_DIR)
        .join(GLOBAL_CONFIG_FILE)
}

/// Pick the config file to load
///
/// Order: explicit override, `CIVIC_LEDGER_CONFIG`, the project file, the
/// global file. The project path is returned when none of them exist so the
/// error names the file `init` would create.
#[must_use]
pub fn resolve_config(root: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }

    let project = config_file(root);
    if project.exists() {
        return project;
    }
    let global = global_config();
    if global.exists() {
        log::debug!("using global config {}", global.display());
        return global;
    }
    project
}
