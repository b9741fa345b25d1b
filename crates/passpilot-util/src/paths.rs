//! Default paths for PassPilot components
//!
//! Each path resolves, first match wins:
//! 1. its `PASSPILOT_*` override variable
//! 2. the matching XDG base directory
//! 3. a directory under `$HOME`
//! 4. a fixed system location
//!
//! Config: `~/.config/passpilot/config.toml`. Data (CSV exports): `~/.local/share/passpilot`.

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const PASSPILOT_CONFIG_ENV: &str = "PASSPILOT_CONFIG";

/// Environment variable for overriding the data directory
pub const PASSPILOT_DATA_DIR_ENV: &str = "PASSPILOT_DATA_DIR";

const APP_DIR: &str = "passpilot";

/// Where one kind of path lives
struct Location {
    override_env: &'static str,
    xdg_env: &'static str,
    home_relative: &'static [&'static str],
    system: &'static str,
    /// Appended below the application directory
    leaf: Option<&'static str>,
}

const CONFIG: Location = Location {
    override_env: PASSPILOT_CONFIG_ENV,
    xdg_env: "XDG_CONFIG_HOME",
    home_relative: &[".config"],
    system: "/etc",
    leaf: Some("config.toml"),
};

const DATA: Location = Location {
    override_env: PASSPILOT_DATA_DIR_ENV,
    xdg_env: "XDG_DATA_HOME",
    home_relative: &[".local", "share"],
    system: "/var/lib",
    leaf: None,
};

impl Location {
    fn resolve(&self, var: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(path) = var(self.override_env) {
            return PathBuf::from(path);
        }

        let base = var(self.xdg_env)
            .map(PathBuf::from)
            .or_else(|| {
                var("HOME").map(|home| {
                    self.home_relative
                        .iter()
                        .fold(PathBuf::from(home), |dir, part| dir.join(part))
                })
            })
            .unwrap_or_else(|| PathBuf::from(self.system));

        let dir = base.join(APP_DIR);
        match self.leaf {
            Some(leaf) => dir.join(leaf),
            None => dir,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Config file path (`$PASSPILOT_CONFIG`, then `$XDG_CONFIG_HOME`, then `~/.config`)
pub fn default_config_path() -> PathBuf {
    CONFIG.resolve(env_var)
}

/// Data directory (`$PASSPILOT_DATA_DIR`, then `$XDG_DATA_HOME`, then `~/.local/share`)
pub fn default_data_dir() -> PathBuf {
    DATA.resolve(env_var)
}
