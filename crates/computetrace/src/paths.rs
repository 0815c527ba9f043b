use std::env;
use std::path::{Path, PathBuf};

use directories_next::BaseDirs;

pub const ENV_CONFIG: &str = "COMPUTETRACE_CONFIG";

const APPLICATION_DIR: &str = "computetrace";
const CONFIG_FILE: &str = "config.toml";

/// Where the effective configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Flag(PathBuf),
    Env(PathBuf),
    UserDir(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Flag(path) | ConfigSource::Env(path) | ConfigSource::UserDir(path) => {
                Some(path)
            }
            ConfigSource::Defaults => None,
        }
    }
}

/// `--config` wins, then `$COMPUTETRACE_CONFIG`, then an existing
/// `<config dir>/computetrace/config.toml`.
pub fn discover_config(flag: Option<&Path>) -> ConfigSource {
    let user_file = user_config_file().filter(|path| path.is_file());
    resolve(flag, env_override(ENV_CONFIG), user_file)
}

fn resolve(
    flag: Option<&Path>,
    env_value: Option<PathBuf>,
    user_file: Option<PathBuf>,
) -> ConfigSource {
    if let Some(path) = flag {
        return ConfigSource::Flag(path.to_path_buf());
    }
    if let Some(path) = env_value {
        return ConfigSource::Env(path);
    }
    match user_file {
        Some(path) => ConfigSource::UserDir(path),
        None => ConfigSource::Defaults,
    }
}

fn user_config_file() -> Option<PathBuf> {
    let dirs = BaseDirs::new()?;
    Some(dirs.config_dir().join(APPLICATION_DIR).join(CONFIG_FILE))
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
