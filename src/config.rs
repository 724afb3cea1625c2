use rocket::figment::providers::{Env, Serialized};
use rocket::figment::Figment;
use serde::{Deserialize, Serialize};

use std::path::PathBuf;

pub const DEFAULT_MAX_IMPORT_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub max_import_bytes: u64,
    pub log_dir: PathBuf,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> AppConfig {
        AppConfig {
            database_path: PathBuf::from("data").join("seed_library.db"),
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
            log_dir: PathBuf::from("logs"),
            log_filter: "info".to_string(),
        }
    }
}

/// Rocket's own sources (`Rocket.toml`, `ROCKET_*`) layered over the defaults,
/// with `SEED_LIBRARY_*` variables taking precedence.
pub fn figment() -> Figment {
    rocket::Config::figment()
        .join(Serialized::defaults(AppConfig::default()))
        .merge(Env::prefixed("SEED_LIBRARY_").global())
}
