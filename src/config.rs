// config.rs — Runtime configuration read from the environment.
//
//   GTA_NATIVE_LOG           tracing filter directives   (default "gta_native=info")
//   GTA_NATIVE_LOG_FILE      log file path               (default: next to the DLL)
//   GTA_NATIVE_GAME_VERSION  version name or ordinal     (default: ask the host)

use crate::offsets::GameVersion;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str = "gta_native=info";
pub const DEFAULT_LOG_FILE: &str = "gta_native.log";

const ENV_LOG: &str = "GTA_NATIVE_LOG";
const ENV_LOG_FILE: &str = "GTA_NATIVE_LOG_FILE";
const ENV_GAME_VERSION: &str = "GTA_NATIVE_GAME_VERSION";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// `None` means "next to the loaded module".
    pub log_file: Option<PathBuf>,
    pub log_filter: String,
    /// Overrides the host's version detection when set.
    pub game_version: Option<GameVersion>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            game_version: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key -> value source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(filter) = get(ENV_LOG) {
            config.log_filter = filter;
        }
        config.log_file = get(ENV_LOG_FILE).map(PathBuf::from);

        if let Some(text) = get(ENV_GAME_VERSION) {
            match GameVersion::parse(&text) {
                Some(v) => config.game_version = Some(v),
                // Logging may not be up yet; this lands once it is.
                None => tracing::warn!(value = %text, "ignoring unrecognised {ENV_GAME_VERSION}"),
            }
        }
        config
    }
}
