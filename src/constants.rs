// Constants module for shared string constants

/// Documented default source for the primary (client/game) version manifest.
pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/SprainedSpark89/MCPHackers.github.io/main/versionsV3/versions.json";

/// Default source for the secondary (mod build) version manifest.
pub const DEFAULT_MOD_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/SprainedSpark89/MCPHackers.github.io/main/versionsHmod/versions.json";

/// Local manifest cache that takes precedence over the network.
pub const VERSIONS_CACHE_FILE: &str = "versions.json";
pub const MOD_VERSIONS_DIR: &str = "mod_versions";

pub const JARS_DIR: &str = "jars";
pub const LIBRARIES_DIR: &str = "libraries";
pub const NATIVES_DIR: &str = "natives";
pub const CONF_DIR: &str = "conf";
pub const MOD_DIST_DIR: &str = "mod_dist";
pub const SOURCES_DIR: &str = "src";
pub const BACKUPS_DIR: &str = "backups";
pub const VERSION_DESCRIPTOR_FILE: &str = "version.json";
pub const MOD_DESCRIPTOR_FILE: &str = "mod.json";

pub const CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DOWNLOAD_JOBS: usize = 8;

/// Share of the download stage covered by byte progress; the rest is native extraction.
pub const DOWNLOAD_PERCENT_WINDOW: u64 = 97;
