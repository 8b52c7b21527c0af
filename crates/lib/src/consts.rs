//! Crate-wide constants.

/// Application name, used for store and config paths.
pub const APP_NAME: &str = "kiln";

/// Default recipe file name looked up in the project root.
pub const RECIPE_FILE_NAME: &str = "kiln.toml";

/// Length of the truncated hash used for store entry names.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Environment variable overriding the dependency store location.
pub const STORE_ENV_VAR: &str = "KILN_STORE";

/// Environment variable naming a read-only parent store consulted on cache miss.
pub const PARENT_STORE_ENV_VAR: &str = "KILN_PARENT_STORE";

/// Environment variable overriding CA bundle discovery during assembly.
pub const CA_BUNDLE_ENV_VAR: &str = "KILN_CA_BUNDLE";
