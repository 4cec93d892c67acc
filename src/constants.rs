//! Global constants used throughout the polybuild codebase.

/// Conventional name of a build specification file within its directory.
pub const BUILD_FILE_NAME: &str = "BUILD";

/// Prefix used when synthesising names for anonymous nodes.
///
/// The first anonymous node in a file becomes `auto_0`, the second
/// `auto_1`, and so on; the counter is per specification file.
pub const AUTO_NAME_PREFIX: &str = "auto_";

/// Maximum number of plugin-expansion passes over a single attribute block.
///
/// Expansion is required to be monotone, so a well-behaved plugin set
/// converges quickly; exceeding this bound is reported as a plugin loop.
pub const PLUGIN_EXPANSION_LIMIT: usize = 64;

/// Environment-key prefix under which plugin registrations are stored.
///
/// A plugin handling the attribute keyword `my_rule` registers itself as
/// `plugin:my_rule` in the owning file's inherited environment, so the
/// registration inherits down the directory tree like any other key.
pub const PLUGIN_KEY_PREFIX: &str = "plugin:";
