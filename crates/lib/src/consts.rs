/// Name used for the binary and the HTTP user agent.
pub const APP_NAME: &str = "distrobuild";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "distro.toml";

/// Application id handed to the installer via `-application`.
pub const DIRECTOR_APP_ID: &str = "org.eclipse.equinox.p2.director";

/// Profile used when the config does not name one.
pub const DEFAULT_PROFILE: &str = "SDKProfile";

/// Suffix appended to the base image name when the config does not name one.
pub const DEFAULT_APP_NAME: &str = "distro";

/// Subdirectory of the build directory holding downloaded repositories.
pub const CACHE_DIR_NAME: &str = "cache";

/// Subdirectory of the build directory used as the extraction workspace.
pub const WORKSPACE_DIR_NAME: &str = "tmp";

/// Static repository directory shared by every version.
pub const SHARED_REPOS_DIR: &str = "shared";

/// Suffix of an in-flight download next to its cache entry.
pub const PART_SUFFIX: &str = ".part";

pub const ZIP_SUFFIX: &str = ".zip";
pub const TAR_GZ_SUFFIX: &str = ".tar.gz";
