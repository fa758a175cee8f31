// environment
pub const ENV_REPO: &str = "GIT_FILE_COMMIT_REPO";
pub const ENV_MESSAGE: &str = "GIT_FILE_COMMIT_MESSAGE";
pub const ENV_PER_FILE: &str = "GIT_FILE_COMMIT_PER_FILE";
pub const ENV_GIT_CLI: &str = "GIT_FILE_COMMIT_GIT_CLI";
pub const ENV_CONFIG: &str = "GIT_FILE_COMMIT_CONFIG";

// config file, relative to the platform config dir
pub const CONFIG_DIR_NAME: &str = "git-file-commit";
pub const CONFIG_FILE_NAME: &str = "config.json";

// output
pub const SHORT_ID_LEN: usize = 7;
pub const SPINNER_TICK_MILLIS: u64 = 100;
