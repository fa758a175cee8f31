use crate::cli::Cli;
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_CONFIG, ENV_GIT_CLI, ENV_MESSAGE, ENV_PER_FILE,
    ENV_REPO,
};
use crate::git::CommitMethod;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// seeded into the editor; lines starting with '#' are stripped
const EDITOR_TEMPLATE: &str = "\n# write the commit message above; lines starting with '#' are ignored\n";

/// optional settings read from the JSON config file
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub message: Option<String>,
    pub commit_per_file: Option<bool>,
    pub git_cli: Option<bool>,
}

impl FileConfig {
    /// load `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }
}

/// config file location: `--config`, then the env override, then the platform config dir
pub fn config_path(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    cli.config
        .clone()
        .or_else(|| env(ENV_CONFIG).map(PathBuf::from))
        .or_else(|| dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)))
}

/// where the commit message comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSource {
    Literal(String),
    File(PathBuf),
    Editor,
    Prompt,
}

impl MessageSource {
    /// read the message and apply git's message cleanup
    pub fn read(&self) -> Result<String> {
        let (raw, comment_char) = match self {
            Self::Literal(message) => (message.clone(), None),
            Self::File(path) => (
                fs::read_to_string(path)
                    .with_context(|| format!("failed to read message file {}", path.display()))?,
                None,
            ),
            Self::Editor => (crate::ui::edit_multi_line(EDITOR_TEMPLATE)?, Some(b'#')),
            Self::Prompt => {
                crate::status!("commit message:");
                (crate::ui::edit_one_line("")?, None)
            }
        };

        let message =
            git2::message_prettify(raw, comment_char).context("failed to clean up message")?;
        if message.trim().is_empty() {
            bail!("commit message is empty");
        }
        Ok(message)
    }
}

/// everything a run needs, resolved from flags, environment, config file and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repo_path: PathBuf,
    /// `None` when no source supplied one and prompting isn't possible
    pub message: Option<MessageSource>,
    pub commit_per_file: bool,
    pub commit_method: CommitMethod,
    pub dry_run: bool,
    pub confirm: bool,
    pub quiet: bool,
}

impl Config {
    /// first hit wins: flags, environment, config file, defaults
    pub fn resolve(
        cli: &Cli,
        file: &FileConfig,
        env: impl Fn(&str) -> Option<String>,
        interactive: bool,
    ) -> Result<Self> {
        let repo_path = cli
            .repo
            .clone()
            .or_else(|| env(ENV_REPO).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        let message = if let Some(message) = &cli.message {
            Some(MessageSource::Literal(message.clone()))
        } else if let Some(path) = &cli.file {
            Some(MessageSource::File(path.clone()))
        } else if cli.edit {
            Some(MessageSource::Editor)
        } else if let Some(message) = env(ENV_MESSAGE).or_else(|| file.message.clone()) {
            Some(MessageSource::Literal(message))
        } else if interactive {
            Some(MessageSource::Prompt)
        } else {
            None
        };

        let commit_per_file = if cli.per_file {
            true
        } else if cli.aggregate {
            false
        } else if let Some(value) = env(ENV_PER_FILE) {
            parse_bool(ENV_PER_FILE, &value)?
        } else {
            file.commit_per_file.unwrap_or(true)
        };

        let git_cli = if cli.git_cli {
            true
        } else if let Some(value) = env(ENV_GIT_CLI) {
            parse_bool(ENV_GIT_CLI, &value)?
        } else {
            file.git_cli.unwrap_or(false)
        };

        Ok(Self {
            repo_path,
            message,
            commit_per_file,
            commit_method: if git_cli {
                CommitMethod::GitCli
            } else {
                CommitMethod::Native
            },
            dry_run: cli.dry_run,
            confirm: cli.confirm,
            quiet: cli.quiet,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{name} must be a boolean, got {other:?}"),
    }
}
