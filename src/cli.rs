use clap::Parser;
use std::path::PathBuf;

/// git-file-commit: stage pending changes and commit them, one commit per file by default
#[derive(Parser, Debug)]
#[command(name = "git-file-commit", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// working tree root of the repository
    #[arg(short = 'C', long, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// commit message
    #[arg(short, long, conflicts_with_all = ["file", "edit"])]
    pub message: Option<String>,

    /// read the commit message from a file
    #[arg(short = 'F', long, value_name = "PATH", conflicts_with = "edit")]
    pub file: Option<PathBuf>,

    /// write the commit message in $EDITOR
    #[arg(short, long)]
    pub edit: bool,

    /// one commit per changed file (default)
    #[arg(long, conflicts_with = "aggregate")]
    pub per_file: bool,

    /// a single commit covering all changes
    #[arg(long)]
    pub aggregate: bool,

    /// commit through the git binary so hooks and signing apply
    #[arg(long)]
    pub git_cli: bool,

    /// list what would be staged without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// ask before staging and committing
    #[arg(long)]
    pub confirm: bool,

    /// configuration file to read
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// only print failures and the summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
