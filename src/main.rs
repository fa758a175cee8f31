mod changeset;
mod cli;
mod committer;
mod config;
mod constants;
mod git;
#[cfg(test)]
mod test_support;
mod ui;

use crate::cli::Cli;
use crate::committer::{Committer, CommitterOptions, Event, Outcome, RunReport};
use crate::config::{Config, FileConfig};
use crate::git::{Backend, Git2Backend};
use anyhow::{Context, Result, bail};
use num_format::{Locale, ToFormattedString};

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let env = |name: &str| std::env::var(name).ok();

    let file_config = match config::config_path(&cli, env) {
        Some(path) => FileConfig::load(&path)?,
        None => FileConfig::default(),
    };
    let config = Config::resolve(&cli, &file_config, env, ui::is_interactive())?;

    // repository load failures are fatal
    let backend = Git2Backend::open(&config.repo_path, config.commit_method)?;
    if backend.is_head_detached() {
        warning!("repository is in detached HEAD state; commits will not be on a branch");
    }

    if config.dry_run {
        return dry_run(backend, &config);
    }

    let changeset = ui::with_spinner(|| backend.changes())?;
    if changeset.is_empty() {
        status!("no changes to commit");
        return Ok(());
    }
    if changeset.staged > 0 {
        warning!(
            "{} already staged {} will be included in the first commit",
            changeset.staged,
            plural(changeset.staged, "path", "paths")
        );
    }

    let message = config
        .message
        .as_ref()
        .context("no commit message given (use --message, --file or --edit)")?
        .read()?;

    if config.confirm {
        confirm(changeset.len(), config.commit_per_file)?;
    }

    let options = CommitterOptions {
        message,
        commit_per_file: config.commit_per_file,
    };
    let mut committer = Committer::new(backend, options)?;
    match committer.run_with(|event| report_event(&event, config.quiet))? {
        Outcome::Clean => status!("no changes to commit"),
        Outcome::Processed(report) => summarise(&report),
    }

    Ok(())
}

fn dry_run(backend: Git2Backend, config: &Config) -> Result<()> {
    let options = CommitterOptions {
        message: String::new(),
        commit_per_file: config.commit_per_file,
    };
    let plan = Committer::new(backend, options)?.plan()?;
    if plan.is_empty() {
        status!("no changes to commit");
        return Ok(());
    }

    status!("would process {}:", count(plan.len(), "change", "changes"));
    for planned in &plan {
        match &planned.action {
            Ok(action) => info!("  {}: {}", action, planned.path.display()),
            Err(e) => error!("  skip: {} ({})", planned.path.display(), e),
        }
    }
    if config.commit_per_file {
        info!("one commit per path");
    } else {
        info!("one commit for all paths");
    }

    Ok(())
}

fn confirm(changes: usize, commit_per_file: bool) -> Result<()> {
    if !ui::is_interactive() {
        bail!("--confirm requires an interactive terminal");
    }

    let commits = if commit_per_file {
        count(changes, "commit", "commits")
    } else {
        "1 commit".to_string()
    };
    status!(
        "stage {} and create {}?",
        count(changes, "change", "changes"),
        commits
    );
    if ui::prompt(&["yes", "no"])? != 'y' {
        bail!("aborted");
    }
    Ok(())
}

fn report_event(event: &Event<'_>, quiet: bool) {
    match event {
        Event::Processing { count: n } if !quiet => {
            status!("processing {}...", count(*n, "change", "changes"));
        }
        Event::Staged { path, action } if !quiet => {
            info!("staging ({}): {}", action, path.display());
        }
        Event::Committed { path, id } if !quiet => match path {
            Some(path) => info!("committed {}: {}", short_id(*id), path.display()),
            None => info!("committed {}", short_id(*id)),
        },
        Event::Failed { path, error } => {
            error!("failed to process {}: {:#}", path.display(), error);
        }
        _ => {}
    }
}

fn summarise(report: &RunReport) {
    let lines = summary_lines(report);
    if report.failure_count() == 0 {
        lines.iter().for_each(|line| status!(line));
    } else {
        lines.iter().for_each(|line| warning!(line));
    }
}

/// "done: X committed, Y failed", then one line per path left uncommitted
fn summary_lines(report: &RunReport) -> Vec<String> {
    let mut lines = vec![format!(
        "done: {} committed, {} failed",
        report.staged_count().to_formatted_string(&Locale::en),
        report.failure_count().to_formatted_string(&Locale::en)
    )];
    lines.extend(
        report
            .paths
            .iter()
            .filter(|p| p.is_failure())
            .map(|p| format!("  not committed: {}", p.path.display())),
    );
    lines
}

fn short_id(id: git2::Oid) -> String {
    let mut id = id.to_string();
    id.truncate(constants::SHORT_ID_LEN);
    id
}

fn count(n: usize, singular: &str, plural_form: &str) -> String {
    format!(
        "{} {}",
        n.to_formatted_string(&Locale::en),
        plural(n, singular, plural_form)
    )
}

fn plural<'a>(n: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if n == 1 { singular } else { plural }
}
