//! The change committer: stage every pending path and commit it, either one
//! commit per path or a single commit for the whole run.

use crate::changeset::StageAction;
use crate::git::Backend;
use anyhow::{Context, Result, bail};
use git2::Oid;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// settings fixed for the lifetime of a committer
#[derive(Debug, Clone)]
pub struct CommitterOptions {
    pub message: String,
    pub commit_per_file: bool,
}

/// progress notifications emitted while a run is in flight
#[derive(Debug)]
pub enum Event<'a> {
    Processing { count: usize },
    Staged { path: &'a Path, action: StageAction },
    /// `path` is `None` for the single commit of an aggregate run
    Committed { path: Option<&'a Path>, id: Oid },
    Failed { path: &'a Path, error: &'a anyhow::Error },
}

#[derive(Debug)]
pub enum PathResult {
    /// staged, waiting for the aggregate commit
    Staged(StageAction),
    /// staged and committed on its own
    Committed(StageAction, Oid),
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct PathOutcome {
    pub path: PathBuf,
    pub result: PathResult,
}

impl PathOutcome {
    #[cfg(test)]
    pub fn action(&self) -> Option<StageAction> {
        match self.result {
            PathResult::Staged(action) | PathResult::Committed(action, _) => Some(action),
            PathResult::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.result, PathResult::Failed(_))
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub paths: Vec<PathOutcome>,
    pub aggregate_commit: Option<Oid>,
}

impl RunReport {
    pub fn staged_count(&self) -> usize {
        self.paths.iter().filter(|p| !p.is_failure()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.paths.iter().filter(|p| p.is_failure()).count()
    }

    pub fn commits(&self) -> Vec<Oid> {
        self.paths
            .iter()
            .filter_map(|p| match p.result {
                PathResult::Committed(_, id) => Some(id),
                _ => None,
            })
            .chain(self.aggregate_commit)
            .collect()
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// nothing modified, deleted or untracked
    Clean,
    Processed(RunReport),
}

/// what a run would do with one path
#[derive(Debug)]
pub struct PlannedPath {
    pub path: PathBuf,
    pub action: Result<StageAction>,
}

pub struct Committer<B> {
    backend: B,
    options: CommitterOptions,
    root: PathBuf,
}

impl<B: Backend> Committer<B> {
    pub fn new(backend: B, options: CommitterOptions) -> Result<Self> {
        let root = backend.root().canonicalize().with_context(|| {
            format!("failed to resolve working tree {}", backend.root().display())
        })?;
        Ok(Self {
            backend,
            options,
            root,
        })
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub fn run(&mut self) -> Result<Outcome> {
        self.run_with(|_| {})
    }

    /// stage and commit every pending path, reporting progress to `observe`
    ///
    /// per-path failures are recorded in the report and never stop the run;
    /// only a status query failure or the aggregate commit failing is an error
    pub fn run_with(&mut self, mut observe: impl FnMut(Event<'_>)) -> Result<Outcome> {
        let changeset = self.backend.changes()?;
        if changeset.is_empty() {
            return Ok(Outcome::Clean);
        }

        observe(Event::Processing {
            count: changeset.len(),
        });

        let mut report = RunReport::default();
        for path in changeset.paths() {
            let result = self.process(path, &mut observe);
            if let PathResult::Failed(error) = &result {
                observe(Event::Failed { path, error });
            }
            report.paths.push(PathOutcome {
                path: path.to_path_buf(),
                result,
            });
        }

        // never create an empty aggregate commit
        if !self.options.commit_per_file && report.staged_count() > 0 {
            let id = self
                .backend
                .commit(&self.options.message)
                .context("failed to create commit")?;
            observe(Event::Committed { path: None, id });
            report.aggregate_commit = Some(id);
        }

        Ok(Outcome::Processed(report))
    }

    /// the action a run would take for each pending path, without staging anything
    pub fn plan(&self) -> Result<Vec<PlannedPath>> {
        let changeset = self.backend.changes()?;
        Ok(changeset
            .paths()
            .map(|path| PlannedPath {
                path: path.to_path_buf(),
                action: resolve_action(&self.root, path),
            })
            .collect())
    }

    fn process(&mut self, path: &Path, observe: &mut impl FnMut(Event<'_>)) -> PathResult {
        let action = match resolve_action(&self.root, path) {
            Ok(action) => action,
            Err(e) => return PathResult::Failed(e),
        };

        let staged = match action {
            StageAction::Add => self.backend.stage_add(path),
            StageAction::Remove => self.backend.stage_remove(path),
        };
        if let Err(e) = staged {
            return PathResult::Failed(e);
        }
        observe(Event::Staged { path, action });

        if !self.options.commit_per_file {
            return PathResult::Staged(action);
        }

        match self.backend.commit(&self.options.message) {
            Ok(id) => {
                observe(Event::Committed {
                    path: Some(path),
                    id,
                });
                PathResult::Committed(action, id)
            }
            Err(e) => PathResult::Failed(e.context("failed to commit")),
        }
    }
}

/// add when the path exists on disk, remove when it doesn't
///
/// `root` must be canonical. paths that are absolute, climb with `..`, or
/// sit under a directory resolving outside `root` are rejected
fn resolve_action(root: &Path, relative: &Path) -> Result<StageAction> {
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !plain {
        bail!("path is outside the repository root");
    }

    let full = root.join(relative);
    if let Some(parent) = full.parent() {
        ensure_within(root, parent)?;
    }

    // symlink_metadata: a link is staged as a link, even when dangling
    match fs::symlink_metadata(&full) {
        Ok(_) => Ok(StageAction::Add),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            Ok(StageAction::Remove)
        }
        Err(e) => Err(e).with_context(|| format!("failed to inspect {}", relative.display())),
    }
}

fn ensure_within(root: &Path, dir: &Path) -> Result<()> {
    // the deepest directory that still exists decides where the path lives
    let Some(existing) = dir.ancestors().find(|a| a.exists()) else {
        return Ok(());
    };
    let resolved = existing
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", existing.display()))?;
    if !resolved.starts_with(root) {
        bail!("path is outside the repository root");
    }
    Ok(())
}
