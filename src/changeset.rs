use std::fmt;
use std::path::{Path, PathBuf};

/// how a single path gets staged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    Add,
    Remove,
}

impl fmt::Display for StageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// snapshot of the working tree status, taken once per run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub tracked: Vec<PathBuf>,   // modified, deleted or type-changed
    pub untracked: Vec<PathBuf>, // new files, ignored files excluded
    pub staged: usize,           // already staged against HEAD
}

impl ChangeSet {
    /// changed paths in processing order: tracked first, then untracked
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.tracked
            .iter()
            .chain(&self.untracked)
            .map(PathBuf::as_path)
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn len(&self) -> usize {
        self.paths().count()
    }

    pub fn is_empty(&self) -> bool {
        self.paths().next().is_none()
    }
}
