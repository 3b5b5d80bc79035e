//! Scoped staging directories for generator output.

use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use walkdir::WalkDir;

const PREFIX: &str = "bnfkit";

/// A fresh, uniquely named directory below the system temp location.
///
/// Call [`ScratchDir::close`] to delete it and observe failures. If the
/// value is dropped instead (early return, unwinding), the directory is
/// still removed on a best-effort basis.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir()?;
        tracing::trace!("created scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Every regular file below the directory, in a deterministic order.
    pub fn files(&self) -> impl Iterator<Item = io::Result<PathBuf>> + '_ {
        WalkDir::new(self.path())
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
                Ok(_) => None,
                Err(err) => Some(Err(io::Error::from(err))),
            })
    }

    /// Delete every file, then every directory bottom-up.
    pub fn close(self) -> io::Result<()> {
        let path = self.path().to_path_buf();
        for entry in WalkDir::new(&path).min_depth(1).contents_first(true) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_dir() {
                fs::remove_dir(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        self.dir.close()?;
        tracing::trace!("removed scratch directory {}", path.display());
        Ok(())
    }
}

/// Release `scratch` after `result` was computed inside it.
///
/// A failure of the work itself takes priority over a cleanup failure.
pub fn release<T, E>(scratch: ScratchDir, result: Result<T, E>) -> Result<T, E>
where
    E: From<io::Error>,
{
    let path = scratch.path().to_path_buf();
    match (result, scratch.close()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err.into()),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup)) => {
            tracing::warn!(
                "failed to remove scratch directory {}: {}",
                path.display(),
                cleanup
            );
            Err(err)
        }
    }
}
