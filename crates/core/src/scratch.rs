//! Per-job isolated scratch directories.
//!
//! Every job gets exactly one [`ScratchSpace`]: a fresh directory under the
//! configured scratch root where tasks place intermediate and final
//! artifacts. Allocated entries carry a 6-digit, zero-padded, monotonically
//! increasing prefix, so names never collide within one scratch directory
//! even across process restarts (the counter is reseeded from the existing
//! filenames when a scratch space is reopened).
//!
//! Containment is a hard invariant: every path produced by or accepted into
//! a scratch space must resolve, after symlink and `..` normalization,
//! inside both the root and the job directory. A violation is
//! [`CoreError::OutsideScratch`] and is never silently clamped.

use std::fs::{self, File, OpenOptions};
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::error::CoreError;

/// Width of the numeric allocation prefix (`000000`, `000001`, ...).
const ID_PREFIX_WIDTH: usize = 6;

/// An isolated per-job working directory with collision-safe file naming.
#[derive(Debug)]
pub struct ScratchSpace {
    /// Canonicalized process-wide scratch root.
    root: PathBuf,
    /// Canonicalized per-job directory, a child of `root`.
    dir: PathBuf,
    /// Next allocation id. Private to this instance; recomputed on reopen.
    next_id: u32,
}

impl ScratchSpace {
    /// Create a fresh scratch space under `root`.
    ///
    /// The root is created if it does not exist yet. The job directory name
    /// is unique per job (`job-<uuid>`), so concurrent jobs never share a
    /// directory and no cross-job locking is needed.
    pub fn create(root: &Path) -> Result<Self, CoreError> {
        fs::create_dir_all(root)?;
        let root = root.canonicalize()?;

        let dir = root.join(format!("job-{}", Uuid::new_v4()));
        fs::create_dir(&dir)?;
        let dir = dir.canonicalize()?;

        Ok(Self {
            root,
            dir,
            next_id: 0,
        })
    }

    /// Reconstruct a scratch space over an existing directory.
    ///
    /// Fails with [`CoreError::OutsideScratch`] if `path` does not resolve
    /// to a strict child of `root`. Existing filenames are rescanned to
    /// recompute the allocation counter as `max(existing ids) + 1`, which
    /// is what makes allocation collision-safe across process restarts.
    pub fn reopen(path: &Path, root: &Path) -> Result<Self, CoreError> {
        let root = root.canonicalize()?;
        let dir = path.canonicalize()?;

        if dir == root || !dir.starts_with(&root) {
            return Err(CoreError::OutsideScratch { path: dir });
        }

        let mut next_id = 0u32;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if let Some(id) = parse_allocation_id(&entry.file_name().to_string_lossy()) {
                next_id = next_id.max(id + 1);
            }
        }

        Ok(Self { root, dir, next_id })
    }

    /// The job directory this scratch space owns.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The scratch root this space was created under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a uniquely named file and return its path.
    ///
    /// The file is created on disk immediately so a later [`reopen`]
    /// rescan sees it and never reissues the same id.
    ///
    /// [`reopen`]: ScratchSpace::reopen
    pub fn allocate_file(&mut self, task_name: Option<&str>) -> Result<PathBuf, CoreError> {
        self.allocate_file_for_writing(task_name).map(|(p, _)| p)
    }

    /// Allocate a uniquely named file and return its path together with an
    /// open write handle.
    pub fn allocate_file_for_writing(
        &mut self,
        task_name: Option<&str>,
    ) -> Result<(PathBuf, File), CoreError> {
        if let Some(name) = task_name {
            validate_task_name(name)?;
        }

        loop {
            let path = self.dir.join(self.allocation_name(task_name));
            self.next_id += 1;

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                // Someone placed a file with this prefix manually; the
                // counter just skips past it.
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Allocate a uniquely named subdirectory using the same id scheme.
    pub fn allocate_subdirectory(&mut self) -> Result<PathBuf, CoreError> {
        loop {
            let path = self.dir.join(self.allocation_name(None));
            self.next_id += 1;

            match fs::create_dir(&path) {
                Ok(()) => return Ok(path),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Join `relative` onto the job directory, enforcing containment.
    ///
    /// Absolute inputs and `..` segments are rejected outright. If the
    /// joined path exists it is canonicalized, so symlinks pointing outside
    /// the directory are caught as well. For a path that does not exist
    /// yet, the deepest existing ancestor is canonicalized instead, so a
    /// symlinked intermediate directory cannot smuggle a new file outside.
    pub fn full_path(&self, relative: &str) -> Result<PathBuf, CoreError> {
        let rel = Path::new(relative);
        if rel.is_absolute() {
            return Err(CoreError::OutsideScratch {
                path: rel.to_path_buf(),
            });
        }
        for component in rel.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(CoreError::OutsideScratch {
                        path: rel.to_path_buf(),
                    })
                }
            }
        }

        let joined = self.dir.join(rel);
        if joined.exists() {
            let resolved = joined.canonicalize()?;
            if !resolved.starts_with(&self.dir) {
                return Err(CoreError::OutsideScratch { path: resolved });
            }
            return Ok(resolved);
        }

        // Not on disk yet. The lexical checks above rule out `..` and
        // absolute segments, but an existing intermediate directory may
        // still be a symlink; resolve the deepest existing ancestor and
        // require it to stay inside the job directory.
        let mut ancestor = joined.as_path();
        while let Some(parent) = ancestor.parent() {
            ancestor = parent;
            if ancestor.exists() {
                break;
            }
        }
        let resolved = ancestor.canonicalize()?;
        if !resolved.starts_with(&self.dir) {
            return Err(CoreError::OutsideScratch { path: joined });
        }

        Ok(joined)
    }

    fn allocation_name(&self, task_name: Option<&str>) -> String {
        match task_name {
            Some(task) => format!("{:0width$}_{task}", self.next_id, width = ID_PREFIX_WIDTH),
            None => format!("{:0width$}", self.next_id, width = ID_PREFIX_WIDTH),
        }
    }
}

/// Parse the leading 6-digit allocation id out of a scratch filename.
///
/// Returns `None` for names that were not produced by the allocator.
fn parse_allocation_id(file_name: &str) -> Option<u32> {
    if file_name.len() < ID_PREFIX_WIDTH {
        return None;
    }
    let (prefix, rest) = file_name.split_at(ID_PREFIX_WIDTH);
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // A valid allocation name is either the bare id or id + "_suffix".
    if !(rest.is_empty() || rest.starts_with('_')) {
        return None;
    }
    prefix.parse().ok()
}

/// Task names end up embedded in filenames; keep them to a safe alphabet.
fn validate_task_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Task name must not be empty".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(format!(
            "Task name '{name}' may only contain alphanumeric, hyphen, underscore, or dot characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
