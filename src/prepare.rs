//! Directory preparation.
//!
//! Resolves each role's sub-path against its tree's base directory and makes
//! sure the directory exists. Creation is strictly sequential: sibling roles
//! often share a parent that doesn't exist yet (`posts` and `posts/drafts`),
//! and two concurrent creations of the same missing parent can fail.

use crate::config::{DirSpec, Role};
use crate::files;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("failed to create {role} directory {path}: {source}")]
pub struct PrepareError {
    pub role: Role,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Role → absolute directory for one tree, computed once per run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedDirs {
    dirs: BTreeMap<Role, PathBuf>,
}

impl ResolvedDirs {
    pub fn get(&self, role: Role) -> Option<&Path> {
        self.dirs.get(&role).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &Path)> {
        self.dirs.iter().map(|(role, path)| (*role, path.as_path()))
    }
}

/// Join a role sub-path onto a base, treating `""` and `"."` as the base itself.
pub fn resolve(base: &Path, rel: &str) -> PathBuf {
    let joined = if rel.is_empty() || rel == "." {
        base.to_path_buf()
    } else {
        base.join(rel)
    };
    std::path::absolute(&joined).unwrap_or(joined)
}

/// Resolve and create every directory of `spec`, one after another.
pub fn prepare(spec: &DirSpec) -> Result<ResolvedDirs, PrepareError> {
    prepare_with(spec, files::ensure_dir_created)
}

/// Resolve every directory of `spec` and hand each to `create` in role
/// order, waiting for each call to return before the next.
pub fn prepare_with(
    spec: &DirSpec,
    mut create: impl FnMut(&Path) -> io::Result<()>,
) -> Result<ResolvedDirs, PrepareError> {
    let mut dirs = BTreeMap::new();
    for (role, rel) in &spec.paths {
        let path = resolve(&spec.dir, rel);
        log::debug!("creating {role} directory {}", path.display());
        create(&path).map_err(|source| PrepareError {
            role: *role,
            path: path.clone(),
            source,
        })?;
        dirs.insert(*role, path);
    }
    Ok(ResolvedDirs { dirs })
}
