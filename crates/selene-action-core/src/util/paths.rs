//! Lexical path helpers.
//!
//! Nothing here touches the filesystem: paths are cleaned and related
//! purely by their components, so results are identical on every runner
//! regardless of which directories happen to exist.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelativePathError {
    #[error(
        "cannot express {} relative to {}: one path is absolute and the other is not",
        .path.display(),
        .base.display()
    )]
    MixedRoots { path: PathBuf, base: PathBuf },

    #[error("cannot express {} relative to {}: paths are on different roots", .path.display(), .base.display())]
    DifferentRoots { path: PathBuf, base: PathBuf },

    #[error("cannot express {} relative to {}: base climbs above its start", .path.display(), .base.display())]
    UnresolvableBase { path: PathBuf, base: PathBuf },
}

/// Lexically normalize a path.
///
/// Drops `.` components, folds `name/..` pairs and discards `..` directly
/// under a root. Leading `..` of relative paths are kept. An empty result
/// becomes `.`.
pub fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Join `path` under `base` unless it is already absolute, then clean.
pub fn join_clean(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        clean(path)
    } else {
        clean(&base.join(path))
    }
}

/// Express `path` relative to `base`, purely lexically.
///
/// Both paths must be absolute or both relative. The result may start
/// with `..` when `path` lies outside `base`.
pub fn relative_to(path: &Path, base: &Path) -> Result<PathBuf, RelativePathError> {
    let target = clean(path);
    let root = clean(base);

    if target.has_root() != root.has_root() {
        return Err(RelativePathError::MixedRoots {
            path: target,
            base: root,
        });
    }

    let target_parts: Vec<Component<'_>> = target.components().collect();
    let root_parts: Vec<Component<'_>> = root.components().collect();

    let prefix_of = |parts: &[Component<'_>]| match parts.first() {
        Some(Component::Prefix(p)) => Some(p.as_os_str().to_owned()),
        _ => None,
    };
    if prefix_of(target_parts.as_slice()) != prefix_of(root_parts.as_slice()) {
        return Err(RelativePathError::DifferentRoots {
            path: target.clone(),
            base: root.clone(),
        });
    }

    let is_dot = |parts: &[Component<'_>]| matches!(parts, [Component::CurDir]);
    let target_parts: &[Component<'_>] = if is_dot(target_parts.as_slice()) {
        &[]
    } else {
        target_parts.as_slice()
    };
    let root_parts: &[Component<'_>] = if is_dot(root_parts.as_slice()) {
        &[]
    } else {
        root_parts.as_slice()
    };

    let shared = target_parts
        .iter()
        .zip(root_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let remaining_root = &root_parts[shared..];
    if remaining_root.contains(&Component::ParentDir) {
        return Err(RelativePathError::UnresolvableBase {
            path: target.clone(),
            base: root.clone(),
        });
    }

    let mut relative = PathBuf::new();
    for _ in remaining_root {
        relative.push("..");
    }
    for part in &target_parts[shared..] {
        relative.push(part);
    }

    if relative.as_os_str().is_empty() {
        return Ok(PathBuf::from("."));
    }
    Ok(relative)
}
