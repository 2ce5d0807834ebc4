// Local file enumeration: every regular file under the upload root, keyed
// by its `/`-separated path inside the item.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Remote path inside the item (`/`-separated) → absolute local path.
pub type FileMapping = BTreeMap<String, PathBuf>;

/// Walk `root` recursively and map every regular file to its path relative
/// to `root`. Files named `exclude` are skipped wherever they appear.
pub fn build_file_mapping(root: &Path, exclude: Option<&str>) -> Result<FileMapping> {
    let mut mapping = FileMapping::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        // `is_file` follows symlinks, so linked files are uploaded too.
        if !entry.path().is_file() {
            continue;
        }
        if exclude.is_some() && entry.file_name().to_str() == exclude {
            tracing::debug!(path = %entry.path().display(), "skipping excluded file");
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} is outside {}", entry.path().display(), root.display()))?;
        let remote = remote_path(relative)?;
        mapping.insert(remote, entry.path().to_path_buf());
    }

    Ok(mapping)
}

/// Join the components of a relative path with `/`.
pub fn remote_path(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .with_context(|| format!("Path is not valid UTF-8: {}", relative.display()))?,
            ),
            Component::CurDir => {}
            _ => anyhow::bail!("Unexpected component in relative path {}", relative.display()),
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn maps_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.txt"));
        touch(&root.join("sub").join("b.txt"));

        let mapping = build_file_mapping(root, None).unwrap();
        let expected: FileMapping = [
            ("a.txt".to_string(), root.join("a.txt")),
            ("sub/b.txt".to_string(), root.join("sub").join("b.txt")),
        ]
        .into_iter()
        .collect();
        assert_eq!(mapping, expected);
    }

    #[test]
    fn excluded_name_is_skipped_at_any_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("archivist"));
        touch(&root.join("deep").join("archivist"));
        touch(&root.join("deep").join("keep.bin"));

        let mapping = build_file_mapping(root, Some("archivist")).unwrap();
        assert_eq!(mapping.keys().collect::<Vec<_>>(), ["deep/keep.bin"]);
    }

    #[test]
    fn directories_alone_produce_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty").join("nested")).unwrap();
        assert!(build_file_mapping(dir.path(), None).unwrap().is_empty());
    }

    #[test]
    fn keys_round_trip_to_local_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in ["x/y/z.dat", "top.md", "x/w.txt"] {
            touch(&root.join(name));
        }
        let mapping = build_file_mapping(root, None).unwrap();
        assert_eq!(mapping.len(), 3);
        for (remote, local) in &mapping {
            assert_eq!(&remote_path(local.strip_prefix(root).unwrap()).unwrap(), remote);
            assert!(local.is_absolute());
        }
    }
}
