//! File discovery below scan roots and inside archives.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Inclusion/exclusion globs applied to paths relative to a scan root.
/// An empty include list accepts everything.
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    includes: Option<GlobSet>,
    excludes: Option<GlobSet>,
}

impl SourceFilter {
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self> {
        Ok(Self {
            includes: build_glob_set(includes)?,
            excludes: build_glob_set(excludes)?,
        })
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// `relative` uses `/` separators
    pub fn matches(&self, relative: &str) -> bool {
        let included = self
            .includes
            .as_ref()
            .is_none_or(|includes| includes.is_match(relative));
        let excluded = self
            .excludes
            .as_ref()
            .is_some_and(|excludes| excludes.is_match(relative));
        included && !excluded
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}

/// A file found below a root, with its root-relative path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FoundFile {
    pub path: PathBuf,
    pub relative: String,
}

/// List files below `root` accepted by both `filter` and `accept`, sorted by
/// relative path. A missing root yields no files.
pub fn walk_files(
    root: &Path,
    filter: &SourceFilter,
    accept: impl Fn(&str) -> bool,
) -> Result<Vec<FoundFile>> {
    if !root.is_dir() {
        debug!("Skipping missing root {}", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::unreadable(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if accept(&relative) && filter.matches(&relative) {
            files.push(FoundFile {
                path: entry.path().to_path_buf(),
                relative,
            });
        }
    }
    files.sort();
    Ok(files)
}

/// Entries of a jar/zip archive accepted by `accept`, as (entry name, bytes)
pub fn read_archive(
    archive: &Path,
    accept: impl Fn(&str) -> bool,
) -> Result<Vec<(String, Vec<u8>)>> {
    let file = File::open(archive).map_err(|e| Error::unreadable(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| Error::Archive {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut entries = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| Error::Archive {
            path: archive.to_path_buf(),
            reason: e.to_string(),
        })?;
        if entry.is_dir() || !accept(entry.name()) {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| Error::unreadable(archive.join(&name), e))?;
        entries.push((name, bytes));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Path shown for an archive entry, `lib.jar!/org/Foo.class`
pub fn archive_entry_path(archive: &Path, entry: &str) -> PathBuf {
    PathBuf::from(format!("{}!/{}", archive.display(), entry))
}

pub fn is_archive(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
}
