// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sources of `.feature` files.

use std::path::{Path, PathBuf};

use derive_more::{Display, Error};
use itertools::Itertools as _;
use globset::{GlobBuilder, GlobMatcher};
use linked_hash_map::LinkedHashMap;

/// Where to look for `.feature` files.
#[derive(Clone, Debug)]
pub enum Source {
    /// Filesystem path or glob pattern.
    ///
    /// A directory means every `.feature` file below it.
    Path(String),

    /// In-memory files.
    Virtual(Virtual),
}

impl Default for Source {
    fn default() -> Self {
        Self::Path("features/*.feature".into())
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Self::Path(path.to_owned())
    }
}

impl From<String> for Source {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::from(path.as_path())
    }
}

impl From<Virtual> for Source {
    fn from(fs: Virtual) -> Self {
        Self::Virtual(fs)
    }
}

/// In-memory filesystem of `.feature` files, typically filled with
/// [`include_str!`]s, along with glob patterns selecting some of them.
///
/// ```rust
/// # use gherkin_suite::source::Virtual;
/// let fs = Virtual::new()
///     .file("features/add.feature", "Feature: add")
///     .file("features/sub.feature", "Feature: sub")
///     .pattern("features/add.*");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Virtual {
    /// Contents by file name.
    files: LinkedHashMap<String, String>,

    /// Glob patterns selecting the files. No patterns select every file.
    patterns: Vec<String>,
}

impl Virtual {
    /// Creates an empty [`Virtual`] filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given `name` and `contents`.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        contents: impl Into<String>,
    ) -> Self {
        _ = self.files.insert(name.into(), contents.into());
        self
    }

    /// Adds a glob `pattern` selecting files.
    ///
    /// `*` and `?` don't cross `/`, while `**/` matches any number of
    /// directories. Character classes (`[ab]`) and alternatives (`{a,b}`)
    /// are supported too.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Selects the files matching any of the patterns.
    fn select(&self) -> Result<Vec<Input>, Error> {
        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                glob_matcher(p).map_err(|source| Error::Pattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self
            .files
            .iter()
            .filter(|(name, _)| {
                patterns.is_empty() || patterns.iter().any(|p| p.is_match(name))
            })
            .map(|(name, contents)| Input {
                path: PathBuf::from(name),
                contents: Some(contents.clone()),
            })
            .sorted_by(|l, r| l.path.cmp(&r.path))
            .collect())
    }
}

/// Single `.feature` file to be parsed.
#[derive(Clone, Debug)]
pub struct Input {
    /// Path of the file.
    pub path: PathBuf,

    /// Contents of an in-memory file. [`None`] means reading the [`path`].
    ///
    /// [`path`]: Input::path
    pub contents: Option<String>,
}

impl Source {
    /// Discovers the `.feature` files of this [`Source`], sorted by path.
    ///
    /// # Errors
    ///
    /// If a glob pattern is malformed.
    pub fn discover(&self) -> Result<Vec<Input>, Error> {
        let inputs = match self {
            Self::Path(pattern) => discover_path(pattern)?,
            Self::Virtual(fs) => fs.select()?,
        };
        if inputs.is_empty() {
            tracing::warn!(source = ?self, "no feature files found");
        }
        Ok(inputs)
    }
}

/// Discovers `.feature` files by the filesystem `pattern`.
fn discover_path(pattern: &str) -> Result<Vec<Input>, Error> {
    let path = Path::new(pattern);
    if path.is_file() {
        return Ok(vec![Input {
            path: path.to_path_buf(),
            contents: None,
        }]);
    }

    let (base, glob) = if path.is_dir() {
        (path.to_path_buf(), "*.feature".to_owned())
    } else {
        let (base, glob) = split_glob(path);
        if glob.is_empty() || !base.is_dir() {
            return Ok(vec![]);
        }
        // Anchored to the `base`, so `*` doesn't descend into directories.
        (base, format!("/{glob}"))
    };

    let walker = globwalk::GlobWalkerBuilder::new(&base, &glob)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::Glob {
            pattern: pattern.to_owned(),
            message: e.to_string(),
        })?;

    Ok(walker
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .sorted()
        .map(|path| Input {
            path,
            contents: None,
        })
        .collect())
}

/// Splits the `pattern` into the longest base directory without glob
/// characters and the glob relative to it.
fn split_glob(pattern: &Path) -> (PathBuf, String) {
    let mut base = PathBuf::new();
    let mut glob = Vec::new();
    for c in pattern.components() {
        let part = c.as_os_str().to_string_lossy();
        if glob.is_empty() && !part.contains(&['*', '?', '[', '{'][..]) {
            base.push(c);
        } else {
            glob.push(part.into_owned());
        }
    }
    if base.as_os_str().is_empty() {
        base.push(".");
    }
    (base, glob.join("/"))
}

/// Compiles a glob `pattern` whose wildcards never cross a `/`.
fn glob_matcher(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

/// Error of discovering `.feature` files.
#[derive(Clone, Debug, Display, Error)]
pub enum Error {
    /// Filesystem glob pattern is malformed.
    #[display(fmt = "invalid glob `{}`: {}", pattern, message)]
    Glob {
        /// Malformed pattern.
        pattern: String,

        /// Reason.
        message: String,
    },

    /// [`Virtual`] pattern is malformed.
    #[display(fmt = "invalid pattern `{}`: {}", pattern, source)]
    Pattern {
        /// Malformed pattern.
        pattern: String,

        /// Reason.
        source: globset::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(inputs: Vec<Input>) -> Vec<String> {
        inputs
            .into_iter()
            .map(|i| i.path.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn glob_wildcards_stay_within_segment() {
        let m = glob_matcher("features/*.feature").unwrap();
        assert!(m.is_match("features/a.feature"));
        assert!(!m.is_match("features/nested/a.feature"));
        assert!(!m.is_match("features/a.featureX"));

        let m = glob_matcher("features/**/*.feature").unwrap();
        assert!(m.is_match("features/a.feature"));
        assert!(m.is_match("features/x/y/a.feature"));

        let m = glob_matcher("f?.feature").unwrap();
        assert!(m.is_match("f1.feature"));
        assert!(!m.is_match("f/.feature"));
    }

    #[test]
    fn virtual_supports_classes_and_alternation() {
        let fs = Virtual::new()
            .file("features/add.feature", "Feature: add")
            .file("features/sub.feature", "Feature: sub")
            .file("features/mul.feature", "Feature: mul");

        assert_eq!(
            names(
                Source::from(fs.clone().pattern("features/[a]*.feature"))
                    .discover()
                    .unwrap(),
            ),
            vec!["features/add.feature"],
        );
        assert_eq!(
            names(
                Source::from(fs.pattern("features/{add,sub}.feature"))
                    .discover()
                    .unwrap(),
            ),
            vec!["features/add.feature", "features/sub.feature"],
        );
    }

    #[test]
    fn malformed_virtual_pattern_is_reported() {
        let fs = Virtual::new().file("a.feature", "").pattern("[a");

        assert!(matches!(
            Source::from(fs).discover(),
            Err(Error::Pattern { pattern, .. }) if pattern == "[a",
        ));
    }

    #[test]
    fn virtual_selects_sorted() {
        let fs = Virtual::new()
            .file("features/b.feature", "Feature: b")
            .file("features/a.feature", "Feature: a")
            .file("other/c.feature", "Feature: c")
            .pattern("features/*.feature");

        let inputs = Source::from(fs).discover().unwrap();
        assert_eq!(
            names(inputs.clone()),
            vec!["features/a.feature", "features/b.feature"],
        );
        assert_eq!(inputs[0].contents.as_deref(), Some("Feature: a"));
    }

    #[test]
    fn virtual_without_patterns_selects_everything() {
        let fs = Virtual::new().file("x.feature", "").file("y.txt", "");

        assert_eq!(names(Source::from(fs).discover().unwrap()).len(), 2);
    }

    #[test]
    fn splits_glob_base() {
        assert_eq!(
            split_glob(Path::new("tests/features/*.feature")),
            (PathBuf::from("tests/features"), "*.feature".to_owned()),
        );
        assert_eq!(
            split_glob(Path::new("**/*.feature")),
            (PathBuf::from("."), "**/*.feature".to_owned()),
        );
        assert_eq!(
            split_glob(Path::new("/abs/dir")),
            (PathBuf::from("/abs/dir"), String::new()),
        );
    }

    #[test]
    fn missing_path_yields_nothing() {
        let inputs = Source::from("definitely/not/here/*.feature")
            .discover()
            .unwrap();

        assert!(inputs.is_empty());
    }
}
