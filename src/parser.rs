// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsing of [Gherkin] files.
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

use std::{path::PathBuf, sync::Arc};

use derive_more::{Display, Error};

use crate::source::Input;

/// Result of parsing [Gherkin] files.
///
/// [Gherkin]: https://cucumber.io/docs/gherkin/reference
pub type Result<T> = std::result::Result<T, Error>;

/// Error of parsing a `.feature` file.
#[derive(Clone, Debug, Display, Error)]
pub enum Error {
    /// Failed to read or parse a file from the filesystem.
    #[display(fmt = "Failed to parse feature: {}", _0)]
    File(Arc<gherkin::ParseFileError>),

    /// Failed to parse an in-memory file.
    #[display(fmt = "Failed to parse feature {}: {}", "path.display()", source)]
    Memory {
        /// Name of the in-memory file.
        path: PathBuf,

        /// Parsing error.
        source: Arc<gherkin::ParseError>,
    },
}

impl Error {
    /// Path of the file failed to parse.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::File(e) => match &**e {
                gherkin::ParseFileError::Reading { path, .. }
                | gherkin::ParseFileError::Parsing { path, .. } => {
                    Some(path.as_path())
                }
            },
            Self::Memory { path, .. } => Some(path.as_path()),
        }
    }
}

/// Parses the `input` into a [`Feature`].
///
/// In-memory files get their name as the [`Feature::path`].
///
/// # Errors
///
/// If the file cannot be read or isn't valid [Gherkin].
///
/// [`Feature`]: gherkin::Feature
/// [`Feature::path`]: gherkin::Feature::path
/// [Gherkin]: https://cucumber.io/docs/gherkin/reference
pub fn parse(input: &Input) -> Result<gherkin::Feature> {
    let env = gherkin::GherkinEnv::default();
    match &input.contents {
        None => gherkin::Feature::parse_path(&input.path, env)
            .map_err(|e| Error::File(Arc::new(e))),
        Some(contents) => gherkin::Feature::parse(contents, env)
            .map(|mut feature| {
                feature.path = Some(input.path.clone());
                feature
            })
            .map_err(|e| Error::Memory {
                path: input.path.clone(),
                source: Arc::new(e),
            }),
    }
}
