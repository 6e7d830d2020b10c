// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI options of a [`Suite`] run.
//!
//! Merged into [`Options`] via [`Options::with_cli()`]:
//! ```rust,no_run
//! use gherkin_suite::{cli, Options};
//!
//! let options = Options::new().with_cli(cli::Opts::parsed());
//! ```
//!
//! [`Options`]: crate::Options
//! [`Options::with_cli()`]: crate::Options::with_cli
//! [`Suite`]: crate::Suite

use gherkin::tagexpr::TagOperation;
use smart_default::SmartDefault;

use crate::reporter::Coloring;

pub use clap::{Args, Parser};

/// Root CLI (command line interface) of a [`Suite`] run.
///
/// [`Suite`]: crate::Suite
#[derive(clap::Parser, Clone, Debug, SmartDefault)]
#[command(
    name = "gherkin-suite",
    about = "Run the `.feature` files.",
    long_about = "Run the `.feature` files against the registered steps."
)]
pub struct Opts {
    /// Path or glob pattern of `.feature` files to run.
    ///
    /// A directory means every `.feature` file below it.
    #[arg(long, short = 'i', value_name = "glob", global = true)]
    pub features: Option<String>,

    /// Tag expression to filter scenarios by.
    ///
    /// Note: Tags from Feature, Rule and Scenario are merged together on
    /// filtering, so be careful about conflicting tags on different levels.
    #[arg(
        id = "tags",
        long = "tags",
        short = 't',
        value_name = "tagexpr",
        global = true
    )]
    pub tags_filter: Option<TagOperation>,

    /// Tags of features, rules and scenarios to skip.
    #[arg(
        long = "ignore-tags",
        value_name = "tag",
        value_delimiter = ',',
        global = true
    )]
    pub ignore_tags: Vec<String>,

    /// Run features concurrently.
    #[arg(long, global = true)]
    pub parallel: bool,

    /// Coloring policy for a console output.
    #[arg(
        long,
        value_name = "auto|always|never",
        default_value = "auto",
        global = true
    )]
    #[default(Coloring::Auto)]
    pub color: Coloring,
}

impl Opts {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the trait
    /// being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as Parser>::parse()
    }
}
