// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration of a [`Suite`] run.
//!
//! [`Suite`]: crate::Suite

use std::{fmt, sync::Arc};

use gherkin::tagexpr::TagOperation;
use smart_default::SmartDefault;

use crate::{cli, reporter::Coloring, source::Source, tag, Context};

/// Hook executed before or after [`Scenario`]s and [`Step`]s.
///
/// [`Scenario`]: gherkin::Scenario
/// [`Step`]: gherkin::Step
pub type HookFn = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Builder-style configuration of a [`Suite`].
///
/// ```rust
/// # use gherkin_suite::Options;
/// let options = Options::new()
///     .with_source("tests/features")
///     .with_ignored_tags(["@wip"])
///     .with_before_scenario(|ctx| ctx.set("user", "guest".to_owned()))
///     .run_in_parallel();
/// ```
///
/// [`Suite`]: crate::Suite
#[derive(Clone, SmartDefault)]
pub struct Options {
    /// Where to look for `.feature` files.
    pub(crate) source: Source,

    /// Tags a [`Scenario`] should have at least one of, unless empty.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub(crate) include_tags: Vec<String>,

    /// Tags skipping a [`Feature`], [`Rule`] or [`Scenario`].
    ///
    /// [`Feature`]: gherkin::Feature
    /// [`Rule`]: gherkin::Rule
    /// [`Scenario`]: gherkin::Scenario
    pub(crate) ignore_tags: Vec<String>,

    /// Tag expression a [`Scenario`] should satisfy, if any.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub(crate) tag_expression: Option<TagOperation>,

    /// Hooks executed before every [`Scenario`], in registration order.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub(crate) before_scenario: Vec<HookFn>,

    /// Hooks executed after every [`Scenario`], in registration order.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub(crate) after_scenario: Vec<HookFn>,

    /// Hooks executed before every [`Step`], in registration order.
    ///
    /// [`Step`]: gherkin::Step
    pub(crate) before_step: Vec<HookFn>,

    /// Hooks executed after every [`Step`], in registration order.
    ///
    /// [`Step`]: gherkin::Step
    pub(crate) after_step: Vec<HookFn>,

    /// Whether [`Feature`]s run concurrently.
    ///
    /// [`Feature`]: gherkin::Feature
    pub(crate) parallel: bool,

    /// Coloring of the console output.
    #[default(Coloring::Auto)]
    pub(crate) coloring: Coloring,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("source", &self.source)
            .field("include_tags", &self.include_tags)
            .field("ignore_tags", &self.ignore_tags)
            .field("tag_expression", &self.tag_expression)
            .field("before_scenario", &self.before_scenario.len())
            .field("after_scenario", &self.after_scenario.len())
            .field("before_step", &self.before_step.len())
            .field("after_step", &self.after_step.len())
            .field("parallel", &self.parallel)
            .field("coloring", &self.coloring)
            .finish()
    }
}

impl Options {
    /// Creates default [`Options`], reading `features/*.feature` files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the [`Source`] of `.feature` files.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Source>) -> Self {
        self.source = source.into();
        self
    }

    /// Runs only [`Scenario`]s having at least one of the `tags` (with or
    /// without a leading `@`), directly or inherited.
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Skips [`Feature`]s, [`Rule`]s and [`Scenario`]s having any of the
    /// `tags` (with or without a leading `@`), directly or inherited.
    ///
    /// [`Feature`]: gherkin::Feature
    /// [`Rule`]: gherkin::Rule
    /// [`Scenario`]: gherkin::Scenario
    #[must_use]
    pub fn with_ignored_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Runs only [`Scenario`]s satisfying the [tag expression][1].
    ///
    /// [1]: https://cucumber.io/docs/cucumber/api#tag-expressions
    /// [`Scenario`]: gherkin::Scenario
    #[must_use]
    pub fn with_tag_expression(mut self, expr: TagOperation) -> Self {
        self.tag_expression = Some(expr);
        self
    }

    /// Adds a `hook` executed before every [`Scenario`].
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[must_use]
    pub fn with_before_scenario<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.before_scenario.push(Arc::new(hook));
        self
    }

    /// Adds a `hook` executed after every [`Scenario`], even a failed one.
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[must_use]
    pub fn with_after_scenario<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.after_scenario.push(Arc::new(hook));
        self
    }

    /// Adds a `hook` executed before every [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn with_before_step<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.before_step.push(Arc::new(hook));
        self
    }

    /// Adds a `hook` executed after every [`Step`], even a failed one.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn with_after_step<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.after_step.push(Arc::new(hook));
        self
    }

    /// Runs [`Feature`]s concurrently.
    ///
    /// [`Feature`]: gherkin::Feature
    #[must_use]
    pub const fn run_in_parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Sets the [`Coloring`] of the console output.
    #[must_use]
    pub const fn with_coloring(mut self, coloring: Coloring) -> Self {
        self.coloring = coloring;
        self
    }

    /// Overrides these [`Options`] with the ones given in the command line.
    #[must_use]
    pub fn with_cli(mut self, cli: cli::Opts) -> Self {
        let cli::Opts {
            features,
            tags_filter,
            ignore_tags,
            parallel,
            color,
        } = cli;

        if let Some(features) = features {
            self.source = features.into();
        }
        if let Some(expr) = tags_filter {
            self.tag_expression = Some(expr);
        }
        self.ignore_tags.extend(ignore_tags);
        self.parallel |= parallel;
        self.coloring = color;
        self
    }

    /// [`Source`] of `.feature` files.
    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    /// Indicates whether [`Feature`]s run concurrently.
    ///
    /// [`Feature`]: gherkin::Feature
    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// [`Coloring`] of the console output.
    #[must_use]
    pub const fn coloring(&self) -> Coloring {
        self.coloring
    }

    /// [`tag::Filter`] built out of these [`Options`].
    #[must_use]
    pub fn filter(&self) -> tag::Filter {
        let filter = tag::Filter::new(&self.include_tags, &self.ignore_tags);
        match &self.tag_expression {
            Some(expr) => filter.with_expression(expr.clone()),
            None => filter,
        }
    }
}
