// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bridge to a hosting test facility.
//!
//! A [`Suite`] reports into a tree of named units: one per [`Feature`],
//! [`Rule`], [`Scenario`] and [`Step`]. The [`Recorder`] keeps this tree in
//! memory, so it can be inspected afterwards.
//!
//! [`Feature`]: gherkin::Feature
//! [`Rule`]: gherkin::Rule
//! [`Scenario`]: gherkin::Scenario
//! [`Step`]: gherkin::Step
//! [`Suite`]: crate::Suite

use derive_more::Display;

/// Hosting test facility recording outcomes of nested units.
pub trait Host {
    /// Logs the `msg` into the current unit.
    fn log(&mut self, msg: &str);

    /// Marks the current unit as failed with the `msg`.
    fn error(&mut self, msg: &str);

    /// Marks the current unit as failed with the `msg`, after which nothing
    /// else is expected to run in it.
    fn fatal(&mut self, msg: &str);

    /// Marks the current unit as skipped with the `reason`.
    fn skip(&mut self, reason: &str) {
        self.log(reason);
    }

    /// Runs the `unit` as a nested unit with the given `name`.
    ///
    /// Returns `false` if the nested unit failed.
    fn run(&mut self, name: &str, unit: &mut dyn FnMut(&mut dyn Host)) -> bool;

    /// Marks the current unit as running in parallel with its siblings.
    fn parallel(&mut self) {}
}

/// Status of a [`Recorder`] unit.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Status {
    /// Neither the unit nor any of its nested units failed.
    #[display(fmt = "passed")]
    Passed,

    /// The unit or some of its nested units failed.
    #[display(fmt = "failed")]
    Failed,

    /// The unit was skipped.
    #[display(fmt = "skipped")]
    Skipped,
}

/// In-memory [`Host`] recording a tree of units.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    /// Name of this unit.
    name: String,

    /// Logged messages.
    logs: Vec<String>,

    /// Failure messages.
    errors: Vec<String>,

    /// Reason of skipping, if skipped.
    skipped: Option<String>,

    /// Whether this unit was marked as parallel.
    parallel: bool,

    /// Nested units, in execution order.
    children: Vec<Recorder>,
}

impl Recorder {
    /// Creates a root [`Recorder`] unit with the given `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Name of this unit.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Messages logged into this unit.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Failure messages of this unit, not including nested ones.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Reason of skipping this unit, if skipped.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        self.skipped.as_deref()
    }

    /// Indicates whether this unit was marked as parallel.
    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Nested units, in execution order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// First nested unit with the given `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Nested unit following the given `path` of names.
    #[must_use]
    pub fn at(&self, path: &[&str]) -> Option<&Self> {
        path.iter().try_fold(self, |unit, name| unit.child(name))
    }

    /// [`Status`] of this unit.
    ///
    /// A failure anywhere below makes the unit failed, even if it was
    /// skipped.
    #[must_use]
    pub fn status(&self) -> Status {
        if !self.errors.is_empty() || self.children.iter().any(Self::failed) {
            Status::Failed
        } else if self.skipped.is_some() {
            Status::Skipped
        } else {
            Status::Passed
        }
    }

    /// Indicates whether this unit or any nested one failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.status() == Status::Failed
    }

    /// Indicates whether this unit was skipped without failures.
    #[must_use]
    pub fn skipped(&self) -> bool {
        self.status() == Status::Skipped
    }

    /// Replays everything recorded in this unit into the `host`, nested
    /// units included.
    pub fn replay(&self, host: &mut dyn Host) {
        if self.parallel {
            host.parallel();
        }
        for msg in &self.logs {
            host.log(msg);
        }
        for msg in &self.errors {
            host.error(msg);
        }
        if let Some(reason) = &self.skipped {
            host.skip(reason);
        }
        for child in &self.children {
            _ = host.run(&child.name, &mut |h| child.replay(h));
        }
    }
}

impl Host for Recorder {
    fn log(&mut self, msg: &str) {
        self.logs.push(msg.to_owned());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_owned());
    }

    fn fatal(&mut self, msg: &str) {
        self.errors.push(msg.to_owned());
    }

    fn skip(&mut self, reason: &str) {
        self.skipped = Some(reason.to_owned());
    }

    fn run(&mut self, name: &str, unit: &mut dyn FnMut(&mut dyn Host)) -> bool {
        let mut child = Self::new(name);
        unit(&mut child);
        let passed = !child.failed();
        self.children.push(child);
        passed
    }

    fn parallel(&mut self) {
        self.parallel = true;
    }
}
