// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Key occurrences in the lifecycle of a [`Suite`] run.
//!
//! The top-level enum here is [`Suite`].
//!
//! Each event enum contains variants indicating what stage of execution the
//! run is at and, variants with detailed content about the precise
//! sub-event.
//!
//! [`Suite`]: crate::Suite

use std::sync::Arc;

use derive_more::Display;

use crate::{parser, step};

/// Top-level [`Suite`] run event.
///
/// [`Suite`]: crate::Suite
#[derive(Clone, Debug)]
pub enum Suite {
    /// Event for a [`Suite`] run started.
    ///
    /// [`Suite`]: crate::Suite
    Started,

    /// `.feature` file failed to be parsed.
    ParsingError(parser::Error),

    /// [`Feature`] event.
    Feature(Arc<gherkin::Feature>, Feature),

    /// Event for a [`Suite`] run finished.
    ///
    /// [`Suite`]: crate::Suite
    Finished,
}

impl Suite {
    /// Constructs event of a [`Feature`] being started.
    ///
    /// [`Feature`]: gherkin::Feature
    #[must_use]
    pub const fn feature_started(feature: Arc<gherkin::Feature>) -> Self {
        Self::Feature(feature, Feature::Started)
    }

    /// Constructs event of a [`Feature`] being skipped by its tags.
    ///
    /// [`Feature`]: gherkin::Feature
    #[must_use]
    pub const fn feature_skipped(feature: Arc<gherkin::Feature>) -> Self {
        Self::Feature(feature, Feature::Skipped)
    }

    /// Constructs event of a finished [`Feature`].
    ///
    /// [`Feature`]: gherkin::Feature
    #[must_use]
    pub const fn feature_finished(feature: Arc<gherkin::Feature>) -> Self {
        Self::Feature(feature, Feature::Finished)
    }

    /// Constructs event of a [`Rule`].
    ///
    /// [`Rule`]: gherkin::Rule
    #[must_use]
    pub const fn rule(
        feature: Arc<gherkin::Feature>,
        rule: Arc<gherkin::Rule>,
        event: Rule,
    ) -> Self {
        Self::Feature(feature, Feature::Rule(rule, event))
    }

    /// Constructs [`Suite`] event from a [`Scenario`] and its path.
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[must_use]
    pub fn scenario(
        feature: Arc<gherkin::Feature>,
        rule: Option<Arc<gherkin::Rule>>,
        scenario: Arc<gherkin::Scenario>,
        event: Scenario,
    ) -> Self {
        #[allow(clippy::option_if_let_else)] // use of moved value: `event`
        if let Some(r) = rule {
            Self::Feature(
                feature,
                Feature::Rule(r, Rule::Scenario(scenario, event)),
            )
        } else {
            Self::Feature(feature, Feature::Scenario(scenario, event))
        }
    }
}

/// Event specific to a particular [Feature].
///
/// [Feature]: https://cucumber.io/docs/gherkin/reference#feature
#[derive(Clone, Debug)]
pub enum Feature {
    /// Event for a [`Feature`] execution started.
    ///
    /// [`Feature`]: gherkin::Feature
    Started,

    /// [`Feature`] was skipped by its tags.
    ///
    /// [`Feature`]: gherkin::Feature
    Skipped,

    /// [`Rule`] event.
    Rule(Arc<gherkin::Rule>, Rule),

    /// [`Scenario`] event.
    Scenario(Arc<gherkin::Scenario>, Scenario),

    /// Event for a [`Feature`] execution finished.
    ///
    /// [`Feature`]: gherkin::Feature
    Finished,
}

/// Event specific to a particular [Rule].
///
/// [Rule]: https://cucumber.io/docs/gherkin/reference#rule
#[derive(Clone, Debug)]
pub enum Rule {
    /// Event for a [`Rule`] execution started.
    ///
    /// [`Rule`]: gherkin::Rule
    Started,

    /// [`Rule`] was skipped by its tags.
    ///
    /// [`Rule`]: gherkin::Rule
    Skipped,

    /// [`Scenario`] event.
    Scenario(Arc<gherkin::Scenario>, Scenario),

    /// Event for a [`Rule`] execution finished.
    ///
    /// [`Rule`]: gherkin::Rule
    Finished,
}

/// Event specific to a particular [Scenario].
///
/// Rows of a [Scenario Outline][1] are reported as separate concrete
/// [Scenario]s.
///
/// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
/// [Scenario]: https://cucumber.io/docs/gherkin/reference#example
#[derive(Clone, Debug)]
pub enum Scenario {
    /// Event for a [`Scenario`] execution started.
    ///
    /// [`Scenario`]: gherkin::Scenario
    Started,

    /// [`Scenario`] was skipped by its tags.
    ///
    /// [`Scenario`]: gherkin::Scenario
    Skipped,

    /// [`Hook`] event.
    Hook(HookType, Hook),

    /// [`Background`] [`Step`] event.
    ///
    /// [`Background`]: gherkin::Background
    /// [`Step`]: gherkin::Step
    Background(Arc<gherkin::Step>, Step),

    /// [`Step`] event.
    ///
    /// [`Step`]: gherkin::Step
    Step(Arc<gherkin::Step>, Step),

    /// Event for a [`Scenario`] execution finished.
    ///
    /// [`Scenario`]: gherkin::Scenario
    Finished,
}

impl Scenario {
    /// Constructs an event of a [`Step`] or a [`Background`] one.
    ///
    /// [`Background`]: gherkin::Background
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn step(step: Arc<gherkin::Step>, background: bool, event: Step) -> Self {
        if background {
            Self::Background(step, event)
        } else {
            Self::Step(step, event)
        }
    }
}

/// Event specific to a particular [Step].
///
/// [Step]: https://cucumber.io/docs/gherkin/reference#step
#[derive(Clone, Debug)]
pub enum Step {
    /// [`Step`] execution started.
    ///
    /// [`Step`]: gherkin::Step
    Started,

    /// [`Step`] passed.
    ///
    /// [`Step`]: gherkin::Step
    Passed,

    /// [`Step`] skipped itself with the given reason.
    ///
    /// [`Step`]: gherkin::Step
    Skipped(String),

    /// [`Step`] failed.
    ///
    /// [`Step`]: gherkin::Step
    Failed(step::Error),
}

/// Type of a hook executed before or after [`Scenario`]s and [`Step`]s.
///
/// [`Scenario`]: gherkin::Scenario
/// [`Step`]: gherkin::Step
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum HookType {
    /// Executing before every [`Scenario`].
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[display(fmt = "Before scenario")]
    BeforeScenario,

    /// Executing after every [`Scenario`].
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[display(fmt = "After scenario")]
    AfterScenario,

    /// Executing before every [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[display(fmt = "Before step")]
    BeforeStep,

    /// Executing after every [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[display(fmt = "After step")]
    AfterStep,
}

/// Event of a hook execution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Hook {
    /// Hook execution started.
    Started,

    /// Hook passed.
    Passed,

    /// Hook panicked with the given message.
    Failed(String),
}
