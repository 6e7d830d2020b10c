// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Reporter`]-wrapper for collecting a summary of execution.

use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::event;

use super::{Outputted, Reporter};

/// Numbers of passed, skipped and failed units.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Number of passed units.
    pub passed: usize,

    /// Number of skipped units.
    pub skipped: usize,

    /// Number of failed units.
    pub failed: usize,
}

impl Stats {
    /// Total number of units.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.skipped + self.failed
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} skipped, {} failed",
            self.passed, self.skipped, self.failed,
        )
    }
}

/// Summary of a [`Suite`] run, collected from its events.
///
/// [`Suite`]: crate::Suite
#[derive(Clone, Debug, Default)]
pub struct Summary {
    /// [`Feature`]s [`Stats`].
    ///
    /// [`Feature`]: gherkin::Feature
    pub features: Stats,

    /// Number of started [`Rule`]s.
    ///
    /// [`Rule`]: gherkin::Rule
    pub rules: usize,

    /// [`Scenario`]s [`Stats`], counting every [Scenario Outline][1] row.
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
    /// [`Scenario`]: gherkin::Scenario
    pub scenarios: Stats,

    /// [`Step`]s [`Stats`], [`Background`] ones included.
    ///
    /// [`Background`]: gherkin::Background
    /// [`Step`]: gherkin::Step
    pub steps: Stats,

    /// Number of `.feature` files failed to be parsed.
    pub parsing_errors: usize,

    /// Number of failed hooks.
    pub hook_errors: usize,

    /// Number of failed [`Step`] registrations.
    ///
    /// [`Step`]: gherkin::Step
    pub registration_errors: usize,

    /// Duration of the whole run, once finished.
    pub elapsed: Option<Duration>,

    /// Moment the run started at.
    started: Option<Instant>,

    /// Whether the current [`Feature`] has failed so far.
    ///
    /// [`Feature`]: gherkin::Feature
    feature_failed: bool,

    /// Whether the current [`Scenario`] has failed so far.
    ///
    /// [`Scenario`]: gherkin::Scenario
    scenario_failed: bool,
}

impl Summary {
    /// Creates an empty [`Summary`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indicates whether anything has failed.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.features.failed > 0
            || self.scenarios.failed > 0
            || self.steps.failed > 0
            || self.parsing_errors > 0
            || self.hook_errors > 0
            || self.registration_errors > 0
    }

    /// Keeps track of [`Scenario`] [`Stats`].
    ///
    /// [`Scenario`]: gherkin::Scenario
    fn handle_scenario(&mut self, ev: &event::Scenario) {
        use event::{Hook, Scenario, Step};

        match ev {
            Scenario::Started => self.scenario_failed = false,
            Scenario::Skipped => self.scenarios.skipped += 1,
            Scenario::Hook(_, Hook::Failed(_)) => {
                self.hook_errors += 1;
                self.scenario_failed = true;
            }
            Scenario::Background(_, ev) | Scenario::Step(_, ev) => match ev {
                Step::Started => {}
                Step::Passed => self.steps.passed += 1,
                Step::Skipped(_) => self.steps.skipped += 1,
                Step::Failed(_) => {
                    self.steps.failed += 1;
                    self.scenario_failed = true;
                }
            },
            Scenario::Finished => {
                if self.scenario_failed {
                    self.scenarios.failed += 1;
                    self.feature_failed = true;
                } else {
                    self.scenarios.passed += 1;
                }
            }
            Scenario::Hook(..) => {}
        }
    }
}

impl Reporter for Summary {
    fn handle_event(&mut self, ev: &event::Suite) {
        use event::{Feature, Rule, Suite};

        match ev {
            Suite::Started => self.started = Some(Instant::now()),
            Suite::ParsingError(_) => self.parsing_errors += 1,
            Suite::Feature(_, ev) => match ev {
                Feature::Started => self.feature_failed = false,
                Feature::Skipped => self.features.skipped += 1,
                Feature::Rule(_, Rule::Started) => self.rules += 1,
                Feature::Rule(_, Rule::Scenario(_, ev))
                | Feature::Scenario(_, ev) => self.handle_scenario(ev),
                Feature::Finished => {
                    if self.feature_failed {
                        self.features.failed += 1;
                    } else {
                        self.features.passed += 1;
                    }
                }
                Feature::Rule(..) => {}
            },
            Suite::Finished => {
                self.elapsed = self.started.map(|s| s.elapsed());
            }
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Summary]")?;
        writeln!(f, "{} features ({})", self.features.total(), self.features)?;
        writeln!(f, "{} rules", self.rules)?;
        writeln!(
            f,
            "{} scenarios ({})",
            self.scenarios.total(),
            self.scenarios,
        )?;
        write!(f, "{} steps ({})", self.steps.total(), self.steps)?;

        for (count, what) in [
            (self.parsing_errors, "parsing errors"),
            (self.hook_errors, "hook errors"),
            (self.registration_errors, "registration errors"),
        ] {
            if count > 0 {
                write!(f, "\n{count} {what}")?;
            }
        }
        if let Some(elapsed) = self.elapsed {
            // Truncated to milliseconds.
            let elapsed = Duration::from_millis(
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            );
            write!(f, "\nfinished in {}", humantime::format_duration(elapsed))?;
        }
        Ok(())
    }
}

/// Wrapper for a [`Reporter`] implementation for outputting a [`Summary`]
/// (number of features, scenarios, steps and errors) of execution.
#[derive(Clone, Debug)]
pub struct Summarized<R> {
    /// Wrapped [`Reporter`].
    reporter: R,

    /// Collected [`Summary`].
    summary: Summary,
}

impl<R> Summarized<R> {
    /// Wraps the `reporter` into a new [`Summarized`].
    #[must_use]
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            summary: Summary::new(),
        }
    }

    /// [`Summary`] collected so far.
    #[must_use]
    pub const fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Wrapped [`Reporter`].
    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.reporter
    }

    /// Unwraps the inner [`Reporter`].
    #[must_use]
    pub fn into_inner(self) -> R {
        self.reporter
    }
}

impl<R: Outputted> Reporter for Summarized<R> {
    fn handle_event(&mut self, ev: &event::Suite) {
        self.summary.handle_event(ev);
        self.reporter.handle_event(ev);

        if matches!(ev, event::Suite::Finished) {
            let summary = self.summary.to_string();
            self.reporter.write(&summary);
        }
    }
}

impl<R: Outputted> Outputted for Summarized<R> {
    fn write(&mut self, output: &str) {
        self.reporter.write(output);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{event::Suite, step};

    /// [`Outputted`] [`Reporter`] remembering everything written into it.
    #[derive(Default)]
    struct Written(Vec<String>);

    impl Reporter for Written {
        fn handle_event(&mut self, _: &event::Suite) {}
    }

    impl Outputted for Written {
        fn write(&mut self, output: &str) {
            self.0.push(output.to_owned());
        }
    }

    fn feature() -> Arc<gherkin::Feature> {
        Arc::new(
            gherkin::Feature::parse(
                "Feature: f\n  Scenario: s\n    Given a\n    Then b\n",
                gherkin::GherkinEnv::default(),
            )
            .unwrap(),
        )
    }

    fn run(events: Vec<Suite>) -> Summarized<Written> {
        let mut reporter = Summarized::new(Written::default());
        for ev in &events {
            reporter.handle_event(ev);
        }
        reporter
    }

    fn scenario_events(failing: bool) -> Vec<Suite> {
        let f = feature();
        let sc = Arc::new(f.scenarios[0].clone());
        let first = Arc::new(sc.steps[0].clone());
        let second = Arc::new(sc.steps[1].clone());
        let outcome = if failing {
            event::Step::Failed(step::Error::Unmatched { step: "b".into() })
        } else {
            event::Step::Passed
        };
        let ev = |e| Suite::scenario(f.clone(), None, sc.clone(), e);

        vec![
            Suite::Started,
            Suite::feature_started(f.clone()),
            ev(event::Scenario::Started),
            ev(event::Scenario::step(first.clone(), true, event::Step::Passed)),
            ev(event::Scenario::step(second.clone(), false, outcome)),
            ev(event::Scenario::Finished),
            Suite::feature_finished(f.clone()),
            Suite::Finished,
        ]
    }

    #[test]
    fn counts_passed_run() {
        let reporter = run(scenario_events(false));
        let summary = reporter.summary();

        assert!(!summary.failed());
        assert_eq!(summary.features.passed, 1);
        assert_eq!(summary.scenarios.passed, 1);
        assert_eq!(summary.steps.passed, 2);
        assert!(summary.elapsed.is_some());
    }

    #[test]
    fn failed_step_fails_scenario_and_feature() {
        let reporter = run(scenario_events(true));
        let summary = reporter.summary();

        assert!(summary.failed());
        assert_eq!(
            summary.steps,
            Stats {
                passed: 1,
                skipped: 0,
                failed: 1,
            },
        );
        assert_eq!(summary.scenarios.failed, 1);
        assert_eq!(summary.features.failed, 1);
    }

    #[test]
    fn writes_summary_once_finished() {
        let reporter = run(scenario_events(false));
        let written = &reporter.inner().0;

        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with("[Summary]\n1 features (1 passed"));
        assert!(written[0].contains("2 steps (2 passed, 0 skipped, 0 failed)"));
        assert!(!written[0].contains("errors"));
    }

    #[test]
    fn counts_errors() {
        let mut summary = Summary::new();
        summary.handle_event(&Suite::ParsingError(crate::parser::Error::Memory {
            path: "broken.feature".into(),
            source: Arc::new(
                gherkin::Feature::parse("Nonsense", Default::default())
                    .unwrap_err(),
            ),
        }));
        summary.registration_errors = 2;

        assert!(summary.failed());
        let out = summary.to_string();
        assert!(out.contains("\n1 parsing errors"));
        assert!(out.contains("\n2 registration errors"));
    }
}
