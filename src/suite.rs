// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level [`Suite`] running `.feature` files against registered
//! [`Step`] functions.
//!
//! [`Step`]: gherkin::Step

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

use itertools::Itertools as _;
use regex::Regex;

use crate::{
    event::{self, HookType},
    host::{Host, Recorder},
    options::{HookFn, Options},
    outline, parser,
    reporter::{Basic, Discard, Ext as _, Reporter, Summary},
    step::{
        invoke, panic_message, Arg, IntoStepResult, Kind, Outcome,
        RegistrationError, Registry, Report, StepArgs, StepTest,
    },
    tag, Context,
};

/// Top-level runner of `.feature` files.
///
/// ```rust,no_run
/// use gherkin_suite::{Context, Options, Suite};
///
/// let mut suite = Suite::new(Options::new().with_source("tests/features"));
/// suite
///     .add_step(r"I add (\d+) and (\d+)", |_, ctx, (a, b): (i64, i64)| {
///         ctx.set("sumRes", a + b);
///     })
///     .unwrap();
/// suite
///     .add_step(r"the result should equal (\d+)", |t, ctx, (want,): (i64,)| {
///         if ctx.get_i64(&"sumRes") != Ok(want) {
///             t.error(format!("expected {want}"));
///         }
///     })
///     .unwrap();
///
/// suite.run_and_exit();
/// ```
#[derive(Clone, Debug, Default)]
pub struct Suite {
    /// Registered [`Step`] functions.
    ///
    /// [`Step`]: gherkin::Step
    registry: Registry,

    /// Configuration of runs.
    options: Options,
}

impl Suite {
    /// Creates a new [`Suite`] with the given [`Options`] and no [`Step`]s.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            registry: Registry::new(),
            options,
        }
    }

    /// Registers a [`Step`] function for the `pattern`.
    ///
    /// See [`Registry::add_step()`] for details.
    ///
    /// # Errors
    ///
    /// If the `pattern` doesn't compile, or the function's parameters are
    /// invalid. The [`Suite`] refuses to run afterwards.
    ///
    /// [`Step`]: gherkin::Step
    pub fn add_step<A, F, O>(
        &mut self,
        pattern: &str,
        step_fn: F,
    ) -> Result<(), RegistrationError>
    where
        A: StepArgs,
        F: Fn(&mut StepTest, &mut Context, A) -> O + Send + Sync + 'static,
        O: IntoStepResult,
    {
        self.registry.add_step(pattern, step_fn)
    }

    /// Registers a [`Step`] function for the pre-compiled `regex`.
    ///
    /// # Errors
    ///
    /// If the function's parameters are invalid. The [`Suite`] refuses to
    /// run afterwards.
    ///
    /// [`Step`]: gherkin::Step
    pub fn add_regex_step<A, F, O>(
        &mut self,
        regex: Regex,
        step_fn: F,
    ) -> Result<(), RegistrationError>
    where
        A: StepArgs,
        F: Fn(&mut StepTest, &mut Context, A) -> O + Send + Sync + 'static,
        O: IntoStepResult,
    {
        self.registry.add_regex_step(regex, step_fn)
    }

    /// Registers an untyped [`Step`] function receiving its arguments as
    /// described by the `kinds`.
    ///
    /// # Errors
    ///
    /// If the `pattern` doesn't compile, or the `kinds` are invalid. The
    /// [`Suite`] refuses to run afterwards.
    ///
    /// [`Step`]: gherkin::Step
    pub fn add_raw_step<F>(
        &mut self,
        pattern: &str,
        kinds: Vec<Kind>,
        step_fn: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&mut StepTest, &mut Context, Vec<Arg>) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.registry.add_raw_step(pattern, kinds, step_fn)
    }

    /// Registers (or overrides) a parameter type `alias`, like `{color}`,
    /// expanding into any of the regex `fragments`.
    ///
    /// # Errors
    ///
    /// If the `alias` is malformed or any of the `fragments` doesn't
    /// compile. The [`Suite`] refuses to run afterwards.
    pub fn add_parameter_type<I, S>(
        &mut self,
        alias: &str,
        fragments: I,
    ) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.add_parameter_type(alias, fragments)
    }

    /// [`Registry`] of this [`Suite`].
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// [`Options`] of this [`Suite`].
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Runs this [`Suite`], reporting outcomes into the `host` only.
    pub fn run(&mut self, host: &mut dyn Host) -> Summary {
        self.run_with(host, &mut Discard)
    }

    /// Runs this [`Suite`], reporting outcomes into the `host` and events
    /// into the `reporter`.
    ///
    /// Nothing runs if any [`Step`] registration has failed.
    ///
    /// [`Step`]: gherkin::Step
    pub fn run_with(
        &mut self,
        host: &mut dyn Host,
        reporter: &mut dyn Reporter,
    ) -> Summary {
        let mut summary = Summary::new();
        summary.registration_errors = self.registry.errors().len();

        let mut out = Fanout {
            summary: &mut summary,
            reporter,
        };
        out.handle_event(&event::Suite::Started);

        if self.registry.errors().is_empty() {
            let features = self.parse(host, &mut out);
            if self.options.parallel {
                self.run_parallel(features, host, &mut out);
            } else {
                let filter = self.options.filter();
                for feature in features {
                    Executor {
                        registry: &mut self.registry,
                        options: &self.options,
                        filter: &filter,
                        reporter: &mut out,
                    }
                    .feature(feature, host);
                }
            }
        } else {
            for e in self.registry.errors() {
                tracing::error!(error = %e, "step registration failed");
                host.fatal(&format!("step registration failed: {e}"));
            }
        }

        out.handle_event(&event::Suite::Finished);
        summary
    }

    /// Runs this [`Suite`] with a [`Recorder`] host, printing the outcomes
    /// and a summary to the STDOUT.
    ///
    /// # Panics
    ///
    /// If anything has failed.
    pub fn run_and_exit(&mut self) {
        let mut host = Recorder::new("suite");
        let mut reporter = Basic::stdout(self.options.coloring).summarized();
        let summary = self.run_with(&mut host, &mut reporter);

        if summary.failed() {
            let plural = |n: usize| if n == 1 { "" } else { "s" };
            let failed = summary.steps.failed;
            let errors = summary.parsing_errors
                + summary.hook_errors
                + summary.registration_errors;
            panic!(
                "{failed} step{} failed, {errors} other error{}",
                plural(failed),
                plural(errors),
            );
        }
    }

    /// Discovers and parses `.feature` files, reporting the failed ones.
    fn parse(
        &self,
        host: &mut dyn Host,
        out: &mut Fanout<'_>,
    ) -> Vec<Arc<gherkin::Feature>> {
        let inputs = match self.options.source.discover() {
            Ok(inputs) => inputs,
            Err(e) => {
                tracing::error!(error = %e, "cannot discover features");
                host.fatal(&format!("cannot discover features: {e}"));
                out.summary.parsing_errors += 1;
                return Vec::new();
            }
        };

        inputs
            .iter()
            .filter_map(|input| match parser::parse(input) {
                Ok(feature) => Some(Arc::new(feature)),
                Err(e) => {
                    let path = input.path.display().to_string();
                    tracing::warn!(%path, error = %e, "failed to parse feature");
                    _ = host.run(&path, &mut |h| h.fatal(&e.to_string()));
                    out.handle_event(&event::Suite::ParsingError(e));
                    None
                }
            })
            .collect()
    }

    /// Runs the `features` concurrently, each against its own snapshot of
    /// the [`Registry`], and replays their outcomes in order afterwards.
    fn run_parallel(
        &self,
        features: Vec<Arc<gherkin::Feature>>,
        host: &mut dyn Host,
        out: &mut Fanout<'_>,
    ) {
        let filter = self.options.filter();
        let results = thread::scope(|s| {
            features
                .into_iter()
                .map(|feature| {
                    let mut registry = self.registry.clone();
                    let (options, filter) = (&self.options, &filter);
                    s.spawn(move || {
                        let mut recorder = Recorder::default();
                        let mut events = Buffer::default();
                        Executor {
                            registry: &mut registry,
                            options,
                            filter,
                            reporter: &mut events,
                        }
                        .feature(feature, &mut recorder);
                        (recorder, events)
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(thread::ScopedJoinHandle::join)
                .collect::<Vec<_>>()
        });

        for res in results {
            match res {
                Ok((recorder, events)) => {
                    recorder.replay(host);
                    for ev in &events.0 {
                        out.handle_event(ev);
                    }
                }
                Err(payload) => {
                    let msg = panic_message(&*payload);
                    tracing::error!(%msg, "feature thread panicked");
                    host.error(&format!("feature thread panicked: {msg}"));
                }
            }
        }
    }
}

/// [`Reporter`] feeding both a [`Summary`] and another [`Reporter`].
struct Fanout<'a> {
    summary: &'a mut Summary,
    reporter: &'a mut dyn Reporter,
}

impl Reporter for Fanout<'_> {
    fn handle_event(&mut self, ev: &event::Suite) {
        self.summary.handle_event(ev);
        self.reporter.handle_event(ev);
    }
}

/// [`Reporter`] buffering events of a concurrently running [`Feature`].
///
/// [`Feature`]: gherkin::Feature
#[derive(Default)]
struct Buffer(Vec<event::Suite>);

impl Reporter for Buffer {
    fn handle_event(&mut self, ev: &event::Suite) {
        self.0.push(ev.clone());
    }
}

/// Item of a [`Feature`], in declaration order.
///
/// [`Feature`]: gherkin::Feature
enum Child<'f> {
    Scenario(&'f gherkin::Scenario),
    Rule(&'f gherkin::Rule),
}

impl Child<'_> {
    const fn line(&self) -> usize {
        match self {
            Self::Scenario(sc) => sc.position.line,
            Self::Rule(r) => r.position.line,
        }
    }
}

/// Executor of a single [`Feature`].
///
/// [`Feature`]: gherkin::Feature
struct Executor<'a> {
    registry: &'a mut Registry,
    options: &'a Options,
    filter: &'a tag::Filter,
    reporter: &'a mut dyn Reporter,
}

/// Constructor of [`event::Suite`]s for the currently running [`Scenario`].
///
/// [`Scenario`]: gherkin::Scenario
type ScenarioEvent<'e> = &'e dyn Fn(event::Scenario) -> event::Suite;

impl Executor<'_> {
    fn emit(&mut self, ev: event::Suite) {
        self.reporter.handle_event(&ev);
    }

    fn feature(&mut self, feature: Arc<gherkin::Feature>, host: &mut dyn Host) {
        let span = tracing::info_span!("feature", name = %feature.name);
        let _enter = span.enter();

        if self.filter.ignores(tag::inherited(&feature, None, None)) {
            tracing::debug!("feature skipped by tags");
            self.emit(event::Suite::feature_skipped(Arc::clone(&feature)));
            _ = host.run(&feature.name, &mut |h| h.skip("skipped by tags"));
            return;
        }

        let parallel = self.options.parallel;
        let passed = host.run(&feature.name, &mut |h| {
            if parallel {
                h.parallel();
            }
            self.emit(event::Suite::feature_started(Arc::clone(&feature)));

            let children = feature
                .scenarios
                .iter()
                .map(Child::Scenario)
                .merge_by(feature.rules.iter().map(Child::Rule), |l, r| {
                    l.line() <= r.line()
                });
            for child in children {
                match child {
                    Child::Scenario(sc) => self.scenario(&feature, None, sc, h),
                    Child::Rule(r) => self.rule(&feature, r, h),
                }
            }

            self.emit(event::Suite::feature_finished(Arc::clone(&feature)));
        });
        tracing::debug!(passed, "feature finished");
    }

    fn rule(
        &mut self,
        feature: &Arc<gherkin::Feature>,
        rule: &gherkin::Rule,
        host: &mut dyn Host,
    ) {
        let rule = Arc::new(rule.clone());
        let ev = |e| event::Suite::rule(Arc::clone(feature), Arc::clone(&rule), e);

        if self.filter.ignores(tag::inherited(feature, Some(&*rule), None)) {
            tracing::debug!(name = %rule.name, "rule skipped by tags");
            self.emit(ev(event::Rule::Skipped));
            _ = host.run(&rule.name, &mut |h| h.skip("skipped by tags"));
            return;
        }

        _ = host.run(&rule.name, &mut |h| {
            self.emit(ev(event::Rule::Started));
            for sc in &rule.scenarios {
                self.scenario(feature, Some(&rule), sc, h);
            }
            self.emit(ev(event::Rule::Finished));
        });
    }

    /// Runs the `scenario`, or every row of it, if it's an outline.
    fn scenario(
        &mut self,
        feature: &Arc<gherkin::Feature>,
        rule: Option<&Arc<gherkin::Rule>>,
        scenario: &gherkin::Scenario,
        host: &mut dyn Host,
    ) {
        if !outline::is_outline(scenario) {
            let scenario = Arc::new(scenario.clone());
            self.concrete(feature, rule, scenario, Context::new(), host);
            return;
        }

        let rows = outline::expand(scenario, self.registry)
            .into_iter()
            .map(Arc::new)
            .collect::<Vec<_>>();
        tracing::debug!(name = %scenario.name, rows = rows.len(), "outline expanded");

        let base = Context::new();
        _ = host.run(&scenario.name, &mut |h| {
            for row in &rows {
                self.concrete(feature, rule, Arc::clone(row), base.clone(), h);
            }
        });
    }

    /// Runs the concrete `scenario` against the `ctx`.
    fn concrete(
        &mut self,
        feature: &Arc<gherkin::Feature>,
        rule: Option<&Arc<gherkin::Rule>>,
        scenario: Arc<gherkin::Scenario>,
        mut ctx: Context,
        host: &mut dyn Host,
    ) {
        let ev = |e| {
            event::Suite::scenario(
                Arc::clone(feature),
                rule.cloned(),
                Arc::clone(&scenario),
                e,
            )
        };

        let tags =
            tag::inherited(feature, rule.map(|r| &**r), Some(&*scenario));
        if self.filter.skips(tags) {
            tracing::debug!(name = %scenario.name, "scenario skipped by tags");
            self.emit(ev(event::Scenario::Skipped));
            _ = host.run(&scenario.name, &mut |h| h.skip("skipped by tags"));
            return;
        }

        let span = tracing::info_span!("scenario", name = %scenario.name);
        let _enter = span.enter();

        _ = host.run(&scenario.name, &mut |h| {
            self.emit(ev(event::Scenario::Started));
            self.hooks(HookType::BeforeScenario, &mut ctx, h, &ev);

            let backgrounds = feature
                .background
                .iter()
                .chain(rule.and_then(|r| r.background.as_ref()))
                .flat_map(|b| &b.steps);
            for st in backgrounds {
                self.step(st, true, &mut ctx, h, &ev);
            }
            for st in &scenario.steps {
                self.step(st, false, &mut ctx, h, &ev);
            }

            self.hooks(HookType::AfterScenario, &mut ctx, h, &ev);
            self.emit(ev(event::Scenario::Finished));
        });
    }

    /// Runs the `step` as a nested unit of the `host`.
    ///
    /// A failed [`Step`] doesn't stop the following ones.
    ///
    /// [`Step`]: gherkin::Step
    fn step(
        &mut self,
        step: &gherkin::Step,
        background: bool,
        ctx: &mut Context,
        host: &mut dyn Host,
        ev: ScenarioEvent<'_>,
    ) {
        let step = Arc::new(step.clone());
        let st = |e| ev(event::Scenario::step(Arc::clone(&step), background, e));

        self.emit(st(event::Step::Started));
        self.hooks(HookType::BeforeStep, ctx, host, ev);

        let report = match self.registry.find(&step.value) {
            Ok(m) => invoke(m.binding, &step, m.captures, ctx),
            Err(e) => Report::failed(e),
        };
        _ = host.run(&step.value, &mut |h| {
            for msg in &report.logs {
                h.log(msg);
            }
            match &report.outcome {
                Outcome::Passed => {}
                Outcome::Skipped(reason) => h.skip(reason),
                Outcome::Failed(e) => h.error(&e.to_string()),
            }
        });

        self.hooks(HookType::AfterStep, ctx, host, ev);

        let outcome = match report.outcome {
            Outcome::Passed => event::Step::Passed,
            Outcome::Skipped(reason) => event::Step::Skipped(reason),
            Outcome::Failed(e) => {
                tracing::debug!(step = %step.value, error = %e, "step failed");
                event::Step::Failed(e)
            }
        };
        self.emit(st(outcome));
    }

    /// Runs the hooks of the given type in registration order, stopping at
    /// the first panicking one.
    fn hooks(
        &mut self,
        ty: HookType,
        ctx: &mut Context,
        host: &mut dyn Host,
        ev: ScenarioEvent<'_>,
    ) {
        let options = self.options;
        let hooks: &[HookFn] = match ty {
            HookType::BeforeScenario => &options.before_scenario,
            HookType::AfterScenario => &options.after_scenario,
            HookType::BeforeStep => &options.before_step,
            HookType::AfterStep => &options.after_step,
        };
        if hooks.is_empty() {
            return;
        }

        self.emit(ev(event::Scenario::Hook(ty, event::Hook::Started)));
        let res = hooks.iter().try_for_each(|hook| {
            panic::catch_unwind(AssertUnwindSafe(|| hook(ctx)))
        });
        let outcome = match res {
            Ok(()) => event::Hook::Passed,
            Err(payload) => {
                let msg = panic_message(&*payload);
                tracing::warn!(hook = %ty, %msg, "hook panicked");
                host.error(&format!("{ty} hook failed: {msg}"));
                event::Hook::Failed(msg)
            }
        };
        self.emit(ev(event::Scenario::Hook(ty, outcome)));
    }
}
