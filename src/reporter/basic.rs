// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Default console [`Reporter`] implementation.

use std::{io, str::FromStr};

use console::{Style, Term};
use itertools::Itertools as _;

use crate::event;

use super::{Outputted, Reporter};

/// Possible policies of a [`console`] output coloring.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Coloring {
    /// Letting [`console::colors_enabled()`] to decide, whether output should
    /// be colored.
    #[default]
    Auto,

    /// Forcing of a colored output.
    Always,

    /// Forcing of a non-colored output.
    Never,
}

impl FromStr for Coloring {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err("possible options: auto, always, never"),
        }
    }
}

impl Coloring {
    /// Applies this policy to the `style`.
    fn apply(self, style: Style) -> Style {
        match self {
            Self::Auto => style,
            Self::Always => style.force_styling(true),
            Self::Never => style.force_styling(false),
        }
    }
}

/// Default [`Reporter`] implementation, outputting a human-readable tree of
/// [`Feature`]s, [`Rule`]s, [`Scenario`]s and [`Step`]s.
///
/// Passed [`Step`]s are marked with `✔`, failed ones with `✘`, and skipped
/// ones with `?`. [`Background`] [`Step`]s additionally carry a `>` mark.
///
/// [`Background`]: gherkin::Background
/// [`Feature`]: gherkin::Feature
/// [`Rule`]: gherkin::Rule
/// [`Scenario`]: gherkin::Scenario
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug)]
pub struct Basic<Out: io::Write = Term> {
    output: Out,
    ok: Style,
    skipped: Style,
    err: Style,
}

impl Default for Basic {
    fn default() -> Self {
        Self::stdout(Coloring::Auto)
    }
}

impl Basic {
    /// Creates a new [`Basic`] [`Reporter`] writing into the STDOUT.
    #[must_use]
    pub fn stdout(coloring: Coloring) -> Self {
        Self::new(Term::stdout(), coloring)
    }
}

impl<Out: io::Write> Basic<Out> {
    /// Creates a new [`Basic`] [`Reporter`] writing into the `output`.
    #[must_use]
    pub fn new(output: Out, coloring: Coloring) -> Self {
        Self {
            output,
            ok: coloring.apply(Style::new().green()),
            skipped: coloring.apply(Style::new().cyan()),
            err: coloring.apply(Style::new().red()),
        }
    }

    /// Output this [`Basic`] [`Reporter`] writes into.
    #[must_use]
    pub const fn output(&self) -> &Out {
        &self.output
    }

    /// Unwraps the output this [`Basic`] [`Reporter`] writes into.
    #[must_use]
    pub fn into_output(self) -> Out {
        self.output
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")?;
        self.output.flush()
    }

    fn handle(&mut self, ev: &event::Suite) -> io::Result<()> {
        use event::{Feature, Rule, Suite};

        match ev {
            Suite::Started | Suite::Finished => Ok(()),
            Suite::ParsingError(err) => {
                let line = self
                    .err
                    .apply_to(format!("Failed to parse: {err}"))
                    .to_string();
                self.write_line(&line)
            }
            Suite::Feature(f, ev) => match ev {
                Feature::Started => self.feature_started(f),
                Feature::Skipped => {
                    let line = self
                        .skipped
                        .apply_to(format!("Feature: {} (skipped)", f.name))
                        .to_string();
                    self.write_line(&line)
                }
                Feature::Scenario(sc, ev) => self.scenario(sc, ev, 0),
                Feature::Rule(r, ev) => match ev {
                    Rule::Started => self.rule_started(r),
                    Rule::Skipped => {
                        let line = self
                            .skipped
                            .apply_to(format!("  Rule: {} (skipped)", r.name))
                            .to_string();
                        self.write_line(&line)
                    }
                    Rule::Scenario(sc, ev) => self.scenario(sc, ev, 2),
                    Rule::Finished => Ok(()),
                },
                Feature::Finished => Ok(()),
            },
        }
    }

    fn feature_started(&mut self, feature: &gherkin::Feature) -> io::Result<()> {
        let line = self
            .ok
            .apply_to(format!("Feature: {}", feature.name))
            .to_string();
        self.write_line(&line)
    }

    fn rule_started(&mut self, rule: &gherkin::Rule) -> io::Result<()> {
        let line = self.ok.apply_to(format!("  Rule: {}", rule.name)).to_string();
        self.write_line(&line)
    }

    fn scenario(
        &mut self,
        scenario: &gherkin::Scenario,
        ev: &event::Scenario,
        ident: usize,
    ) -> io::Result<()> {
        use event::{Hook, Scenario};

        let offset = ident + 2;
        match ev {
            Scenario::Started => {
                let line = self
                    .ok
                    .apply_to(format!(
                        "{}{}: {}",
                        " ".repeat(offset),
                        scenario.keyword,
                        scenario.name,
                    ))
                    .to_string();
                self.write_line(&line)
            }
            Scenario::Skipped => {
                let line = self
                    .skipped
                    .apply_to(format!(
                        "{}{}: {} (skipped)",
                        " ".repeat(offset),
                        scenario.keyword,
                        scenario.name,
                    ))
                    .to_string();
                self.write_line(&line)
            }
            Scenario::Hook(ty, Hook::Failed(msg)) => {
                let line = self
                    .err
                    .apply_to(format!(
                        "{}\u{2718}  {ty} hook failed: {msg}",
                        " ".repeat(offset + 1),
                    ))
                    .to_string();
                self.write_line(&line)
            }
            Scenario::Background(st, ev) => self.step(st, ev, offset, true),
            Scenario::Step(st, ev) => self.step(st, ev, offset, false),
            Scenario::Hook(..) | Scenario::Finished => Ok(()),
        }
    }

    fn step(
        &mut self,
        step: &gherkin::Step,
        ev: &event::Step,
        ident: usize,
        background: bool,
    ) -> io::Result<()> {
        use event::Step;

        let ident = " ".repeat(ident + 1);
        let bg = if background { '>' } else { ' ' };
        let line = match ev {
            Step::Started => return Ok(()),
            Step::Passed => self
                .ok
                .apply_to(format!(
                    //  ✔
                    "{ident}\u{2714}{bg} {} {}",
                    step.keyword.trim(),
                    step.value,
                ))
                .to_string(),
            Step::Skipped(reason) => self
                .skipped
                .apply_to(format!(
                    "{ident}?{bg} {} {} (skipped: {reason})",
                    step.keyword.trim(),
                    step.value,
                ))
                .to_string(),
            Step::Failed(err) => {
                let details = err
                    .to_string()
                    .lines()
                    .map(|l| format!("{ident}   {l}"))
                    .join("\n");
                self.err
                    .apply_to(format!(
                        //       ✘
                        "{ident}\u{2718}{bg} {} {}\n\
                         {ident}   Step failed:\n\
                         {details}",
                        step.keyword.trim(),
                        step.value,
                    ))
                    .to_string()
            }
        };
        self.write_line(&line)
    }
}

impl<Out: io::Write> Reporter for Basic<Out> {
    fn handle_event(&mut self, ev: &event::Suite) {
        if let Err(e) = self.handle(ev) {
            tracing::warn!(error = %e, "failed to write event");
        }
    }
}

impl<Out: io::Write> Outputted for Basic<Out> {
    fn write(&mut self, output: &str) {
        if let Err(e) = self.write_line(output) {
            tracing::warn!(error = %e, "failed to write output");
        }
    }
}
