// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Invocation of a matched [`Step`] function.
//!
//! [`Step`]: gherkin::Step

use std::{
    mem,
    panic::{self, AssertUnwindSafe},
};

use crate::Context;

use super::{error::panic_message, Binding, Error};

/// Handle passed to every [`Step`] function for reporting.
///
/// [`Step`]: gherkin::Step
#[derive(Debug)]
pub struct StepTest {
    /// Executing [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    step: gherkin::Step,

    /// Messages logged so far.
    logs: Vec<String>,

    /// Failures reported so far.
    errors: Vec<String>,
}

/// Payload of an unwind started by [`StepTest::fatal()`] or
/// [`StepTest::skip()`].
#[derive(Debug)]
enum Abort {
    Fatal(String),
    Skip(String),
}

impl StepTest {
    /// Creates a [`StepTest`] for the `step`.
    #[must_use]
    pub fn new(step: gherkin::Step) -> Self {
        Self {
            step,
            logs: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Executing [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub const fn step(&self) -> &gherkin::Step {
        &self.step
    }

    /// Logs the `msg` into the [`Step`] output.
    ///
    /// [`Step`]: gherkin::Step
    pub fn log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::info!(step = %self.step.value, "{msg}");
        self.logs.push(msg);
    }

    /// Marks the [`Step`] as failed with the `msg`, but lets it continue.
    ///
    /// [`Step`]: gherkin::Step
    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Marks the [`Step`] as failed with the `msg` and stops it immediately.
    ///
    /// [`Step`]: gherkin::Step
    pub fn fatal(&mut self, msg: impl Into<String>) -> ! {
        // `resume_unwind()` doesn't invoke the panic hook, so nothing is
        // printed for a deliberate abort.
        panic::resume_unwind(Box::new(Abort::Fatal(msg.into())))
    }

    /// Marks the [`Step`] as skipped with the `reason` and stops it
    /// immediately.
    ///
    /// Failures reported before still fail the [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    pub fn skip(&mut self, reason: impl Into<String>) -> ! {
        panic::resume_unwind(Box::new(Abort::Skip(reason.into())))
    }

    /// Indicates whether any failure has been reported so far.
    #[must_use]
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Messages logged so far.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }
}

/// Outcome of a single [`Step`] invocation.
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// [`Step`] function completed without failures.
    ///
    /// [`Step`]: gherkin::Step
    Passed,

    /// [`Step`] function skipped itself.
    ///
    /// [`Step`]: gherkin::Step
    Skipped(String),

    /// [`Step`] function failed.
    ///
    /// [`Step`]: gherkin::Step
    Failed(Error),
}

/// [`Outcome`] of a [`Step`] invocation along with its logs.
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    /// [`Outcome`] of the invocation.
    pub outcome: Outcome,

    /// Messages logged via [`StepTest::log()`].
    pub logs: Vec<String>,
}

impl Report {
    /// Creates a [`Report`] of a [`Step`] failed before its function ran.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub const fn failed(error: Error) -> Self {
        Self {
            outcome: Outcome::Failed(error),
            logs: Vec::new(),
        }
    }
}

/// Invokes the `binding`'s function for the `step` with the raw `captures`.
///
/// Never panics: coercion failures, reported failures and panics of the
/// function all end up in the returned [`Report`].
pub fn invoke(
    binding: &Binding,
    step: &gherkin::Step,
    captures: Vec<String>,
    ctx: &mut Context,
) -> Report {
    let args = match binding.signature().coerce(&captures, step) {
        Ok(args) => args,
        Err(e) => return Report::failed(e),
    };
    ctx.set_params(captures);

    let mut t = StepTest::new(step.clone());
    let res = panic::catch_unwind(AssertUnwindSafe(|| {
        (binding.callback())(&mut t, ctx, args)
    }));

    let mut errors = mem::take(&mut t.errors);
    let skipped = match res {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            errors.push(format!("{e:#}"));
            None
        }
        Err(payload) => match payload.downcast::<Abort>() {
            Ok(abort) => match *abort {
                Abort::Fatal(msg) => {
                    errors.push(msg);
                    None
                }
                Abort::Skip(reason) => Some(reason),
            },
            Err(payload) => {
                return Report {
                    outcome: Outcome::Failed(Error::Panicked {
                        message: panic_message(&*payload),
                    }),
                    logs: t.logs,
                };
            }
        },
    };

    let outcome = match (errors.is_empty(), skipped) {
        (false, _) => Outcome::Failed(Error::Failed { messages: errors }),
        (true, Some(reason)) => Outcome::Skipped(reason),
        (true, None) => Outcome::Passed,
    };
    Report {
        outcome,
        logs: t.logs,
    }
}
