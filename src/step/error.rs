// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of registering, matching and invoking [`Step`] functions.
//!
//! [`Step`]: gherkin::Step

use std::any::Any;

use derive_more::{Display, Error};

use super::Kind;

/// Error of registering a [`Step`] function or a parameter type.
///
/// Any such error is fatal: a suite refuses to run if at least one
/// registration has failed.
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug, Display, Error)]
pub enum RegistrationError {
    /// Pattern doesn't compile as a [`Regex`](regex::Regex).
    #[display(fmt = "invalid step pattern `{}`: {}", pattern, source)]
    Regex {
        /// Pattern after parameter types expansion.
        pattern: String,

        /// Compilation error.
        source: regex::Error,
    },

    /// [`Step`] function's parameters violate a [`ShapeRule`].
    ///
    /// [`Step`]: gherkin::Step
    #[display(fmt = "invalid step function for `{}`: {}", pattern, rule)]
    Shape {
        /// Pattern the function was registered with.
        pattern: String,

        /// Violated rule.
        rule: ShapeRule,
    },

    /// Parameter type alias is not of a `{name}` form.
    #[display(fmt = "invalid parameter type alias `{}`", alias)]
    ParameterAlias {
        /// Offending alias.
        alias: String,
    },

    /// Parameter type has no regex fragments.
    #[display(fmt = "parameter type `{}` has no fragments", alias)]
    EmptyParameterType {
        /// Offending alias.
        alias: String,
    },

    /// Parameter type fragment mentions a registered alias, or is mentioned
    /// by the fragments of another one.
    #[display(
        fmt = "fragments of parameter type `{}` mention parameter type `{}`",
        alias,
        mentioned
    )]
    NestedParameterType {
        /// Alias whose fragments mention the other one.
        alias: String,

        /// Mentioned alias.
        mentioned: String,
    },

    /// Parameter type fragment doesn't compile.
    #[display(fmt = "invalid fragment of parameter type `{}`: {}", alias, source)]
    ParameterFragment {
        /// Alias of the parameter type.
        alias: String,

        /// Compilation error.
        source: regex::Error,
    },
}

/// Rule a [`Signature`](super::Signature) must satisfy.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ShapeRule {
    /// [`Kind::Table`] and [`Kind::DocString`] come after all the capture
    /// bound [`Kind`]s.
    #[display(fmt = "table and docstring parameters must trail capture parameters")]
    AttachmentNotTrailing,

    /// At most one [`Kind::Table`].
    #[display(fmt = "at most one table parameter is allowed")]
    DuplicateTable,

    /// At most one [`Kind::DocString`].
    #[display(fmt = "at most one docstring parameter is allowed")]
    DuplicateDocString,
}

/// Error of running a single [`Step`].
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum Error {
    /// No [`Step`] function matches the [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[display(fmt = "cannot find step definition for step: {}", step)]
    Unmatched {
        /// Text of the unmatched [`Step`].
        ///
        /// [`Step`]: gherkin::Step
        step: String,
    },

    /// Number of captures differs from the number of declared capture
    /// parameters.
    #[display(
        fmt = "the step function accepts {} arguments but {} received",
        declared,
        received
    )]
    ArgumentCount {
        /// Declared capture parameters.
        declared: usize,

        /// Captures of the matched pattern.
        received: usize,
    },

    /// Capture cannot be coerced into the declared [`Kind`].
    #[display(fmt = "cannot convert argument {} (`{}`) into {}", index, value, kind)]
    Coercion {
        /// Index of the capture.
        index: usize,

        /// Raw capture.
        value: String,

        /// Declared [`Kind`].
        kind: Kind,
    },

    /// [`Step`] has no attachment of the declared [`Kind`].
    ///
    /// [`Step`]: gherkin::Step
    #[display(fmt = "the step function expects a {} but none is attached", kind)]
    MissingAttachment {
        /// Declared [`Kind`].
        kind: Kind,
    },

    /// Adapter received an argument of an unexpected [`Kind`].
    #[display(fmt = "argument {} is not {}", index, expected)]
    ArgumentKind {
        /// Index of the argument.
        index: usize,

        /// Expected [`Kind`].
        expected: Kind,
    },

    /// [`Step`] function reported failures.
    ///
    /// [`Step`]: gherkin::Step
    #[display(fmt = "{}", "messages.join(\"; \")")]
    Failed {
        /// Reported failure messages.
        messages: Vec<String>,
    },

    /// [`Step`] function panicked.
    ///
    /// [`Step`]: gherkin::Step
    #[display(fmt = "step panicked: {}", message)]
    Panicked {
        /// Panic payload message.
        message: String,
    },
}

/// Extracts a readable message out of a [`catch_unwind()`] payload.
///
/// [`catch_unwind()`]: std::panic::catch_unwind()
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "opaque panic payload".to_owned()
    }
}
