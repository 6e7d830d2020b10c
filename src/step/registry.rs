// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Registry`] of [`Step`] functions and matching of [`Step`]s against it.
//!
//! [`Step`]: gherkin::Step

use std::{fmt, sync::Arc};

use regex::Regex;

use crate::Context;

use super::{
    Arg, Error, Kind, ParameterTypes, PatternRegex, RegistrationError,
    Signature, StepArgs, StepTest,
};

/// Type-erased [`Step`] function.
///
/// [`Step`]: gherkin::Step
pub type StepFn = Arc<
    dyn Fn(&mut StepTest, &mut Context, Vec<Arg>) -> anyhow::Result<()>
        + Send
        + Sync,
>;

/// Return value of a [`Step`] function.
///
/// Implemented for `()` and `Result<(), E>`, where `E` converts into an
/// [`anyhow::Error`].
///
/// [`Step`]: gherkin::Step
pub trait IntoStepResult {
    /// Converts into a [`Result`].
    ///
    /// # Errors
    ///
    /// If the [`Step`] function failed.
    ///
    /// [`Step`]: gherkin::Step
    fn into_step_result(self) -> anyhow::Result<()>;
}

impl IntoStepResult for () {
    fn into_step_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E: Into<anyhow::Error>> IntoStepResult for Result<(), E> {
    fn into_step_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// Compiled pattern bound to a [`Step`] function.
///
/// [`Step`]: gherkin::Step
#[derive(Clone)]
pub struct Binding {
    /// Compiled pattern.
    pattern: PatternRegex,

    /// Validated parameters of the [`Step`] function.
    ///
    /// [`Step`]: gherkin::Step
    signature: Signature,

    /// [`Step`] function itself.
    ///
    /// [`Step`]: gherkin::Step
    callback: StepFn,
}

// Implemented manually, as the callback is opaque.
impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("pattern", &self.pattern.as_str())
            .field("signature", &self.signature)
            .field("callback", &format!("{:p}", Arc::as_ptr(&self.callback)))
            .finish()
    }
}

impl Binding {
    /// Compiled pattern of this [`Binding`].
    #[must_use]
    pub fn pattern(&self) -> &Regex {
        self.pattern.inner()
    }

    /// Validated parameters of the bound [`Step`] function.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Bound [`Step`] function.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub(crate) const fn callback(&self) -> &StepFn {
        &self.callback
    }
}

/// [`Binding`] found for a [`Step`] text, along with its raw captures.
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug)]
pub struct Match<'r> {
    /// Found [`Binding`].
    pub binding: &'r Binding,

    /// Raw captures of the [`Binding::pattern()`] in the [`Step`] text.
    ///
    /// [`Step`]: gherkin::Step
    pub captures: Vec<String>,
}

/// Ordered collection of [`Binding`]s.
///
/// Registration failures are returned and also remembered, so a suite can
/// refuse to run after any of them.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    /// [`Binding`]s in registration order.
    bindings: Vec<Binding>,

    /// Parameter type aliases applied to string patterns.
    parameter_types: ParameterTypes,

    /// Failed registrations.
    errors: Vec<RegistrationError>,
}

impl Registry {
    /// Creates an empty [`Registry`] with the default parameter types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a [`Step`] function for the `pattern`.
    ///
    /// Parameter type aliases in the `pattern` are expanded first, so a
    /// single call may produce several [`Binding`]s.
    ///
    /// # Errors
    ///
    /// If the `pattern` doesn't compile, or the function's parameters are
    /// invalid.
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
        self.add_raw_step(pattern, A::kinds(), adapt(step_fn))
    }

    /// Registers a [`Step`] function for the pre-compiled `regex`.
    ///
    /// No parameter type aliases are expanded.
    ///
    /// # Errors
    ///
    /// If the function's parameters are invalid.
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
        let res = Signature::new(A::kinds())
            .map_err(|rule| RegistrationError::Shape {
                pattern: regex.as_str().to_owned(),
                rule,
            })
            .map(|signature| {
                self.push(Binding {
                    pattern: regex.into(),
                    signature,
                    callback: Arc::new(adapt(step_fn)),
                });
            });
        self.remember(res)
    }

    /// Registers an untyped [`Step`] function receiving its arguments as
    /// described by the `kinds`.
    ///
    /// # Errors
    ///
    /// If the `pattern` doesn't compile, or the `kinds` are invalid.
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
        let res = Signature::new(kinds)
            .map_err(|rule| RegistrationError::Shape {
                pattern: pattern.to_owned(),
                rule,
            })
            .and_then(|signature| {
                self.compile(pattern).map(|regexes| (signature, regexes))
            })
            .map(|(signature, regexes)| {
                let callback: StepFn = Arc::new(step_fn);
                for regex in regexes {
                    self.push(Binding {
                        pattern: regex.into(),
                        signature: signature.clone(),
                        callback: Arc::clone(&callback),
                    });
                }
            });
        self.remember(res)
    }

    /// Registers the `from` [`Binding`]'s function once more, for the derived
    /// `pattern`.
    ///
    /// # Errors
    ///
    /// If the `pattern` doesn't compile.
    pub(crate) fn add_derived(
        &mut self,
        pattern: &str,
        from: &Binding,
    ) -> Result<(), RegistrationError> {
        for regex in self.compile(pattern)? {
            self.push(Binding {
                pattern: regex.into(),
                signature: from.signature.clone(),
                callback: Arc::clone(&from.callback),
            });
        }
        Ok(())
    }

    /// Registers a parameter type `alias` (like `{color}`) with its regex
    /// `fragments`, overriding a previous registration of the same `alias`.
    ///
    /// Affects only the patterns registered afterwards.
    ///
    /// # Errors
    ///
    /// If the `alias` is malformed, or some `fragments` don't compile.
    pub fn add_parameter_type<I, S>(
        &mut self,
        alias: &str,
        fragments: I,
    ) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let res = self
            .parameter_types
            .insert(alias, fragments.into_iter().map(Into::into).collect());
        self.remember(res)
    }

    /// Finds the [`Binding`] for the [`Step`] `text`.
    ///
    /// Every [`Binding`] whose pattern matches somewhere in the `text` is a
    /// candidate. The one with the most non-overlapping matches wins, and the
    /// earliest registered one wins a tie.
    ///
    /// # Errors
    ///
    /// [`Error::Unmatched`] if no [`Binding`] matches.
    ///
    /// [`Step`]: gherkin::Step
    pub fn find(&self, text: &str) -> Result<Match<'_>, Error> {
        let best = self.bindings.iter().fold(
            None::<(&Binding, usize)>,
            |best, binding| {
                let count = binding.pattern.count_matches(text);
                match best {
                    Some((_, best_count)) if count <= best_count => best,
                    _ if count == 0 => best,
                    _ => Some((binding, count)),
                }
            },
        );

        let (binding, count) = best.ok_or_else(|| Error::Unmatched {
            step: text.to_owned(),
        })?;
        tracing::debug!(
            step = text,
            pattern = binding.pattern.as_str(),
            matches = count,
            "step matched",
        );

        Ok(Match {
            binding,
            captures: binding.pattern.captures(text),
        })
    }

    /// Registered [`Binding`]s, in registration order.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Registered parameter types.
    #[must_use]
    pub const fn parameter_types(&self) -> &ParameterTypes {
        &self.parameter_types
    }

    /// Failed registrations so far.
    #[must_use]
    pub fn errors(&self) -> &[RegistrationError] {
        &self.errors
    }

    /// Number of registered [`Binding`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Indicates whether there are no registered [`Binding`]s.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Expands parameter type aliases in the `pattern` and compiles the
    /// results.
    fn compile(&self, pattern: &str) -> Result<Vec<Regex>, RegistrationError> {
        self.parameter_types
            .expand(pattern)
            .into_iter()
            .map(|p| {
                Regex::new(&p).map_err(|source| RegistrationError::Regex {
                    pattern: p,
                    source,
                })
            })
            .collect()
    }

    /// Appends the `binding`, unless its pattern is registered already.
    fn push(&mut self, binding: Binding) {
        if self.bindings.iter().any(|b| b.pattern == binding.pattern) {
            tracing::debug!(
                pattern = binding.pattern.as_str(),
                "pattern already registered",
            );
            return;
        }
        tracing::debug!(pattern = binding.pattern.as_str(), "step registered");
        self.bindings.push(binding);
    }

    /// Remembers the failed registration, if any.
    fn remember(
        &mut self,
        res: Result<(), RegistrationError>,
    ) -> Result<(), RegistrationError> {
        if let Err(e) = &res {
            tracing::warn!(error = %e, "step registration failed");
            self.errors.push(e.clone());
        }
        res
    }
}

/// Erases the argument tuple of a typed [`Step`] function.
///
/// [`Step`]: gherkin::Step
fn adapt<A, F, O>(
    step_fn: F,
) -> impl Fn(&mut StepTest, &mut Context, Vec<Arg>) -> anyhow::Result<()>
       + Send
       + Sync
       + 'static
where
    A: StepArgs,
    F: Fn(&mut StepTest, &mut Context, A) -> O + Send + Sync + 'static,
    O: IntoStepResult,
{
    move |t: &mut StepTest, ctx: &mut Context, args: Vec<Arg>| {
        let args = A::from_args(args)?;
        step_fn(t, ctx, args).into_step_result()
    }
}
