// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Registry`] storing [`Step`] functions along with their [`Regex`]
//! patterns, and invocation of the matched ones.
//!
//! - [`argument`]: typed parameters of [`Step`] functions
//! - [`error`]: registration and execution errors
//! - [`invoke`]: running a matched [`Step`] function
//! - [`parameter`]: parameter type aliases
//! - [`registry`]: storing and matching [`Step`] functions
//!
//! [`Regex`]: ::regex::Regex
//! [`Step`]: gherkin::Step

pub mod argument;
pub mod error;
pub mod invoke;
pub mod parameter;
pub mod regex;
pub mod registry;

pub(crate) use self::{argument::parse_bool, error::panic_message};
pub use self::{
    argument::{Arg, DocString, Kind, Param, Signature, StepArgs},
    error::{Error, RegistrationError, ShapeRule},
    invoke::{invoke, Outcome, Report, StepTest},
    parameter::ParameterTypes,
    regex::PatternRegex,
    registry::{Binding, IntoStepResult, Match, Registry, StepFn},
};
