// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Gherkin] `.feature` files runner, binding steps to plain functions.
//!
//! Steps are registered into a [`Suite`] along with their patterns, and
//! receive their captures already converted into the declared types:
//! ```rust
//! use gherkin_suite::{host::Recorder, source::Virtual, Context, Options, Suite};
//!
//! let features = Virtual::new().file(
//!     "features/add.feature",
//!     "\
//! Feature: Adding
//!   Scenario: add two digits
//!     When I add 1 and 4
//!     Then the result should equal 5
//! ",
//! );
//!
//! let mut suite = Suite::new(Options::new().with_source(features));
//! suite
//!     .add_step(r"I add (\d+) and (\d+)", |_, ctx, (a, b): (i64, i64)| {
//!         ctx.set("sumRes", a + b);
//!     })
//!     .unwrap();
//! suite
//!     .add_step(r"the result should equal (\d+)", |t, ctx, (want,): (i64,)| {
//!         let got = ctx.get_i64(&"sumRes").unwrap_or_default();
//!         if got != want {
//!             t.error(format!("expected {want}, got {got}"));
//!         }
//!     })
//!     .unwrap();
//!
//! let mut host = Recorder::new("adding");
//! let summary = suite.run(&mut host);
//! assert!(!summary.failed());
//! assert!(!host.failed());
//! ```
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

#![deny(nonstandard_style, trivial_casts, trivial_numeric_casts)]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    unused_import_braces,
    unused_labels,
    unused_qualifications,
    unused_results,
    clippy::pedantic
)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod context;
pub mod event;
pub mod host;
pub mod options;
pub mod outline;
pub mod parser;
pub mod reporter;
pub mod source;
pub mod step;
pub mod suite;
pub mod tag;
#[cfg(feature = "testhttp")]
pub mod testhttp;

pub use gherkin;

#[doc(inline)]
pub use self::{
    context::Context,
    host::{Host, Recorder},
    options::Options,
    reporter::{Reporter, Summary},
    step::{Registry, StepTest},
    suite::Suite,
};
