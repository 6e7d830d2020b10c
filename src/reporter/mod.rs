// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for outputting [`Suite`] events.
//!
//! [`Suite`]: crate::event::Suite

pub mod basic;
pub mod discard;
pub mod summarized;

use sealed::sealed;

use crate::event;

#[doc(inline)]
pub use self::{
    basic::{Basic, Coloring},
    discard::Discard,
    summarized::{Stats, Summarized, Summary},
};

/// Reporter of [`Suite`] events to some output.
///
/// [`Suite`]: crate::event::Suite
pub trait Reporter {
    /// Handles the given [`Suite`] event.
    ///
    /// [`Suite`]: crate::event::Suite
    fn handle_event(&mut self, ev: &event::Suite);
}

/// [`Reporter`] that also can output an arbitrary text additionally to the
/// [`Suite`] events.
///
/// [`Suite`]: crate::event::Suite
pub trait Outputted: Reporter {
    /// Writes the `output` as is.
    fn write(&mut self, output: &str);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn handle_event(&mut self, ev: &event::Suite) {
        (**self).handle_event(ev);
    }
}

impl<R: Outputted + ?Sized> Outputted for &mut R {
    fn write(&mut self, output: &str) {
        (**self).write(output);
    }
}

/// Extension of [`Reporter`] allowing its summarization.
#[sealed]
pub trait Ext: Reporter + Sized {
    /// Wraps this [`Reporter`] to print a summary at the end of an output.
    ///
    /// See [`Summarized`] for more information.
    #[must_use]
    fn summarized(self) -> Summarized<Self>;
}

#[sealed]
impl<T: Reporter + Sized> Ext for T {
    fn summarized(self) -> Summarized<Self> {
        Summarized::new(self)
    }
}
