// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Reporter`] ignoring everything.

use crate::event;

use super::{Outputted, Reporter};

/// [`Reporter`] discarding all events and output.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Reporter for Discard {
    fn handle_event(&mut self, _: &event::Suite) {}
}

impl Outputted for Discard {
    fn write(&mut self, _: &str) {}
}
