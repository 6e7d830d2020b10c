// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Regex`] wrapper comparing patterns by their source.

use std::hash::{Hash, Hasher};

use derive_more::{Deref, Display};
use regex::Regex;

/// [`Regex`] compared and hashed by its source pattern.
///
/// Two [`Binding`]s with equal [`PatternRegex`]es are considered the same
/// registration.
///
/// [`Binding`]: super::Binding
#[derive(Clone, Debug, Deref, Display)]
pub struct PatternRegex(Regex);

impl PatternRegex {
    /// Returns the inner [`Regex`].
    #[must_use]
    pub const fn inner(&self) -> &Regex {
        &self.0
    }

    /// Counts non-overlapping matches of this pattern in the `text`.
    #[must_use]
    pub fn count_matches(&self, text: &str) -> usize {
        self.0.find_iter(text).count()
    }

    /// Returns the raw captures of the first match in the `text`.
    ///
    /// Non-participating groups are captured as empty strings, so the number
    /// of captures always equals the number of groups in the pattern.
    #[must_use]
    pub fn captures(&self, text: &str) -> Vec<String> {
        self.0
            .captures(text)
            .map(|caps| {
                caps.iter()
                    .skip(1)
                    .map(|m| m.map_or_else(String::new, |m| m.as_str().to_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<Regex> for PatternRegex {
    fn from(re: Regex) -> Self {
        Self(re)
    }
}

impl Hash for PatternRegex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state);
    }
}

impl PartialEq for PatternRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for PatternRegex {}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn re(pattern: &str) -> PatternRegex {
        Regex::new(pattern).unwrap().into()
    }

    #[test]
    fn equal_by_source() {
        assert_eq!(re(r"I add (\d+)"), re(r"I add (\d+)"));
        assert_ne!(re(r"I add (\d+)"), re(r"I add (\d*)"));

        let set: HashSet<_> =
            [re("a"), re("a"), re("b")].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn counts_non_overlapping_matches() {
        assert_eq!(re("aa").count_matches("aaaaa"), 2);
        assert_eq!(re(r"\d+").count_matches("1 and 22"), 2);
        assert_eq!(re("x").count_matches("abc"), 0);
    }

    #[test]
    fn captures_keep_group_positions() {
        assert_eq!(
            re(r"I add (\d+) and (\d+)").captures("I add 1 and 2"),
            vec!["1", "2"],
        );
        assert_eq!(re(r"(a)?(b)").captures("b"), vec!["", "b"]);
        assert!(re("nothing").captures("else").is_empty());
    }
}
