// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tag based skipping of [`Feature`]s, [`Rule`]s and [`Scenario`]s.
//!
//! [`Feature`]: gherkin::Feature
//! [`Rule`]: gherkin::Rule
//! [`Scenario`]: gherkin::Scenario

use gherkin::tagexpr::TagOperation;
use sealed::sealed;

/// Strips the leading `@` of the `tag`, if any.
#[must_use]
pub fn normalize(tag: &str) -> &str {
    tag.strip_prefix('@').unwrap_or(tag)
}

/// Decides which units to skip by their tags.
///
/// Tags are inherited downwards: a [`Scenario`] is judged by the union of
/// its own tags and the tags of its [`Rule`] and [`Feature`].
///
/// [`Feature`]: gherkin::Feature
/// [`Rule`]: gherkin::Rule
/// [`Scenario`]: gherkin::Scenario
#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// Tags making a unit skipped, regardless of any other tag.
    ignore: Vec<String>,

    /// Tags a unit should have at least one of, unless empty.
    include: Vec<String>,

    /// Tag expression a unit should satisfy, if any.
    expr: Option<TagOperation>,
}

impl Filter {
    /// Creates a [`Filter`] out of the `include` and `ignore` tags, with or
    /// without a leading `@`.
    #[must_use]
    pub fn new<I, S>(include: I, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let norm = |tags: I| {
            tags.into_iter()
                .map(|t| normalize(t.as_ref()).to_owned())
                .collect()
        };
        Self {
            ignore: norm(ignore),
            include: norm(include),
            expr: None,
        }
    }

    /// Additionally requires units to satisfy the [tag expression][1].
    ///
    /// [1]: https://cucumber.io/docs/cucumber/api#tag-expressions
    #[must_use]
    pub fn with_expression(mut self, expr: TagOperation) -> Self {
        self.expr = Some(expr);
        self
    }

    /// Tags making a unit skipped.
    #[must_use]
    pub fn ignored(&self) -> &[String] {
        &self.ignore
    }

    /// Tags a unit should have at least one of.
    #[must_use]
    pub fn included(&self) -> &[String] {
        &self.include
    }

    /// Indicates whether a unit with the (inherited) `tags` is skipped.
    ///
    /// Any ignored tag skips the unit. Otherwise, a non-empty include list
    /// requires at least one of its tags, and a tag expression, if any, has
    /// to be satisfied.
    #[must_use]
    pub fn skips<I, S>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = S> + Clone,
        S: AsRef<str>,
    {
        if self.ignores(tags.clone()) {
            return true;
        }
        if !self.include.is_empty() && !self.include.iter().any(|wanted| {
            tags.clone()
                .into_iter()
                .any(|t| normalize(t.as_ref()) == wanted.as_str())
        }) {
            return true;
        }
        self.expr.as_ref().map_or(false, |e| {
            let tags = tags
                .into_iter()
                .map(|t| normalize(t.as_ref()).to_owned())
                .collect::<Vec<_>>();
            !e.eval(&tags)
        })
    }

    /// Indicates whether any of the (inherited) `tags` is an ignored one.
    ///
    /// Unlike [`Filter::skips()`], doesn't require included tags, so fits
    /// units whose nested ones may still carry them.
    #[must_use]
    pub fn ignores<I, S>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter()
            .any(|t| self.ignore.iter().any(|i| normalize(t.as_ref()) == i))
    }

    /// Indicates whether this [`Filter`] skips nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ignore.is_empty() && self.include.is_empty() && self.expr.is_none()
    }
}

/// Extension of a [`TagOperation`] allowing to evaluate it.
#[sealed]
pub trait Ext {
    /// Evaluates this [`TagOperation`] for the given `tags`.
    #[must_use]
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone;
}

#[sealed]
impl Ext for TagOperation {
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        match self {
            Self::And(l, r) => l.eval(tags.clone()) & r.eval(tags),
            Self::Or(l, r) => l.eval(tags.clone()) | r.eval(tags),
            Self::Not(t) => !t.eval(tags),
            Self::Tag(t) => {
                tags.into_iter().any(|tag| tag.as_ref() == normalize(t))
            }
        }
    }
}

/// Union of the tags of a [`Feature`], its [`Rule`] and [`Scenario`],
/// whichever are given.
///
/// [`Feature`]: gherkin::Feature
/// [`Rule`]: gherkin::Rule
/// [`Scenario`]: gherkin::Scenario
#[must_use]
pub fn inherited<'t>(
    feature: &'t gherkin::Feature,
    rule: Option<&'t gherkin::Rule>,
    scenario: Option<&'t gherkin::Scenario>,
) -> Vec<&'t str> {
    feature
        .tags
        .iter()
        .chain(rule.into_iter().flat_map(|r| &r.tags))
        .chain(scenario.into_iter().flat_map(|s| &s.tags))
        .map(|t| normalize(t))
        .collect()
}
