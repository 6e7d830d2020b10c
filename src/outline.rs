// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Scenario Outline][1] expansion.
//!
//! So this one:
//! ```gherkin
//! Feature: Hungry
//!   Scenario Outline: eating <eat>
//!     Given there are <start> cucumbers
//!     When I eat <eat> cucumbers
//!     Then I should have <left> cucumbers
//!
//!     Examples:
//!       | start | eat | left |
//!       |    12 |   5 |    7 |
//!       |    20 |   4 |   16 |
//! ```
//!
//! Is expanded into two concrete [`Scenario`]s, `eating 5` and `eating 4`,
//! each running its three [`Step`]s with the placeholders substituted.
//!
//! Besides, for every placeholder found in a [`Step`] whose matching
//! [`Binding`] pattern mentions the very same placeholder, a derived pattern
//! is registered with the placeholder replaced by a regex fragment fitting
//! the example value. This way `I eat <eat> cucumbers` bound to a function
//! also matches `I eat 5 cucumbers`.
//!
//! [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
//! [`Binding`]: crate::step::Binding
//! [`Scenario`]: gherkin::Scenario
//! [`Step`]: gherkin::Step

use std::mem;

use lazy_regex::regex_is_match;

use crate::step::Registry;

/// Indicates whether the `scenario` is a [Scenario Outline][1].
///
/// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
#[must_use]
pub fn is_outline(scenario: &gherkin::Scenario) -> bool {
    !scenario.examples.is_empty()
}

/// Expands the `outline` into one concrete [`Scenario`] per example row.
///
/// Example blocks and their rows are taken in declaration order, blocks
/// without data rows contribute nothing. Tags of an example block are
/// appended to the tags of every [`Scenario`] it produces.
///
/// Derived patterns are registered into the `registry` along the way.
///
/// [`Scenario`]: gherkin::Scenario
pub fn expand(
    outline: &gherkin::Scenario,
    registry: &mut Registry,
) -> Vec<gherkin::Scenario> {
    outline
        .examples
        .iter()
        .filter_map(|ex| {
            ex.table
                .as_ref()?
                .rows
                .split_first()
                .map(|(header, rows)| (header, rows, ex))
        })
        .flat_map(|(header, rows, ex)| {
            rows.iter().enumerate().map(move |(id, row)| (header, id, row, ex))
        })
        .map(|(header, id, row, ex)| {
            let values = header
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect::<Vec<_>>();

            let mut expanded = outline.clone();
            expanded.examples.clear();

            // Points to the example row, so rows of the same outline are
            // distinguishable.
            expanded.position = ex.position;
            expanded.position.line += id + 2;

            expanded.tags.extend(ex.tags.iter().cloned());
            expanded.name = substitute(&expanded.name, &values);
            for step in &mut expanded.steps {
                expand_step(step, &values, registry);
            }

            expanded
        })
        .collect()
}

/// Substitutes the `values` into the `step`, registering derived patterns
/// into the `registry`.
fn expand_step(
    step: &mut gherkin::Step,
    values: &[(&str, &str)],
    registry: &mut Registry,
) {
    for (name, value) in values {
        let token = format!("<{name}>");
        if !step.value.contains(&token) {
            continue;
        }
        let substituted = step.value.replace(&token, value);
        let template = mem::replace(&mut step.value, substituted);

        let derived = registry.find(&template).ok().and_then(|m| {
            let pattern = m.binding.pattern().as_str();
            pattern.contains(&token).then(|| {
                (pattern.replace(&token, fragment(value)), m.binding.clone())
            })
        });
        if let Some((pattern, binding)) = derived {
            if let Err(e) = registry.add_derived(&pattern, &binding) {
                tracing::warn!(
                    %pattern,
                    error = %e,
                    "failed to register derived pattern",
                );
            }
        }
    }

    for text in step.docstring.iter_mut().chain(
        step.table
            .iter_mut()
            .flat_map(|t| t.rows.iter_mut().flat_map(|r| r.iter_mut())),
    ) {
        *text = substitute(text, values);
    }
}

/// Replaces every known `<placeholder>` in the `text` with its value.
///
/// Unknown placeholders are left as is.
fn substitute(text: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(text.to_owned(), |text, (name, value)| {
        text.replace(&format!("<{name}>"), value)
    })
}

/// Infers a regex fragment capturing the example `value`.
fn fragment(value: &str) -> &'static str {
    if regex_is_match!(r"^[0-9]+$", value) {
        r"(\d+)"
    } else if regex_is_match!(r"^[+-]?(?:[0-9]*[.])?[0-9]+$", value) {
        r"([+-]?(?:[0-9]*[.])?[0-9]+)"
    } else {
        "(.*)"
    }
}
