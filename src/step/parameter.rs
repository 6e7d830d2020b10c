// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parameter type aliases (`{int}`, `{word}`, ...) desugared into regex
//! fragments before a pattern is compiled.

use lazy_regex::regex_is_match;
use linked_hash_map::LinkedHashMap;
use regex::Regex;

use super::RegistrationError;

/// Registered parameter type aliases.
///
/// Each alias maps to one or more regex fragments. A pattern mentioning an
/// alias with several fragments expands into several patterns, one per
/// fragment.
#[derive(Clone, Debug)]
pub struct ParameterTypes {
    /// Fragments by alias, in registration order.
    types: LinkedHashMap<String, Vec<String>>,
}

impl Default for ParameterTypes {
    fn default() -> Self {
        let mut types = LinkedHashMap::new();
        for (alias, fragments) in [
            ("{int}", &[r"(-?\d+)"][..]),
            ("{float}", &[r"([-+]?\d*\.?\d+)"][..]),
            ("{word}", &[r"([\d\w]+)"][..]),
            ("{text}", &[r#""([^"]*)""#, r"'([^']*)'"][..]),
        ] {
            _ = types.insert(
                alias.to_owned(),
                fragments.iter().map(|&f| f.to_owned()).collect(),
            );
        }
        Self { types }
    }
}

impl ParameterTypes {
    /// Creates [`ParameterTypes`] without any alias, not even the default
    /// ones.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: LinkedHashMap::new(),
        }
    }

    /// Registers the `alias` with its regex `fragments`, replacing the
    /// previous registration of the same `alias`.
    ///
    /// # Errors
    ///
    /// If the `alias` is not of a `{name}` form, there are no `fragments`,
    /// some of them don't compile, or aliases would mention each other.
    pub fn insert(
        &mut self,
        alias: &str,
        fragments: Vec<String>,
    ) -> Result<(), RegistrationError> {
        if !regex_is_match!(r"^\{[A-Za-z_]\w*\}$", alias) {
            return Err(RegistrationError::ParameterAlias {
                alias: alias.to_owned(),
            });
        }
        if fragments.is_empty() {
            return Err(RegistrationError::EmptyParameterType {
                alias: alias.to_owned(),
            });
        }
        for fragment in &fragments {
            _ = Regex::new(fragment).map_err(|source| {
                RegistrationError::ParameterFragment {
                    alias: alias.to_owned(),
                    source,
                }
            })?;

            let mentioned = self
                .types
                .keys()
                .map(String::as_str)
                .chain([alias])
                .find(|&a| fragment.contains(a));
            if let Some(mentioned) = mentioned {
                return Err(RegistrationError::NestedParameterType {
                    alias: alias.to_owned(),
                    mentioned: mentioned.to_owned(),
                });
            }
        }
        let mentioning = self.types.iter().find(|(other, fs)| {
            other.as_str() != alias && fs.iter().any(|f| f.contains(alias))
        });
        if let Some((other, _)) = mentioning {
            return Err(RegistrationError::NestedParameterType {
                alias: other.clone(),
                mentioned: alias.to_owned(),
            });
        }

        _ = self.types.insert(alias.to_owned(), fragments);
        Ok(())
    }

    /// Returns the fragments of the `alias`, if registered.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&[String]> {
        self.types.get(alias).map(Vec::as_slice)
    }

    /// Expands every alias mentioned in the `pattern`.
    ///
    /// Returns the cartesian product of the fragments of all the mentioned
    /// aliases. A `pattern` without aliases expands into itself.
    #[must_use]
    pub fn expand(&self, pattern: &str) -> Vec<String> {
        let Some((alias, fragments)) = self
            .types
            .iter()
            .find(|(alias, _)| pattern.contains(alias.as_str()))
        else {
            return vec![pattern.to_owned()];
        };

        // Fragments never mention a registered alias, so the recursion
        // terminates.
        fragments
            .iter()
            .flat_map(|f| self.expand(&pattern.replace(alias.as_str(), f)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_without_aliases_is_kept() {
        let types = ParameterTypes::default();

        assert_eq!(types.expand(r"I add (\d+)"), vec![r"I add (\d+)"]);
        assert_eq!(types.expand(r"a{2}"), vec![r"a{2}"]);
    }

    #[test]
    fn defaults_expand() {
        let types = ParameterTypes::default();

        assert_eq!(
            types.expand("I use word {word}"),
            vec![r"I use word ([\d\w]+)"],
        );
        assert_eq!(types.expand("{int} + {float}"), vec![
            r"(-?\d+) + ([-+]?\d*\.?\d+)",
        ]);
    }

    #[test]
    fn alternatives_multiply() {
        let types = ParameterTypes::default();

        assert_eq!(types.expand("say {text} to {text}"), vec![
            r#"say "([^"]*)" to "([^"]*)""#,
            r#"say '([^']*)' to '([^']*)'"#,
        ]);

        let mut types = ParameterTypes::empty();
        types.insert("{a}", vec!["1".into(), "2".into()]).unwrap();
        types.insert("{b}", vec!["x".into(), "y".into()]).unwrap();
        assert_eq!(types.expand("{a}{b}"), vec!["1x", "1y", "2x", "2y"]);
    }

    #[test]
    fn insert_overrides() {
        let mut types = ParameterTypes::default();
        types.insert("{int}", vec![r"(\d+)".into()]).unwrap();

        assert_eq!(types.expand("{int}"), vec![r"(\d+)"]);
    }

    #[test]
    fn insert_validates() {
        let mut types = ParameterTypes::default();

        assert!(matches!(
            types.insert("int", vec![r"(\d+)".into()]),
            Err(RegistrationError::ParameterAlias { .. }),
        ));
        assert!(matches!(
            types.insert("{2}", vec![r"(\d+)".into()]),
            Err(RegistrationError::ParameterAlias { .. }),
        ));
        assert!(matches!(
            types.insert("{none}", vec![]),
            Err(RegistrationError::EmptyParameterType { .. }),
        ));
        assert!(matches!(
            types.insert("{bad}", vec!["(".into()]),
            Err(RegistrationError::ParameterFragment { .. }),
        ));
        assert_eq!(types.get("{bad}"), None);
    }

    #[test]
    fn fragments_cannot_mention_aliases() {
        let mut types = ParameterTypes::empty();

        assert!(matches!(
            types.insert("{x}", vec!["[{x}]".into()]),
            Err(RegistrationError::NestedParameterType { .. }),
        ));
        assert_eq!(types.get("{x}"), None);

        types.insert("{a}", vec!["[{b}]".into()]).unwrap();
        assert!(matches!(
            types.insert("{b}", vec!["(1)".into()]),
            Err(RegistrationError::NestedParameterType { alias, mentioned })
                if alias == "{a}" && mentioned == "{b}",
        ));

        types.insert("{c}", vec!["(c)".into()]).unwrap();
        assert!(types.insert("{d}", vec!["[{c}]".into()]).is_err());
        assert!(types.insert("{c}", vec!["(cc)".into()]).is_ok());
        assert_eq!(types.expand("{c}"), vec!["(cc)"]);
    }
}
