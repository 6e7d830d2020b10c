// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-[`Scenario`] state shared between [`Step`]s and hooks.
//!
//! [`Scenario`]: gherkin::Scenario
//! [`Step`]: gherkin::Step

use std::{
    any::{self, Any, TypeId},
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
    sync::Arc,
};

use derive_more::{Display, Error};

/// Key of a value stored in a [`Context`].
///
/// Implemented for every `'static` type being [`Eq`] + [`Hash`] +
/// [`Debug`](fmt::Debug), so a unit struct is the usual way to declare one:
///
/// ```rust
/// # use gherkin_suite::Context;
/// #[derive(Debug, Eq, Hash, PartialEq)]
/// struct Balance;
///
/// let mut ctx = Context::new();
/// ctx.set(Balance, 100_i64);
/// assert_eq!(ctx.get_i64(&Balance), Ok(100));
/// ```
///
/// Keys are compared by their type first, so keys of different types never
/// collide, even if their values look the same (`"sum"` as a `&str` and
/// `"sum"` as a [`String`] are different keys).
pub trait Key: Any + fmt::Debug + Send + Sync {
    /// Upcasts this [`Key`] to [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// Compares this [`Key`] with the `other` one, type included.
    fn dyn_eq(&self, other: &dyn Key) -> bool;

    /// Feeds this [`Key`] (type included) into the given [`Hasher`].
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T> Key for T
where
    T: Any + fmt::Debug + Eq + Hash + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Key) -> bool {
        other.as_any().downcast_ref::<T>().map_or(false, |o| o == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

impl PartialEq for dyn Key {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}

impl Eq for dyn Key {}

impl Hash for dyn Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dyn_hash(state);
    }
}

/// Value stored in a [`Context`].
type Value = Arc<dyn Any + Send + Sync>;

/// Ordered key/value store passed through hooks and [`Step`] functions of a
/// single [`Scenario`] run.
///
/// Besides user values, it holds the raw captures of the currently executing
/// [`Step`], readable via [`Context::param()`] and its typed siblings.
///
/// Cloning is shallow: the clone gets its own map, but the values themselves
/// are shared until overwritten.
///
/// [`Scenario`]: gherkin::Scenario
/// [`Step`]: gherkin::Step
#[derive(Clone, Default)]
pub struct Context {
    /// User values.
    values: HashMap<Arc<dyn Key>, Value>,

    /// Raw captures of the currently executing [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    params: Vec<String>,
}

// Implemented manually, as values are opaque.
impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("params", &self.params)
            .finish()
    }
}

/// Generates typed getters of [`Context`] values.
macro_rules! typed_getters {
    ($($get:ident, $get_or:ident => $ty:ty),* $(,)?) => {$(
        #[doc = concat!(
            "Returns the `", stringify!($ty), "` stored under the `key`.\n\n",
            "# Errors\n\n",
            "If the `key` is absent or holds a value of another type.",
        )]
        pub fn $get(&self, key: &(dyn Key + 'static)) -> Result<$ty, Error> {
            self.get::<$ty>(key).map(Clone::clone)
        }

        #[doc = concat!(
            "Returns the `", stringify!($ty), "` stored under the `key`, or ",
            "the `default` if the `key` is absent.\n\n",
            "# Errors\n\n",
            "If the `key` holds a value of another type.",
        )]
        pub fn $get_or(
            &self,
            key: &(dyn Key + 'static),
            default: $ty,
        ) -> Result<$ty, Error> {
            self.get_or::<$ty>(key, default)
        }
    )*};
}

/// Generates typed parsers of raw [`Context`] params.
macro_rules! typed_params {
    ($($name:ident => $ty:ty),* $(,)?) => {$(
        #[doc = concat!(
            "Parses the `index`th raw capture as `", stringify!($ty), "`.\n\n",
            "# Errors\n\n",
            "If there is no such capture, or it doesn't parse.",
        )]
        pub fn $name(&self, index: usize) -> Result<$ty, Error> {
            self.parse_param::<$ty>(index)
        }
    )*};
}

impl Context {
    /// Creates an empty [`Context`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the `value` under the `key`, overwriting any previous one.
    pub fn set<K: Key, V: Any + Send + Sync>(&mut self, key: K, value: V) {
        _ = self.values.insert(Arc::new(key), Arc::new(value));
    }

    /// Returns the value stored under the `key`.
    ///
    /// # Errors
    ///
    /// - [`Error::KeyNotFound`] if the `key` is absent.
    /// - [`Error::TypeMismatch`] if the value is not a `V`.
    pub fn get<V: Any>(&self, key: &(dyn Key + 'static)) -> Result<&V, Error> {
        let value = self.values.get(key).ok_or_else(|| Error::KeyNotFound {
            key: format!("{key:?}"),
        })?;
        value.downcast_ref::<V>().ok_or_else(|| Error::TypeMismatch {
            key: format!("{key:?}"),
            expected: any::type_name::<V>(),
        })
    }

    /// Returns the value stored under the `key`, or the `default` one if the
    /// `key` is absent.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if the stored value is not a `V`.
    pub fn get_or<V: Any + Clone>(
        &self,
        key: &(dyn Key + 'static),
        default: V,
    ) -> Result<V, Error> {
        match self.get::<V>(key) {
            Ok(v) => Ok(v.clone()),
            Err(Error::KeyNotFound { .. }) => Ok(default),
            Err(e) => Err(e),
        }
    }

    /// Returns the untyped value stored under the `key`, if any.
    #[must_use]
    pub fn get_any(
        &self,
        key: &(dyn Key + 'static),
    ) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(key).map(AsRef::as_ref)
    }

    typed_getters! {
        get_string, get_string_or => String,
        get_bool, get_bool_or => bool,
        get_int, get_int_or => isize,
        get_i8, get_i8_or => i8,
        get_i16, get_i16_or => i16,
        get_i32, get_i32_or => i32,
        get_i64, get_i64_or => i64,
        get_f32, get_f32_or => f32,
        get_f64, get_f64_or => f64,
    }

    /// Indicates whether a value is stored under the `key`.
    #[must_use]
    pub fn contains(&self, key: &(dyn Key + 'static)) -> bool {
        self.values.contains_key(key)
    }

    /// Removes the value stored under the `key`, returning whether there was
    /// one.
    pub fn remove(&mut self, key: &(dyn Key + 'static)) -> bool {
        self.values.remove(key).is_some()
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Indicates whether no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw captures of the currently executing [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Replaces the raw captures before a [`Step`] invocation.
    ///
    /// [`Step`]: gherkin::Step
    pub(crate) fn set_params(&mut self, params: Vec<String>) {
        self.params = params;
    }

    /// Returns the `index`th raw capture verbatim.
    ///
    /// # Errors
    ///
    /// [`Error::ParamNotFound`] if there is no such capture.
    pub fn param(&self, index: usize) -> Result<&str, Error> {
        self.params
            .get(index)
            .map(String::as_str)
            .ok_or(Error::ParamNotFound { index })
    }

    /// Returns the `index`th raw capture as an owned [`String`].
    ///
    /// # Errors
    ///
    /// [`Error::ParamNotFound`] if there is no such capture.
    pub fn string_param(&self, index: usize) -> Result<String, Error> {
        self.param(index).map(str::to_owned)
    }

    /// Returns the `index`th raw capture as bytes.
    ///
    /// # Errors
    ///
    /// [`Error::ParamNotFound`] if there is no such capture.
    pub fn bytes_param(&self, index: usize) -> Result<Vec<u8>, Error> {
        self.param(index).map(|p| p.as_bytes().to_vec())
    }

    /// Parses the `index`th raw capture as a case-insensitive `true`/`false`.
    ///
    /// # Errors
    ///
    /// If there is no such capture, or it's not a boolean.
    pub fn bool_param(&self, index: usize) -> Result<bool, Error> {
        let raw = self.param(index)?;
        crate::step::parse_bool(raw).ok_or_else(|| Error::ParamParse {
            index,
            value: raw.to_owned(),
            ty: "bool",
        })
    }

    typed_params! {
        int_param => isize,
        i8_param => i8,
        i16_param => i16,
        i32_param => i32,
        i64_param => i64,
        f32_param => f32,
        f64_param => f64,
    }

    fn parse_param<T: FromStr>(&self, index: usize) -> Result<T, Error> {
        let raw = self.param(index)?;
        raw.parse().map_err(|_| Error::ParamParse {
            index,
            value: raw.to_owned(),
            ty: any::type_name::<T>(),
        })
    }
}

/// Error of accessing a [`Context`].
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum Error {
    /// No value is stored under the key.
    #[display(fmt = "the key {} does not exist", key)]
    KeyNotFound {
        /// [`Debug`](fmt::Debug) representation of the key.
        key: String,
    },

    /// Stored value has another type than the requested one.
    #[display(fmt = "the value under the key {} is not {}", key, expected)]
    TypeMismatch {
        /// [`Debug`](fmt::Debug) representation of the key.
        key: String,

        /// Name of the requested type.
        expected: &'static str,
    },

    /// No raw capture with such index.
    #[display(fmt = "the param with index {} does not exist", index)]
    ParamNotFound {
        /// Requested index.
        index: usize,
    },

    /// Raw capture doesn't parse as the requested type.
    #[display(fmt = "cannot parse param {} (`{}`) as {}", index, value, ty)]
    ParamParse {
        /// Requested index.
        index: usize,

        /// Raw capture.
        value: String,

        /// Name of the requested type.
        ty: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Eq, Hash, PartialEq)]
    struct Sum;

    #[derive(Debug, Eq, Hash, PartialEq)]
    struct Other;

    #[derive(Debug, Eq, Hash, PartialEq)]
    struct Named(&'static str);

    #[test]
    fn set_overwrites_and_get_returns_last_value() {
        let mut ctx = Context::new();
        ctx.set(Sum, 1_i64);
        ctx.set(Sum, 2_i64);

        assert_eq!(ctx.get_i64(&Sum), Ok(2));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn keys_of_different_types_do_not_collide() {
        let mut ctx = Context::new();
        ctx.set("sum", 1_i64);
        ctx.set(String::from("sum"), 2_i64);
        ctx.set(Named("sum"), 3_i64);

        assert_eq!(ctx.get_i64(&"sum"), Ok(1));
        assert_eq!(ctx.get_i64(&String::from("sum")), Ok(2));
        assert_eq!(ctx.get_i64(&Named("sum")), Ok(3));
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn missing_key_is_an_error_unless_default_given() {
        let ctx = Context::new();

        assert!(matches!(
            ctx.get_string(&Sum),
            Err(Error::KeyNotFound { .. }),
        ));
        assert_eq!(ctx.get_string_or(&Sum, "dflt".into()), Ok("dflt".into()));
        assert_eq!(ctx.get_bool_or(&Other, true), Ok(true));
    }

    #[test]
    fn type_mismatch_is_reported_even_with_default() {
        let mut ctx = Context::new();
        ctx.set(Sum, "five");

        assert_eq!(
            ctx.get_int(&Sum),
            Err(Error::TypeMismatch {
                key: "Sum".into(),
                expected: "isize",
            }),
        );
        assert!(matches!(
            ctx.get_int_or(&Sum, 5),
            Err(Error::TypeMismatch { .. }),
        ));
    }

    #[test]
    fn clone_is_isolated() {
        let mut base = Context::new();
        base.set(Sum, 1_i32);

        let mut first = base.clone();
        let mut second = base.clone();
        first.set(Sum, 10_i32);
        second.set(Other, true);

        assert_eq!(base.get_i32(&Sum), Ok(1));
        assert_eq!(first.get_i32(&Sum), Ok(10));
        assert!(!first.contains(&Other));
        assert_eq!(second.get_i32(&Sum), Ok(1));
    }

    #[test]
    fn remove_drops_value() {
        let mut ctx = Context::new();
        ctx.set(Sum, 1_u8);

        assert!(ctx.remove(&Sum));
        assert!(!ctx.remove(&Sum));
        assert!(ctx.is_empty());
    }

    #[test]
    fn params_are_typed_and_indexed() {
        let mut ctx = Context::new();
        ctx.set_params(vec![
            "42".into(),
            "TRUE".into(),
            "123.500000".into(),
            "pizza".into(),
        ]);

        assert_eq!(ctx.int_param(0), Ok(42));
        assert_eq!(ctx.i8_param(0), Ok(42));
        assert_eq!(ctx.bool_param(1), Ok(true));
        assert_eq!(ctx.f32_param(2), Ok(123.5));
        assert_eq!(ctx.string_param(3), Ok("pizza".into()));
        assert_eq!(ctx.bytes_param(3), Ok(b"pizza".to_vec()));
    }

    #[test]
    fn param_errors_are_distinct() {
        let mut ctx = Context::new();
        ctx.set_params(vec!["300".into()]);

        assert_eq!(ctx.param(1), Err(Error::ParamNotFound { index: 1 }));
        assert_eq!(
            ctx.i8_param(0),
            Err(Error::ParamParse {
                index: 0,
                value: "300".into(),
                ty: "i8",
            }),
        );
    }
}
