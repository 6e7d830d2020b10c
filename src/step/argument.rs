// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Typed arguments of [`Step`] functions.
//!
//! Every parameter a [`Step`] function may declare is described by a
//! [`Kind`], and every value passed to it is an [`Arg`]. Raw regex captures
//! are coerced into [`Arg`]s according to the [`Signature`] validated once at
//! registration.
//!
//! [`Step`]: gherkin::Step

use derive_more::{AsRef, Deref, Display, From};

use super::{Error, ShapeRule};

/// Kind of a [`Step`] function parameter.
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Kind {
    /// [`String`], taken verbatim.
    #[display(fmt = "string")]
    String,

    /// [`bool`], case-insensitive `true`/`false`.
    #[display(fmt = "bool")]
    Bool,

    /// [`isize`].
    #[display(fmt = "int")]
    Isize,

    /// [`i8`].
    #[display(fmt = "i8")]
    I8,

    /// [`i16`].
    #[display(fmt = "i16")]
    I16,

    /// [`i32`].
    #[display(fmt = "i32")]
    I32,

    /// [`i64`].
    #[display(fmt = "i64")]
    I64,

    /// [`f32`].
    #[display(fmt = "f32")]
    F32,

    /// [`f64`].
    #[display(fmt = "f64")]
    F64,

    /// Raw bytes of the capture.
    #[display(fmt = "bytes")]
    Bytes,

    /// [`gherkin::Table`] attached to the [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[display(fmt = "table")]
    Table,

    /// [`DocString`] attached to the [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[display(fmt = "docstring")]
    DocString,
}

impl Kind {
    /// Indicates whether this [`Kind`] is filled from a [`Step`] attachment
    /// rather than from a capture.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub const fn is_attachment(self) -> bool {
        matches!(self, Self::Table | Self::DocString)
    }

    /// Coerces the `raw` capture into an [`Arg`] of this [`Kind`].
    ///
    /// Returns [`None`] if the `raw` capture doesn't parse, or this [`Kind`]
    /// is an [attachment](Kind::is_attachment).
    #[must_use]
    pub fn coerce(self, raw: &str) -> Option<Arg> {
        Some(match self {
            Self::String => Arg::String(raw.to_owned()),
            Self::Bool => Arg::Bool(parse_bool(raw)?),
            Self::Isize => Arg::Isize(raw.parse().ok()?),
            Self::I8 => Arg::I8(raw.parse().ok()?),
            Self::I16 => Arg::I16(raw.parse().ok()?),
            Self::I32 => Arg::I32(raw.parse().ok()?),
            Self::I64 => Arg::I64(raw.parse().ok()?),
            Self::F32 => Arg::F32(raw.parse().ok()?),
            Self::F64 => Arg::F64(raw.parse().ok()?),
            Self::Bytes => Arg::Bytes(raw.as_bytes().to_vec()),
            Self::Table | Self::DocString => return None,
        })
    }
}

/// Parses a case-insensitive `true`/`false`.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Docstring attached to a [`Step`].
///
/// [`Step`]: gherkin::Step
#[derive(AsRef, Clone, Debug, Deref, Display, Eq, From, PartialEq)]
pub struct DocString(pub String);

/// Argument passed to a [`Step`] function.
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// [`Kind::String`] argument.
    String(String),

    /// [`Kind::Bool`] argument.
    Bool(bool),

    /// [`Kind::Isize`] argument.
    Isize(isize),

    /// [`Kind::I8`] argument.
    I8(i8),

    /// [`Kind::I16`] argument.
    I16(i16),

    /// [`Kind::I32`] argument.
    I32(i32),

    /// [`Kind::I64`] argument.
    I64(i64),

    /// [`Kind::F32`] argument.
    F32(f32),

    /// [`Kind::F64`] argument.
    F64(f64),

    /// [`Kind::Bytes`] argument.
    Bytes(Vec<u8>),

    /// [`Kind::Table`] argument.
    Table(gherkin::Table),

    /// [`Kind::DocString`] argument.
    DocString(DocString),
}

impl Arg {
    /// Returns the [`Kind`] of this [`Arg`].
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::String(_) => Kind::String,
            Self::Bool(_) => Kind::Bool,
            Self::Isize(_) => Kind::Isize,
            Self::I8(_) => Kind::I8,
            Self::I16(_) => Kind::I16,
            Self::I32(_) => Kind::I32,
            Self::I64(_) => Kind::I64,
            Self::F32(_) => Kind::F32,
            Self::F64(_) => Kind::F64,
            Self::Bytes(_) => Kind::Bytes,
            Self::Table(_) => Kind::Table,
            Self::DocString(_) => Kind::DocString,
        }
    }
}

/// Type usable as a [`Step`] function parameter.
///
/// Implemented only for the types an [`Arg`] may hold, so a [`Step`] function
/// with an unsupported parameter type doesn't compile.
///
/// [`Step`]: gherkin::Step
pub trait Param: Sized {
    /// [`Kind`] describing this type.
    const KIND: Kind;

    /// Extracts this type out of the `arg`, if it holds one.
    fn from_arg(arg: Arg) -> Option<Self>;
}

macro_rules! impl_param {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl Param for $ty {
            const KIND: Kind = Kind::$variant;

            fn from_arg(arg: Arg) -> Option<Self> {
                match arg {
                    Arg::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    )*};
}

impl_param! {
    String => String,
    bool => Bool,
    isize => Isize,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Vec<u8> => Bytes,
    gherkin::Table => Table,
    DocString => DocString,
}

/// Tuple of [`Param`]s a [`Step`] function receives after the
/// [`StepTest`](super::StepTest) and [`Context`](crate::Context).
///
/// [`Step`]: gherkin::Step
pub trait StepArgs: Sized {
    /// [`Kind`]s of the tuple elements, in order.
    fn kinds() -> Vec<Kind>;

    /// Converts the coerced `args` into this tuple.
    ///
    /// # Errors
    ///
    /// If the number or [`Kind`]s of the `args` don't fit.
    fn from_args(args: Vec<Arg>) -> Result<Self, Error>;
}

macro_rules! impl_step_args {
    ($($ty:ident),*) => {
        impl<$($ty: Param),*> StepArgs for ($($ty,)*) {
            fn kinds() -> Vec<Kind> {
                vec![$($ty::KIND),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn from_args(args: Vec<Arg>) -> Result<Self, Error> {
                let declared = Self::kinds().len();
                let received = args.len();
                if declared != received {
                    return Err(Error::ArgumentCount { declared, received });
                }

                let mut args = args.into_iter().enumerate();
                Ok(($({
                    let (index, arg) = args
                        .next()
                        .ok_or(Error::ArgumentCount { declared, received })?;
                    $ty::from_arg(arg).ok_or(Error::ArgumentKind {
                        index,
                        expected: $ty::KIND,
                    })?
                },)*))
            }
        }
    };
}

impl_step_args!();
impl_step_args!(A);
impl_step_args!(A, B);
impl_step_args!(A, B, C);
impl_step_args!(A, B, C, D);
impl_step_args!(A, B, C, D, E);
impl_step_args!(A, B, C, D, E, F);
impl_step_args!(A, B, C, D, E, F, G);
impl_step_args!(A, B, C, D, E, F, G, H);

/// Validated descriptor of a [`Step`] function's parameters.
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    /// Declared [`Kind`]s, in order.
    kinds: Vec<Kind>,
}

impl Signature {
    /// Validates the `kinds` of a [`Step`] function's parameters.
    ///
    /// # Errors
    ///
    /// With the violated [`ShapeRule`], if any.
    ///
    /// [`Step`]: gherkin::Step
    pub fn new(kinds: Vec<Kind>) -> Result<Self, ShapeRule> {
        let mut attachments = false;
        let (mut tables, mut docstrings) = (0, 0);
        for kind in &kinds {
            match kind {
                Kind::Table => tables += 1,
                Kind::DocString => docstrings += 1,
                _ if attachments => {
                    return Err(ShapeRule::AttachmentNotTrailing)
                }
                _ => {}
            }
            attachments |= kind.is_attachment();
        }
        if tables > 1 {
            return Err(ShapeRule::DuplicateTable);
        }
        if docstrings > 1 {
            return Err(ShapeRule::DuplicateDocString);
        }
        Ok(Self { kinds })
    }

    /// Declared [`Kind`]s, in order.
    #[must_use]
    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    /// Number of parameters bound to captures.
    #[must_use]
    pub fn captures(&self) -> usize {
        self.kinds.iter().filter(|k| !k.is_attachment()).count()
    }

    /// Coerces the raw `captures` and attachments of the `step` into
    /// [`Arg`]s.
    ///
    /// # Errors
    ///
    /// - [`Error::ArgumentCount`] if the number of `captures` differs from
    ///   the number of capture-bound parameters.
    /// - [`Error::Coercion`] if a capture doesn't parse.
    /// - [`Error::MissingAttachment`] if the `step` lacks a declared
    ///   attachment.
    pub fn coerce(
        &self,
        captures: &[String],
        step: &gherkin::Step,
    ) -> Result<Vec<Arg>, Error> {
        let declared = self.captures();
        if declared != captures.len() {
            return Err(Error::ArgumentCount {
                declared,
                received: captures.len(),
            });
        }

        self.kinds
            .iter()
            .zip(captures.iter().map(Some).chain(std::iter::repeat(None)))
            .enumerate()
            .map(|(index, (&kind, raw))| match kind {
                Kind::Table => step
                    .table
                    .clone()
                    .map(Arg::Table)
                    .ok_or(Error::MissingAttachment { kind }),
                Kind::DocString => step
                    .docstring
                    .clone()
                    .map(|d| Arg::DocString(DocString(d)))
                    .ok_or(Error::MissingAttachment { kind }),
                _ => {
                    let raw = raw.map_or("", String::as_str);
                    kind.coerce(raw).ok_or_else(|| Error::Coercion {
                        index,
                        value: raw.to_owned(),
                        kind,
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use gherkin::GherkinEnv;

    use super::*;

    fn step(text: &str) -> gherkin::Step {
        let feature = gherkin::Feature::parse(
            format!("Feature: f\n  Scenario: s\n{text}\n"),
            GherkinEnv::default(),
        )
        .unwrap();
        feature.scenarios[0].steps[0].clone()
    }

    #[test]
    fn bool_is_case_insensitive() {
        assert_eq!(Kind::Bool.coerce("TRUE"), Some(Arg::Bool(true)));
        assert_eq!(Kind::Bool.coerce("false"), Some(Arg::Bool(false)));
        assert_eq!(Kind::Bool.coerce("yes"), None);
    }

    #[test]
    fn scalars_coerce_at_their_width() {
        assert_eq!(Kind::I8.coerce("-128"), Some(Arg::I8(-128)));
        assert_eq!(Kind::I8.coerce("128"), None);
        assert_eq!(Kind::I16.coerce("32767"), Some(Arg::I16(32767)));
        assert_eq!(Kind::I32.coerce("x"), None);
        assert_eq!(
            Kind::I64.coerce("9223372036854775807"),
            Some(Arg::I64(i64::MAX)),
        );
        assert_eq!(Kind::Isize.coerce("42"), Some(Arg::Isize(42)));
        assert_eq!(Kind::F32.coerce("123.5"), Some(Arg::F32(123.5)));
        assert_eq!(Kind::F64.coerce("-0.25"), Some(Arg::F64(-0.25)));
        assert_eq!(
            Kind::Bytes.coerce("pizza"),
            Some(Arg::Bytes(b"pizza".to_vec())),
        );
        assert_eq!(
            Kind::String.coerce(" as is "),
            Some(Arg::String(" as is ".into())),
        );
        assert_eq!(Kind::Table.coerce("whatever"), None);
    }

    #[test]
    fn signature_requires_trailing_attachments() {
        use Kind as K;

        assert!(Signature::new(vec![K::String, K::Table, K::DocString]).is_ok());
        assert!(Signature::new(vec![K::DocString, K::Table]).is_ok());
        assert_eq!(
            Signature::new(vec![K::Table, K::String]),
            Err(ShapeRule::AttachmentNotTrailing),
        );
        assert_eq!(
            Signature::new(vec![K::Table, K::Table]),
            Err(ShapeRule::DuplicateTable),
        );
        assert_eq!(
            Signature::new(vec![K::I8, K::DocString, K::DocString]),
            Err(ShapeRule::DuplicateDocString),
        );
    }

    #[test]
    fn coerce_checks_capture_count() {
        let sig = Signature::new(vec![Kind::I32, Kind::I32]).unwrap();

        assert_eq!(
            sig.coerce(&["1".into()], &step("    Given one")),
            Err(Error::ArgumentCount {
                declared: 2,
                received: 1,
            }),
        );
    }

    #[test]
    fn coerce_fills_attachments() {
        let sig = Signature::new(vec![Kind::String, Kind::DocString]).unwrap();
        let step = step("    Given a doc\n      \"\"\"\n      body\n      \"\"\"");

        let args = sig.coerce(&["doc".into()], &step).unwrap();
        assert_eq!(args[0], Arg::String("doc".into()));
        assert!(
            matches!(&args[1], Arg::DocString(d) if d.trim() == "body"),
            "{args:?}",
        );

        let sig = Signature::new(vec![Kind::Table]).unwrap();
        assert_eq!(
            sig.coerce(&[], &step),
            Err(Error::MissingAttachment { kind: Kind::Table }),
        );
    }

    #[test]
    fn coerce_reports_bad_capture() {
        let sig = Signature::new(vec![Kind::String, Kind::I8]).unwrap();

        assert_eq!(
            sig.coerce(&["a".into(), "1000".into()], &step("    Given a")),
            Err(Error::Coercion {
                index: 1,
                value: "1000".into(),
                kind: Kind::I8,
            }),
        );
    }

    #[test]
    fn step_args_convert_tuples() {
        assert_eq!(<(i64, String)>::kinds(), vec![Kind::I64, Kind::String]);
        assert!(<()>::kinds().is_empty());

        let (n, s) = <(i64, String)>::from_args(vec![
            Arg::I64(5),
            Arg::String("x".into()),
        ])
        .unwrap();
        assert_eq!((n, s.as_str()), (5, "x"));

        assert_eq!(
            <(bool,)>::from_args(vec![Arg::I8(1)]),
            Err(Error::ArgumentKind {
                index: 0,
                expected: Kind::Bool,
            }),
        );
    }
}
