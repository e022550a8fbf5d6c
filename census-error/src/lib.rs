#![deny(missing_docs)]

//! Error handling for the census record stores.
//!
//! Every fallible operation in the workspace returns a [`CensusResult`]. Nothing in the library
//! crates terminates the process; failures are propagated to the caller with a captured
//! backtrace and, where useful, a chain of context messages.

mod ext;

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::{fmt, io};

pub use ext::*;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Alias for [`Backtrace`]; thiserror's `provide()` generation (nightly-only) keys on the
/// literal type name `Backtrace`, so the alias keeps the derive building on stable.
type CapturedBacktrace = Backtrace;

/// The top-level error type for the census crates.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum CensusError {
    /// An index or id fell outside the valid half-open range `[start, end)`.
    #[error("index {0} out of bounds from {1} to {2}\nBacktrace:\n{3}")]
    OutOfBounds(u64, u64, u64, CapturedBacktrace),
    /// A caller supplied an invalid value.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, CapturedBacktrace),
    /// A source text field could not be parsed.
    #[error("{0}\nBacktrace:\n{1}")]
    Parse(ErrString, CapturedBacktrace),
    /// An on-disk artifact is not in the shape its reader requires.
    #[error("{0}\nBacktrace:\n{1}")]
    Corrupt(ErrString, CapturedBacktrace),
    /// A record does not match the schema it is being encoded with.
    #[error("{0}\nBacktrace:\n{1}")]
    SchemaMismatch(ErrString, CapturedBacktrace),
    /// An aggregated measure left the representable range.
    #[error("{0}\nBacktrace:\n{1}")]
    Overflow(ErrString, CapturedBacktrace),
    /// Wraps another error with an additional message.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<CensusError>),
    /// A wrapped I/O error.
    #[error(transparent)]
    IOError(#[from] io::Error),
    /// A wrapped error from the delimited text reader/writer.
    #[error(transparent)]
    CsvError(#[from] csv::Error),
    /// A wrapped JSON error, raised while reading or writing table definitions.
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

impl CensusError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        CensusError::Context(msg.into(), Box::new(self))
    }

    /// Returns the innermost error, skipping any layers of context.
    pub fn root(&self) -> &CensusError {
        match self {
            CensusError::Context(_, inner) => inner.root(),
            other => other,
        }
    }
}

impl Debug for CensusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return [`CensusError`]s as their error type.
pub type CensusResult<T> = Result<T, CensusError>;

/// A trait for unwrapping a value or panicking with a message.
///
/// Only used where a failure would mean an internal invariant has been broken.
pub trait CensusExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value or panics with the given message.
    fn census_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> CensusExpect for Result<T, E>
where
    E: Into<CensusError>,
{
    type Output = T;

    #[inline(always)]
    fn census_expect(self, msg: &str) -> Self::Output {
        self.map_err(Into::<CensusError>::into)
            .unwrap_or_else(|e| census_panic!(e.with_context(msg.to_string())))
    }
}

impl<T> CensusExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn census_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err = CensusError::InvalidArgument(msg.to_string().into(), Backtrace::capture());
            census_panic!(err)
        })
    }
}

/// Construct a [`CensusError`] using `format!` style arguments.
///
/// Without a leading variant name the error is an `InvalidArgument`.
#[macro_export]
macro_rules! census_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::CensusError::OutOfBounds($idx, $start, $stop, Backtrace::capture())
        )
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::CensusError::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
        )
    }};
    ($variant:ident: $err:expr $(,)?) => {
        $crate::__private::must_use(
            $crate::CensusError::$variant($err)
        )
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::census_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// Return early from a function with a [`CensusError`] built by [`census_err!`].
#[macro_export]
macro_rules! census_bail {
    ($($tt:tt)+) => {
        return Err($crate::census_err!($($tt)+))
    };
}

/// Panic with a [`CensusError`], or with a message formatted into one.
#[macro_export]
macro_rules! census_panic {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        $crate::census_panic!($crate::census_err!(OutOfBounds: $idx, $start, $stop))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::census_panic!($crate::census_err!($variant: $fmt, $($arg),*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let err: $crate::CensusError = $err;
        panic!("{}", err.with_context(format!($fmt, $($arg),*)))
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::census_panic!($crate::census_err!($fmt, $($arg),*))
    };
    ($err:expr) => {{
        let err: $crate::CensusError = $err;
        panic!("{}", err)
    }};
}

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn must_use(error: crate::CensusError) -> crate::CensusError {
        error
    }
}
