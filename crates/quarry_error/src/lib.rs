use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

pub type Result<T, E = QuarryError> = std::result::Result<T, E>;

/// Broad category for an error.
///
/// Binding and planning only ever produce `Parse`, `Semantic` or
/// `NotImplemented`; `Internal` indicates a bug in the planner itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input tree.
    Parse,
    /// Unresolved or ambiguous name, unknown table, unknown type, etc.
    Semantic,
    /// A statement shape we don't support yet.
    NotImplemented,
    /// Broken invariant inside the planner.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Semantic => write!(f, "semantic"),
            Self::NotImplemented => write!(f, "not implemented"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[derive(Debug)]
pub struct QuarryError {
    /// Category of the error.
    pub kind: ErrorKind,

    /// Message for the error.
    pub msg: String,

    /// Source of the error.
    pub source: Option<Box<dyn Error + Send + Sync>>,

    /// Captured backtrace for the error.
    ///
    /// Enable with the RUST_BACKTRACE env var.
    pub backtrace: Backtrace,
}

impl QuarryError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Internal, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Parse, msg)
    }

    pub fn semantic(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Semantic, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        QuarryError {
            kind,
            msg: msg.into(),
            source: None,
            backtrace: Backtrace::capture(),
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        QuarryError {
            kind: ErrorKind::Internal,
            msg: msg.into(),
            source: Some(source),
            backtrace: Backtrace::capture(),
        }
    }
}

/// Shorthand for returning a not-implemented error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        return Err($crate::QuarryError::with_kind(
            $crate::ErrorKind::NotImplemented,
            msg,
        ));
    }};
}

impl fmt::Display for QuarryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)?;
        if let Some(source) = &self.source {
            write!(f, "\nError source: {}", source)?;
        }

        if matches!(self.backtrace.status(), BacktraceStatus::Captured) {
            write!(f, "\nBacktrace:\n{}", self.backtrace)?;
        }

        Ok(())
    }
}

impl Error for QuarryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as _)
    }
}

/// An extension trait for adding context to the Error variant of a result.
pub trait ResultExt<T, E> {
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E: Error + Send + Sync + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn context(self, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(QuarryError::with_source(msg, Box::new(e))),
        }
    }
}

/// An extension trait for converting the None variant of an option into an
/// internal error.
pub trait OptionExt<T> {
    fn required(self, msg: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(QuarryError::new(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        let err = QuarryError::semantic("column a not found");
        let s = err.to_string();
        assert!(s.starts_with("semantic: column a not found"), "{s}");
    }

    #[test]
    fn not_implemented_macro_returns_err() {
        fn check() -> Result<()> {
            not_implemented!("set operations");
        }
        let err = check().unwrap_err();
        assert_eq!(ErrorKind::NotImplemented, err.kind);
        assert_eq!("set operations", err.msg);
    }

    #[test]
    fn option_required() {
        let v: Option<i32> = None;
        let err = v.required("missing scope").unwrap_err();
        assert_eq!(ErrorKind::Internal, err.kind);
    }
}
