//! Splitting text into frame bodies.

use alloc::{string::String, vec::Vec};

use either::Either::{Left, Right};

/// Marker opening every sentence.
pub const START_MARKER: char = '$';

/// Where one standard frame ends and the next begins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Separator {
    /// Any of `\r\n`, `\r` or `\n`.
    #[default]
    LineEnding,
    /// An arbitrary string. An empty string never separates anything.
    Custom(String),
}

impl Separator {
    /// Build a custom separator, rejecting the empty string.
    pub fn custom(separator: impl Into<String>) -> Option<Self> {
        let separator = separator.into();
        (!separator.is_empty()).then_some(Self::Custom(separator))
    }

    /// Whether `text` ends exactly on a separator.
    pub fn terminates(&self, text: &str) -> bool {
        match self {
            Self::LineEnding => text.ends_with(['\r', '\n']),
            Self::Custom(s) => !s.is_empty() && text.ends_with(s.as_str()),
        }
    }
}

/// Split `text` into frame bodies.
///
/// Empty fragments left between adjacent separators are discarded, and a
/// single leading [`START_MARKER`] is stripped from each body. Bodies are not
/// otherwise validated.
pub fn split<'a>(text: &'a str, separator: &Separator) -> Vec<&'a str> {
    fragments(text, separator).map(strip_marker).collect()
}

/// Non-empty fragments of `text`, as found between separators.
pub(crate) fn fragments<'a>(text: &'a str, separator: &Separator) -> impl Iterator<Item = &'a str> {
    let fragments = match separator {
        Separator::LineEnding => Left(text.split(['\r', '\n'])),
        Separator::Custom(s) if s.is_empty() => Right(Left(core::iter::once(text))),
        Separator::Custom(s) => Right(Right(text.split(s.as_str()))),
    };

    fragments.filter(|f| !f.is_empty())
}

pub(crate) fn strip_marker(fragment: &str) -> &str {
    fragment.strip_prefix(START_MARKER).unwrap_or(fragment)
}
