//! Convenience interfaces for common decoding patterns.
//!
//! The streams in [`reader`] pull sentences from a source handle or from
//! caller-supplied buffers, and the functions in this module decode whole
//! documents, publishing to the [`FromSentences`] and [`FromSentence`] traits.
//!
//! In many cases (when records are of a known shape), these traits can be
//! derived. See the [`FromSentences`](macro@FromSentences) and
//! [`FromSentence`](macro@FromSentence) macros for details. Applications
//! building records their own way implement [`SentenceFactory`] instead.

#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

use alloc::vec::Vec;
use core::{convert::Infallible, marker::PhantomData};

use either::Either::{Left, Right};
use log::debug;
use thiserror::Error;

use crate::sans::classify::{ClassifyError, Dialect, TypeCode, classify};

#[cfg(feature = "std")]
pub use reader::decode as decode_reader;
pub use slice::decode as decode_slice;

/// Derive [`FromSentences`] for a struct holding a collection of records.
///
/// _Requires Cargo feature `derive`._
///
/// # Example
///
/// To collect a single record, add the `sentence("CODE")` attribute to an
/// `Option<T>` struct field, where `CODE` is the three-character sentence code
/// and `T` is a type implementing [`FromSentence`] and [`Default`]. Additional
/// sentences of the same type will overwrite earlier ones. To collect multiple
/// occurrences, apply the attribute to a `Vec<T>` instead.
///
/// ```
/// #[derive(Debug, Default, FromSentences)]
/// struct Track {
///     #[sentence("GGA")]
///     fix: Option<Gga>,
///     #[sentence("RMC")]
///     positions: Vec<Rmc>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use sextant_derive::FromSentences;

/// Produce record receivers for a document.
///
/// See the [`FromSentences`](macro@FromSentences) derive macro for an
/// automatic implementation of this trait.
pub trait FromSentences {
    /// Retrieve a receiver for a sentence, if one exists.
    fn add_sentence(&mut self, code: TypeCode) -> Option<&mut dyn FromSentence>;
}

/// Derive [`FromSentence`] for a struct representing a single record.
///
/// _Requires Cargo feature `derive`._
///
/// # Examples
///
/// To receive a field, add the `field(N)` attribute to an `Option<T>` struct
/// field, where `N` is the zero-based position of the field after the
/// sentence token and `T` implements [`FromStr`](core::str::FromStr). Empty
/// and unparsable fields leave `None`.
///
/// To receive the sentence type itself, supply `type` in place of a field
/// number.
///
/// ```
/// #[derive(Debug, Default, FromSentence)]
/// struct Gga {
///     #[field(type)]
///     code: Option<TypeCode>,
///     #[field(0)]
///     time: Option<String>,
///     #[field(1)]
///     latitude: Option<f64>,
///     #[field(5)]
///     quality: Option<u8>,
/// }
/// ```
///
/// To receive raw bytes or arbitrary types, supply an accumulator closure.
/// The second argument is the raw field, a `&[u8]`.
///
/// ```
/// #[derive(Debug, Default, FromSentence)]
/// struct Mqa {
///     #[field(0, |p, v: &[u8]| p.extend_from_slice(v))]
///     payload: Vec<u8>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use sextant_derive::FromSentence;

/// Receive the fields of a sentence.
///
/// Fields are numbered from zero after the sentence token, with the checksum
/// removed. A TMQ payload is published whole as field zero.
///
/// The default implementation of each method ignores received values.
///
/// See the [`FromSentence`](macro@FromSentence) derive macro for an automatic
/// implementation of this trait.
#[allow(unused_variables)]
pub trait FromSentence {
    /// Add the sentence type to the record.
    fn set_type(&mut self, code: TypeCode) {}
    /// Add a raw field value to the record.
    fn add_field(&mut self, field: u8, value: &[u8]) {}
}

/// Build typed records from classified frames.
///
/// Closures taking a [`TypeCode`] and the frame are factories.
pub trait SentenceFactory {
    type Record;
    type Error;

    /// Build the record for a frame of type `code`.
    fn build(&mut self, code: TypeCode, frame: &[u8]) -> Result<Self::Record, Self::Error>;
}

impl<R, E, F> SentenceFactory for F
where
    F: FnMut(TypeCode, &[u8]) -> Result<R, E>,
{
    type Record = R;
    type Error = E;

    fn build(&mut self, code: TypeCode, frame: &[u8]) -> Result<R, E> {
        self(code, frame)
    }
}

/// A factory building any [`FromSentence`] record from its default.
pub struct RecordFactory<T>(PhantomData<fn() -> T>);

impl<T> RecordFactory<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for RecordFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FromSentence + Default> SentenceFactory for RecordFactory<T> {
    type Record = T;
    type Error = Infallible;

    fn build(&mut self, code: TypeCode, frame: &[u8]) -> Result<T, Infallible> {
        let mut record = T::default();
        publish(code, frame, &mut record);
        Ok(record)
    }
}

/// A record of any type, keeping its fields raw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub code: Option<TypeCode>,
    pub fields: Vec<Vec<u8>>,
}

impl Sentence {
    /// The three-character sentence code.
    pub fn sen_type(&self) -> Option<&'static str> {
        self.code.as_ref().map(TypeCode::as_str)
    }
}

impl FromSentence for Sentence {
    fn set_type(&mut self, code: TypeCode) {
        self.code = Some(code);
    }

    fn add_field(&mut self, _: u8, value: &[u8]) {
        self.fields.push(value.to_vec());
    }
}

/// An error building a record from a frame.
#[derive(Debug, Error)]
pub enum BuildError<E> {
    /// The frame could not be classified.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    /// The factory failed to build the record.
    #[error("Sentence factory failed: {0}")]
    Factory(E),
}

/// The outcome of building one record.
pub type Built<F> =
    Result<<F as SentenceFactory>::Record, BuildError<<F as SentenceFactory>::Error>>;

/// Classify a frame and build its record.
pub fn build<F: SentenceFactory>(frame: &[u8], dialect: Dialect, factory: &mut F) -> Built<F> {
    let code = classify(frame, dialect)?;
    factory.build(code, frame).map_err(BuildError::Factory)
}

/// Split a frame into its fields.
///
/// The leading `$`, the sentence token and a trailing `*HH` checksum are
/// removed. Standard fields are separated by commas. A TMQ payload is opaque
/// and forms a single field.
pub fn fields(code: TypeCode, frame: &[u8]) -> impl Iterator<Item = &[u8]> {
    let frame = frame.strip_prefix(b"$").unwrap_or(frame);
    let frame = strip_checksum(frame);

    // A frame holding only its token has no fields at all.
    let (body, n) = match frame.iter().position(|&b| b == b',') {
        Some(i) => (&frame[i + 1..], usize::MAX),
        None => (&frame[frame.len()..], 0),
    };

    let fields = match code.dialect() {
        Dialect::Standard => Left(body.split(|&b| b == b',')),
        Dialect::Tmq => Right(core::iter::once(body)),
    };

    fields.take(n)
}

fn strip_checksum(r: &[u8]) -> &[u8] {
    let end = r
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |i| i + 1);
    let r = &r[..end];

    match r {
        [head @ .., b'*', h, l] if h.is_ascii_hexdigit() && l.is_ascii_hexdigit() => head,
        _ => r,
    }
}

/// Publish the type and fields of a frame to a receiver.
pub(crate) fn publish(code: TypeCode, frame: &[u8], o: &mut (impl FromSentence + ?Sized)) {
    o.set_type(code);

    for (i, value) in fields(code, frame).enumerate() {
        let Ok(i) = u8::try_from(i) else { break };
        o.add_field(i, value);
    }
}

/// Classify a frame and publish it to the matching receiver of a document.
///
/// Frames of unknown type are skipped. Frames of the wrong dialect are not.
pub(crate) fn publish_frame(
    frame: &[u8],
    dialect: Dialect,
    o: &mut impl FromSentences,
) -> Result<(), ClassifyError> {
    let code = match classify(frame, dialect) {
        Ok(code) => code,
        Err(err @ ClassifyError::UnknownSentenceType { .. }) => {
            debug!("skipping sentence: {err}");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    if let Some(o) = o.add_sentence(code) {
        publish(code, frame, o);
    }

    Ok(())
}
