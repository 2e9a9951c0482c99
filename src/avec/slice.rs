//! Slice-based decoder implementation.

use thiserror::Error;

use crate::sans::{
    classify::{ClassifyError, Dialect},
    standard::StandardFramer,
    tmq::{FramingError, TmqFramer},
};

use super::{FromSentences, publish_frame};

/// Errors occurring while decoding from a slice.
#[derive(Debug, Error)]
pub enum Error {
    /// The slice holds standard sentences but is not valid UTF-8.
    #[error("Slice is not valid text: {0}.")]
    Encoding(#[from] core::str::Utf8Error),
    /// The slice holds no TMQ frames.
    #[error(transparent)]
    Framing(#[from] FramingError),
    /// A frame could not be classified.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// Decode sentences from a complete document, publishing to a receiver.
///
/// The end of the slice is the end of the stream, so a final sentence lacking
/// its terminator is decoded too. Sentences of unknown type are skipped.
///
/// This method is also re-exported as `sextant::avec::decode_slice`.
pub fn decode(r: &[u8], dialect: Dialect, o: &mut impl FromSentences) -> Result<(), Error> {
    match dialect {
        Dialect::Standard => {
            let mut framer = StandardFramer::new();
            let text = core::str::from_utf8(r)?;

            let frames = framer.push(text).into_iter().chain(framer.finish());
            for frame in frames {
                publish_frame(frame.as_bytes(), dialect, o)?;
            }
        }
        Dialect::Tmq => {
            let mut framer = TmqFramer::new();

            let frames = framer.push(r)?.into_iter().chain(framer.finish());
            for frame in frames {
                publish_frame(&frame, dialect, o)?;
            }
        }
    }

    Ok(())
}
