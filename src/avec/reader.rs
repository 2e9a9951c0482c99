//! Reader-based streams.
//!
//! _Requires Cargo feature `std`._

use std::{
    io::{self, ErrorKind, Read},
    str::Utf8Error,
    string::String,
    vec,
    vec::Vec,
};

use log::{debug, trace};
use thiserror::Error;

use crate::sans::{
    classify::{ClassifyError, Dialect},
    split::Separator,
    standard::StandardFramer,
    tmq::{FramingError, TmqFramer},
};

use super::{Built, FromSentences, SentenceFactory, build, publish_frame};

extern crate std;

/// Default number of bytes pulled from a source per read.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Errors occurring while reading from a source.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The source of a standard stream is not valid UTF-8.
    #[error("Source is not valid text: {0}.")]
    Encoding(#[from] Utf8Error),
    /// The source of a TMQ stream holds no TMQ frames.
    #[error(transparent)]
    Framing(#[from] FramingError),
    /// A frame could not be classified.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// A stream of standard sentences.
///
/// Frames are pulled from a reader with [`read`](Self::read), or handed over
/// directly with [`read_data`](Self::read_data). A stream without a reader is
/// created with [`NmeaStream::new`].
#[derive(Debug)]
pub struct NmeaStream<R = io::Empty> {
    reader: R,
    framer: StandardFramer,
    undecoded: Vec<u8>,
    block_size: usize,
    exhausted: bool,
}

impl NmeaStream {
    /// Create a stream fed only through [`read_data`](Self::read_data).
    pub fn new() -> Self {
        Self::from_reader(io::empty())
    }
}

impl Default for NmeaStream {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Read> NmeaStream<R> {
    /// Create a stream pulling from `reader`.
    ///
    /// The stream never closes the reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            framer: StandardFramer::new(),
            undecoded: Vec::new(),
            block_size: DEFAULT_BLOCK_SIZE,
            exhausted: false,
        }
    }

    /// Split sentences on `separator` instead of line endings.
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.framer = StandardFramer::with_separator(separator);
        self
    }

    /// Pull `size` bytes from the reader at a time.
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size.max(1);
        self
    }

    /// Pull from the reader until at least one frame is complete.
    ///
    /// Returns an empty vector once the reader is exhausted, and on every call
    /// after that. Reaching the end of the reader flushes a final frame
    /// lacking its separator.
    pub fn read(&mut self) -> Result<Vec<String>, Error> {
        let mut block = vec![0; self.block_size];

        while !self.exhausted {
            let n = read_block(&mut self.reader, &mut block)?;

            if n == 0 {
                self.exhausted = true;

                // A character cut short by the end of the source.
                std::str::from_utf8(&self.undecoded)?;

                debug!("standard source exhausted");
                return Ok(self.framer.finish().into_iter().collect());
            }

            self.undecoded.extend_from_slice(&block[..n]);
            let text = take_text(&mut self.undecoded)?;

            let frames = self.framer.push(&text);
            if !frames.is_empty() {
                return Ok(frames);
            }
        }

        Ok(Vec::new())
    }

    /// Append data supplied by the caller, bypassing the reader.
    ///
    /// Returns every frame the data completes. Empty data returns nothing.
    pub fn read_data(&mut self, data: &str) -> Vec<String> {
        self.framer.push(data)
    }

    /// Flush the pending tail as a final frame.
    pub fn finish(&mut self) -> Option<String> {
        self.framer.finish()
    }

    /// Frames from `data`, or from the reader if no data is supplied.
    pub fn get_strings(&mut self, data: Option<&str>) -> Result<Vec<String>, Error> {
        match data {
            Some(data) => Ok(self.read_data(data)),
            None => self.read(),
        }
    }

    /// Records built from the frames of `data`, or of the reader if no data
    /// is supplied.
    ///
    /// Each frame is classified and built separately, so one failure does not
    /// prevent the others from being returned.
    pub fn get_objects<F: SentenceFactory>(
        &mut self,
        data: Option<&str>,
        factory: &mut F,
    ) -> Result<Vec<Built<F>>, Error> {
        let frames = self.get_strings(data)?;

        Ok(frames
            .iter()
            .map(|f| build(f.as_bytes(), Dialect::Standard, factory))
            .collect())
    }
}

/// A stream of TMQ sentences.
///
/// Frames are pulled from a reader with [`read`](Self::read), or handed over
/// directly with [`read_data`](Self::read_data). A stream without a reader is
/// created with [`TmqStream::new`]. The reader must yield the exact bytes of
/// the stream.
#[derive(Debug)]
pub struct TmqStream<R = io::Empty> {
    reader: R,
    framer: TmqFramer,
    block_size: usize,
    exhausted: bool,
}

impl TmqStream {
    /// Create a stream fed only through [`read_data`](Self::read_data).
    pub fn new() -> Self {
        Self::from_reader(io::empty())
    }
}

impl Default for TmqStream {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Read> TmqStream<R> {
    /// Create a stream pulling from `reader`.
    ///
    /// The stream never closes the reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            framer: TmqFramer::new(),
            block_size: DEFAULT_BLOCK_SIZE,
            exhausted: false,
        }
    }

    /// Give up once `limit` bytes passed without any TMQ anchor.
    pub fn with_anchor_limit(mut self, limit: usize) -> Self {
        self.framer = TmqFramer::with_anchor_limit(limit);
        self
    }

    /// Pull `size` bytes from the reader at a time.
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size.max(1);
        self
    }

    /// Pull from the reader until at least one frame is complete.
    ///
    /// Returns an empty vector once the reader is exhausted, and on every call
    /// after that. Reaching the end of the reader flushes a final frame
    /// lacking the data that would otherwise confirm its end.
    pub fn read(&mut self) -> Result<Vec<Vec<u8>>, Error> {
        let mut block = vec![0; self.block_size];

        while !self.exhausted {
            let n = read_block(&mut self.reader, &mut block)?;

            if n == 0 {
                self.exhausted = true;

                debug!("TMQ source exhausted");
                return Ok(self.framer.finish().into_iter().collect());
            }

            let frames = self.framer.push(&block[..n])?;
            if !frames.is_empty() {
                return Ok(frames);
            }
        }

        Ok(Vec::new())
    }

    /// Append data supplied by the caller, bypassing the reader.
    ///
    /// Returns every frame the data completes. Empty data returns nothing.
    pub fn read_data(&mut self, data: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
        Ok(self.framer.push(data)?)
    }

    /// Flush the pending frame.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        self.framer.finish()
    }

    /// Discard buffered data and recover from a framing error.
    pub fn reset(&mut self) {
        self.framer.reset();
    }

    /// Frames from `data`, or from the reader if no data is supplied.
    pub fn get_strings(&mut self, data: Option<&[u8]>) -> Result<Vec<Vec<u8>>, Error> {
        match data {
            Some(data) => self.read_data(data),
            None => self.read(),
        }
    }

    /// Records built from the frames of `data`, or of the reader if no data
    /// is supplied.
    ///
    /// Each frame is classified and built separately, so one failure does not
    /// prevent the others from being returned.
    pub fn get_objects<F: SentenceFactory>(
        &mut self,
        data: Option<&[u8]>,
        factory: &mut F,
    ) -> Result<Vec<Built<F>>, Error> {
        let frames = self.get_strings(data)?;

        Ok(frames
            .iter()
            .map(|f| build(f, Dialect::Tmq, factory))
            .collect())
    }
}

/// Decode sentences from a reader, publishing to a receiver.
///
/// Sentences of unknown type are skipped. This method is also re-exported as
/// `sextant::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(r: &mut impl Read, dialect: Dialect, o: &mut impl FromSentences) -> Result<(), Error> {
    match dialect {
        Dialect::Standard => {
            let mut stream = NmeaStream::from_reader(r);

            loop {
                let frames = stream.read()?;
                if frames.is_empty() {
                    break;
                }

                for frame in &frames {
                    publish_frame(frame.as_bytes(), dialect, o)?;
                }
            }
        }
        Dialect::Tmq => {
            let mut stream = TmqStream::from_reader(r);

            loop {
                let frames = stream.read()?;
                if frames.is_empty() {
                    break;
                }

                for frame in &frames {
                    publish_frame(frame, dialect, o)?;
                }
            }
        }
    }

    Ok(())
}

/// Read one block, retrying on interruption.
fn read_block(r: &mut impl Read, buf: &mut [u8]) -> Result<usize, io::Error> {
    loop {
        match r.read(buf) {
            Ok(n) => {
                trace!("read {n} bytes from source");
                return Ok(n);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Take the longest valid UTF-8 prefix of `buf`, leaving an incomplete
/// trailing character behind.
fn take_text(buf: &mut Vec<u8>) -> Result<String, Utf8Error> {
    let valid = match std::str::from_utf8(buf) {
        Ok(_) => buf.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => return Err(e),
    };

    let text = std::str::from_utf8(&buf[..valid])?.into();
    buf.drain(..valid);

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avec::{BuildError, RecordFactory, Sentence};

    const SENTENCES: &str = "$GPRMC,184332.07,A,1929.459,S,02410.381,E,74.00,16.78,210410,0.0,E*46
$GPGGA,184333.07,1929.439,S,02410.387,E,1,04,2.8,100.00,M,-33.9,M,,0000*65
$GPGLL,1928.001,S,02410.820,E,184446.08,A,A*79
$GPVTG,16.78,T,,M,74.00,N,137.05,K,A*36";

    #[test]
    fn read_flushes_final_frame() {
        let mut stream = NmeaStream::from_reader(io::Cursor::new(SENTENCES)).with_block_size(7);
        let mut frames = Vec::new();

        loop {
            let next = stream.read().unwrap();
            if next.is_empty() {
                break;
            }
            frames.extend(next);
        }

        assert_eq!(frames.len(), 4);
        assert_eq!(frames[3], "GPVTG,16.78,T,,M,74.00,N,137.05,K,A*36");

        for _ in 0..3 {
            assert!(stream.read().unwrap().is_empty());
        }
    }

    #[test]
    fn read_data_does_not_flush() {
        let mut stream = NmeaStream::new();

        assert_eq!(stream.read_data(SENTENCES).len(), 3);
        assert!(stream.read_data("").is_empty());
        assert!(stream.read().unwrap().is_empty());
        assert_eq!(
            stream.finish().as_deref(),
            Some("GPVTG,16.78,T,,M,74.00,N,137.05,K,A*36")
        );
    }

    #[test]
    fn decodes_characters_split_between_blocks() {
        let text = "$GPTXT,01,01,02,\u{b0}C \u{2103}*00\n";
        let mut stream = NmeaStream::from_reader(io::Cursor::new(text)).with_block_size(1);

        assert_eq!(stream.read().unwrap(), vec!["GPTXT,01,01,02,\u{b0}C \u{2103}*00"]);
    }

    #[test]
    fn rejects_invalid_text() {
        let data: &[u8] = b"$GPTXT,\xff\xfe*00\n";
        let mut stream = NmeaStream::from_reader(data);

        assert!(matches!(stream.read(), Err(Error::Encoding(_))));
    }

    #[test]
    fn rejects_truncated_character() {
        let data: &[u8] = b"$GPTXT,\xe2\x84";
        let mut stream = NmeaStream::from_reader(data);

        assert!(matches!(stream.read(), Err(Error::Encoding(_))));
    }

    #[test]
    fn get_objects_reports_each_frame() {
        let mut stream = NmeaStream::new();
        let mut factory = RecordFactory::<Sentence>::new();

        let data = "$GPRMC,1*00\n$GPXYZ,2*00\n$PTMQA,3*00\n$GPGGA,4*00\n";
        let objects = stream.get_objects(Some(data), &mut factory).unwrap();

        assert_eq!(objects.len(), 4);
        assert_eq!(objects[0].as_ref().unwrap().sen_type(), Some("RMC"));
        assert!(matches!(
            objects[1],
            Err(BuildError::Classify(
                ClassifyError::UnknownSentenceType { .. }
            ))
        ));
        assert!(matches!(
            objects[2],
            Err(BuildError::Classify(ClassifyError::WrongDialect { .. }))
        ));
        assert_eq!(objects[3].as_ref().unwrap().fields, vec![b"4".to_vec()]);
    }

    #[test]
    fn tmq_read_from_reader() {
        let data: &[u8] = b"$GPVTG,16.78,T*36\n$PTMQA,\x01\n\x02*E8\r\n$GPVTG,1*36\n$PTMQA,\x03*76\r\n";
        let mut stream = TmqStream::from_reader(data).with_block_size(3);

        assert_eq!(stream.read().unwrap(), vec![b"$PTMQA,\x01\n\x02*E8".to_vec()]);
        assert_eq!(stream.read().unwrap(), vec![b"$PTMQA,\x03*76".to_vec()]);
        assert!(stream.read().unwrap().is_empty());
        assert!(stream.read().unwrap().is_empty());
    }

    #[test]
    fn tmq_anchor_limit() {
        let data = SENTENCES.as_bytes();
        let mut stream = TmqStream::from_reader(data).with_anchor_limit(64);

        assert!(matches!(
            stream.read(),
            Err(Error::Framing(FramingError::NoFrameAnchorFound { .. }))
        ));
        assert!(stream.read_data(b"$PTMQA,\x00*00\r\n$").is_err());

        stream.reset();
        assert_eq!(
            stream.read_data(b"$PTMQA,\x00*00\r\n$").unwrap(),
            vec![b"$PTMQA,\x00*00".to_vec()]
        );
    }
}
