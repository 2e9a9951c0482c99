//! I/O-free framers and the sentence classifier.
//!
//! Nothing in this module reads from a source. Callers hand over chunks of
//! data as they arrive and receive every frame completed by that chunk; the
//! framers keep whatever trails the last complete frame until the next chunk.
//! See [`crate::avec`] for streams driving these framers from a reader.
//!
//! # Dialects
//!
//! Standard sentences are self-delimiting: a [`split::Separator`] ends each
//! one, so the [`standard::StandardFramer`] only has to remember the text
//! after the last separator.
//!
//! TMQ sentences carry raw bytes between an ASCII header and checksum, and
//! those bytes may equal `$`, `*`, `\r` or `\n`. The [`tmq::TmqFramer`] anchors
//! on the multi-byte `$PTMQ` prefix instead, and accepts a closing checksum
//! only once the byte after it shows the frame has really ended.
//!
//! Both framers hold at most one incomplete frame between calls. Neither
//! bounds the size of that frame.

pub mod classify;
pub mod split;
pub mod standard;
pub mod tmq;
