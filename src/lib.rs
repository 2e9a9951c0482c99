#![no_std]

//! Frame extraction and sentence classification for NMEA 0183 streams.
//!
//! Sextant cuts a continuous, arbitrarily chunked stream into sentences and
//! tells which record shape each one should be parsed into. Two framing
//! dialects are understood: standard line-delimited ASCII sentences, and TMQ
//! proprietary sentences whose binary payload may contain bytes colliding with
//! the standard delimiters.
//!
//! Most users should begin with the streams and derive macros in the [`avec`]
//! module. If these prove insufficient, the I/O-free framers and classifier
//! they are built on live in the [`sans`] module.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable derive macros (default).
//! - `std`: enable reader-based streams (default).
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. No logger
//! is installed.

extern crate alloc;

pub mod avec;
pub mod sans;
