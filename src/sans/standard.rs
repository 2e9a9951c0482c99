//! Framer for standard, separator-delimited sentences.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use log::trace;

use super::split::{Separator, fragments, strip_marker};

/// Buffers standard sentences across chunks.
///
/// Text after the last separator of a chunk is held back as the pending tail
/// and prepended to the next chunk.
#[derive(Debug, Default)]
pub struct StandardFramer {
    separator: Separator,
    pending: String,
}

impl StandardFramer {
    /// Create a framer splitting on line endings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a framer splitting on `separator`.
    pub fn with_separator(separator: Separator) -> Self {
        Self {
            separator,
            pending: String::new(),
        }
    }

    pub fn separator(&self) -> &Separator {
        &self.separator
    }

    /// The incomplete tail held back from earlier chunks.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Append a chunk, returning every frame it completes.
    ///
    /// Returned frames have their leading `$` stripped. An empty chunk returns
    /// nothing and leaves the framer untouched.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        let mut text = core::mem::take(&mut self.pending);
        text.push_str(chunk);

        let mut frames: Vec<&str> = fragments(&text, &self.separator).collect();

        let tail = if self.separator.terminates(&text) {
            None
        } else {
            frames.pop()
        };

        let frames: Vec<String> = frames
            .into_iter()
            .map(|f| strip_marker(f).to_string())
            .collect();

        self.pending = tail.map(str::to_string).unwrap_or_default();

        trace!(
            "framed {} standard sentences, {} bytes pending",
            frames.len(),
            self.pending.len()
        );

        frames
    }

    /// Flush the pending tail as a final frame, once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        let tail = core::mem::take(&mut self.pending);
        (!tail.is_empty()).then(|| strip_marker(&tail).to_string())
    }

    /// Discard the pending tail.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
