//! Decode configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What to do with chunks that are neither `MThd` nor `MTrk`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnknownChunkPolicy {
    /// Log and drop them
    #[default]
    Skip,
    /// Keep them on the decoded file, in order
    Retain,
}

/// Options for a whole-file decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DecodeOptions {
    /// Handling of unrecognized chunks
    unknown_chunks: UnknownChunkPolicy,
    /// Decode tracks on the rayon pool, only honored with the `parallel` feature
    parallel: bool,
}

impl DecodeOptions {
    /// Default options: skip unknown chunks, decode sequentially
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the unknown chunk policy
    pub fn with_unknown_chunks(mut self, policy: UnknownChunkPolicy) -> Self {
        self.unknown_chunks = policy;
        self
    }

    /// Requests decoding tracks in parallel
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The unknown chunk policy
    pub fn unknown_chunks(&self) -> UnknownChunkPolicy {
        self.unknown_chunks
    }

    /// Whether parallel track decoding was requested
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}
