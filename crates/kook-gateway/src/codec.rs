//! Frame decompression
//!
//! Binary frames arrive zlib-compressed when the endpoint was resolved with
//! `compress=1`; anything that does not inflate is treated as plain text.

use flate2::read::ZlibDecoder;
use std::io::Read;

/// A frame after decompression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    /// Inflated from zlib
    Compressed(String),
    /// Used as-is
    Raw(String),
}

impl DecodedFrame {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Compressed(text) | Self::Raw(text) => text,
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Compressed(text) | Self::Raw(text) => text,
        }
    }

    #[must_use]
    pub const fn was_compressed(&self) -> bool {
        matches!(self, Self::Compressed(_))
    }
}

/// Decode a binary frame
///
/// Never fails: invalid UTF-8 is replaced lossily.
#[must_use]
pub fn decode(bytes: &[u8]) -> DecodedFrame {
    let mut inflated = Vec::new();
    match ZlibDecoder::new(bytes).read_to_end(&mut inflated) {
        Ok(_) => DecodedFrame::Compressed(String::from_utf8_lossy(&inflated).into_owned()),
        Err(_) => DecodedFrame::Raw(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Wrap a text frame, which is never compressed
#[must_use]
pub fn decode_text(text: String) -> DecodedFrame {
    DecodedFrame::Raw(text)
}
