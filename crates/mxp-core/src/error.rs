use thiserror::Error;

/// Errors produced while turning wire bytes back into a [`Frame`](crate::Frame).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame shorter than the 64-byte header ({len} bytes)")]
    TooShort { len: usize },

    #[error("unsupported frame version {version} (expected 1)")]
    UnsupportedVersion { version: u8 },

    #[error("declared payload length {declared} overflows the buffer or the 16 MiB cap")]
    PayloadLengthOverflow { declared: u32 },

    #[error("payload checksum mismatch: header says {expected:#018x}, computed {actual:#018x}")]
    ChecksumMismatch { expected: u64, actual: u64 },

    #[error("unrecognized frame kind byte {kind:#04x}")]
    UnknownKind { kind: u8 },
}
