//! Frame codec (C2): 64-byte little-endian header plus payload, §6.1.

use crate::error::DecodeError;
use crate::frame::{Flags, Frame, Kind, MAX_PAYLOAD_LEN, VERSION};
use crate::hash::checksum;

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 64;

/// Encode a frame's 64-byte header. Does not include the payload.
pub fn encode_header(frame: &Frame) -> [u8; HEADER_LEN] {
    let mut buf = [0u8; HEADER_LEN];
    buf[0] = frame.version;
    buf[1] = frame.kind.as_u8();
    buf[2] = frame.flags.bits();
    buf[3] = frame.priority;
    // bytes 4..8 reserved, left zero
    buf[8..16].copy_from_slice(&frame.message_id.to_le_bytes());
    buf[16..24].copy_from_slice(&frame.trace_id.to_le_bytes());
    buf[24..32].copy_from_slice(&frame.correlation_id.to_le_bytes());
    let len = frame.payload.len() as u32;
    buf[32..36].copy_from_slice(&len.to_le_bytes());
    // bytes 36..56 reserved, left zero
    let sum = checksum(&frame.payload);
    buf[56..64].copy_from_slice(&sum.to_le_bytes());
    buf
}

/// Encode a frame as header + payload, contiguous.
pub fn encode(frame: &Frame) -> Vec<u8> {
    let header = encode_header(frame);
    let mut out = Vec::with_capacity(HEADER_LEN + frame.payload.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&frame.payload);
    out
}

/// A decoded header, prior to payload validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub kind_byte: u8,
    pub flags: Flags,
    pub priority: u8,
    pub message_id: u64,
    pub trace_id: u64,
    pub correlation_id: u64,
    pub payload_len: u32,
    pub checksum: u64,
}

/// Decode the first 64 bytes of `bytes` into a [`FrameHeader`].
pub fn decode_header(bytes: &[u8]) -> Result<FrameHeader, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::TooShort { len: bytes.len() });
    }
    let version = bytes[0];
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion { version });
    }
    let kind_byte = bytes[1];
    let flags = Flags::from_bits(bytes[2]);
    let priority = bytes[3];
    let message_id = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
    let trace_id = u64::from_le_bytes(bytes[16..24].try_into().unwrap());
    let correlation_id = u64::from_le_bytes(bytes[24..32].try_into().unwrap());
    let payload_len = u32::from_le_bytes(bytes[32..36].try_into().unwrap());
    let checksum = u64::from_le_bytes(bytes[56..64].try_into().unwrap());

    Ok(FrameHeader {
        version,
        kind_byte,
        flags,
        priority,
        message_id,
        trace_id,
        correlation_id,
        payload_len,
        checksum,
    })
}

/// Decode a complete frame (header + payload) from `bytes`.
///
/// `bytes` may be longer than the frame (e.g. a reused buffer); only the
/// first `64 + payload_len` bytes are consumed.
pub fn decode(bytes: &[u8]) -> Result<Frame, DecodeError> {
    let header = decode_header(bytes)?;

    if header.payload_len as usize > MAX_PAYLOAD_LEN {
        return Err(DecodeError::PayloadLengthOverflow { declared: header.payload_len });
    }
    let end = HEADER_LEN
        .checked_add(header.payload_len as usize)
        .ok_or(DecodeError::PayloadLengthOverflow { declared: header.payload_len })?;
    if end > bytes.len() {
        return Err(DecodeError::PayloadLengthOverflow { declared: header.payload_len });
    }

    let payload = &bytes[HEADER_LEN..end];
    let actual = checksum(payload);
    if actual != header.checksum {
        return Err(DecodeError::ChecksumMismatch { expected: header.checksum, actual });
    }

    let kind = Kind::from_u8(header.kind_byte)
        .ok_or(DecodeError::UnknownKind { kind: header.kind_byte })?;

    Ok(Frame {
        version: header.version,
        kind,
        flags: header.flags,
        priority: header.priority,
        message_id: header.message_id,
        trace_id: header.trace_id,
        correlation_id: header.correlation_id,
        payload: payload.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_encode_decode_round_trip() {
        let call = Frame::call(b"Hello, world!".to_vec());
        let bytes = encode(&call);
        assert_eq!(bytes.len(), HEADER_LEN + 13);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.kind, Kind::Call);
        assert_eq!(decoded.payload, b"Hello, world!");
        assert_eq!(decoded.trace_id, call.trace_id);
        assert_eq!(decoded.message_id, call.message_id);
        assert_eq!(decoded, call);
    }

    #[test]
    fn s2_tampered_payload_fails_checksum() {
        let call = Frame::call(b"Hello, world!".to_vec());
        let mut bytes = encode(&call);
        *bytes.last_mut().unwrap() ^= 0xFF;
        assert!(matches!(decode(&bytes), Err(DecodeError::ChecksumMismatch { .. })));
    }

    #[test]
    fn encoded_length_is_header_plus_payload() {
        let f = Frame::call(vec![0u8; 1234]);
        assert_eq!(encode(&f).len(), HEADER_LEN + 1234);
    }

    #[test]
    fn too_short_buffer_is_rejected() {
        assert_eq!(decode(&[0u8; 10]), Err(DecodeError::TooShort { len: 10 }));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let f = Frame::call(Vec::new());
        let mut bytes = encode(&f);
        bytes[0] = 2;
        assert_eq!(decode(&bytes), Err(DecodeError::UnsupportedVersion { version: 2 }));
    }

    #[test]
    fn declared_length_overflowing_buffer_is_rejected() {
        let f = Frame::call(Vec::new());
        let mut bytes = encode(&f);
        bytes[32..36].copy_from_slice(&100u32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(DecodeError::PayloadLengthOverflow { .. })));
    }

    #[test]
    fn declared_length_over_16_mib_is_rejected() {
        let f = Frame::call(Vec::new());
        let mut bytes = encode(&f);
        bytes[32..36].copy_from_slice(&(MAX_PAYLOAD_LEN as u32 + 1).to_le_bytes());
        assert!(matches!(decode(&bytes), Err(DecodeError::PayloadLengthOverflow { .. })));
    }

    #[test]
    fn message_id_is_preserved_not_regenerated_on_decode() {
        let f = Frame::call(b"x".to_vec());
        let original_id = f.message_id;
        let decoded = decode(&encode(&f)).unwrap();
        assert_eq!(decoded.message_id, original_id);
    }

    #[test]
    fn round_trip_preserves_all_nine_header_fields() {
        let cause = Frame::call(Vec::new());
        let mut f = Frame::response(&cause, b"payload".to_vec());
        f.flags.insert(Flags::HIGH_PRIORITY);
        f.priority = 200;
        let decoded = decode(&encode(&f)).unwrap();
        assert_eq!(decoded.version, f.version);
        assert_eq!(decoded.kind, f.kind);
        assert_eq!(decoded.flags, f.flags);
        assert_eq!(decoded.priority, f.priority);
        assert_eq!(decoded.message_id, f.message_id);
        assert_eq!(decoded.trace_id, f.trace_id);
        assert_eq!(decoded.correlation_id, f.correlation_id);
        assert_eq!(decoded.payload, f.payload);
    }
}
