//! The typed frame value (C3) — kind, flags, priority, ids, payload, plus
//! the factory helpers that build every frame this codebase ever sends.

use crate::hash::random_id;

/// Wire version this crate speaks. Fixed at 1; `decode` rejects anything else.
pub const VERSION: u8 = 1;

/// Maximum payload size in bytes (16 MiB).
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

/// Message kind, encoded as a single byte on the wire (§6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    Call = 0x01,
    Response = 0x02,
    Error = 0x03,
    Notify = 0x04,
    StreamOpen = 0x10,
    StreamChunk = 0x11,
    StreamClose = 0x12,
    AgentRegister = 0x20,
    AgentDiscover = 0x21,
    AgentHeartbeat = 0x22,
    Ping = 0xF0,
    Pong = 0xF1,
}

impl Kind {
    /// Decode a wire byte into a `Kind`, or `None` for an unrecognized value.
    pub fn from_u8(v: u8) -> Option<Kind> {
        Some(match v {
            0x01 => Kind::Call,
            0x02 => Kind::Response,
            0x03 => Kind::Error,
            0x04 => Kind::Notify,
            0x10 => Kind::StreamOpen,
            0x11 => Kind::StreamChunk,
            0x12 => Kind::StreamClose,
            0x20 => Kind::AgentRegister,
            0x21 => Kind::AgentDiscover,
            0x22 => Kind::AgentHeartbeat,
            0xF0 => Kind::Ping,
            0xF1 => Kind::Pong,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Flag bitset (§6.3). Hand-rolled rather than pulled in from a crate since
/// it is five bits over a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const EMPTY: Flags = Flags(0);
    pub const ENCRYPTED: Flags = Flags(0x01);
    pub const COMPRESSED: Flags = Flags(0x02);
    pub const REQUIRES_ACK: Flags = Flags(0x04);
    pub const RETRANSMIT: Flags = Flags(0x08);
    pub const HIGH_PRIORITY: Flags = Flags(0x10);

    pub const fn from_bits(bits: u8) -> Self {
        Flags(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, flag: Flags) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn insert(&mut self, flag: Flags) {
        self.0 |= flag.0;
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// A single MXP message: 64-byte header (conceptually) plus payload.
///
/// Constructed once via a factory helper below, serialized once, then
/// discarded — see the lifecycle note in the module-level docs of the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: u8,
    pub kind: Kind,
    pub flags: Flags,
    pub priority: u8,
    pub message_id: u64,
    pub trace_id: u64,
    pub correlation_id: u64,
    pub payload: Vec<u8>,
}

impl Frame {
    fn new(kind: Kind, correlation_id: u64, payload: Vec<u8>) -> Self {
        Frame {
            version: VERSION,
            kind,
            flags: Flags::EMPTY,
            priority: 0,
            message_id: random_id(),
            trace_id: random_id(),
            correlation_id,
            payload,
        }
    }

    /// `Call` — no correlation, fresh trace id.
    pub fn call(payload: impl Into<Vec<u8>>) -> Frame {
        Frame::new(Kind::Call, 0, payload.into())
    }

    /// `Notify` — no correlation, fresh trace id.
    pub fn notify(payload: impl Into<Vec<u8>>) -> Frame {
        Frame::new(Kind::Notify, 0, payload.into())
    }

    /// `Response` answering `cause` (typically a `Call`): `correlation_id`
    /// is `cause.message_id`, `trace_id` is inherited from `cause` (§3's
    /// trace_id invariant — every reply shares its cause's trace).
    pub fn response(cause: &Frame, payload: impl Into<Vec<u8>>) -> Frame {
        Frame::respond_to(cause, Kind::Response, payload)
    }

    /// `Error` answering `cause`. See [`Frame::response`].
    pub fn error(cause: &Frame, payload: impl Into<Vec<u8>>) -> Frame {
        Frame::respond_to(cause, Kind::Error, payload)
    }

    /// Build a `Response`/`Error`/any reply frame that propagates the
    /// cause's `trace_id`, with `correlation_id` set to the cause's
    /// `message_id`. This is the form every other reply-shaped factory
    /// helper on this type is built from.
    pub fn respond_to(cause: &Frame, kind: Kind, payload: impl Into<Vec<u8>>) -> Frame {
        Frame {
            version: VERSION,
            kind,
            flags: Flags::EMPTY,
            priority: 0,
            message_id: random_id(),
            trace_id: cause.trace_id,
            correlation_id: cause.message_id,
            payload: payload.into(),
        }
    }

    /// `StreamOpen` — its `message_id` is the stream identifier for the
    /// lifetime of the stream.
    pub fn stream_open(payload: impl Into<Vec<u8>>) -> Frame {
        Frame::new(Kind::StreamOpen, 0, payload.into())
    }

    /// `StreamChunk` correlated to `open.message_id`, propagating `open`'s
    /// `trace_id`.
    pub fn stream_chunk(open: &Frame, payload: impl Into<Vec<u8>>) -> Frame {
        Frame::respond_to(open, Kind::StreamChunk, payload)
    }

    /// `StreamClose` correlated to `open.message_id`, propagating `open`'s
    /// `trace_id`, empty payload.
    pub fn stream_close(open: &Frame) -> Frame {
        Frame::respond_to(open, Kind::StreamClose, Vec::new())
    }

    /// `Ping` — no correlation, empty payload.
    pub fn ping() -> Frame {
        Frame::new(Kind::Ping, 0, Vec::new())
    }

    /// `Pong` answering `ping`: `correlation_id == ping.message_id`,
    /// `trace_id` inherited from `ping`.
    pub fn pong(ping: &Frame) -> Frame {
        Frame::respond_to(ping, Kind::Pong, Vec::new())
    }

    /// True for the three streaming kinds.
    pub fn is_streaming(&self) -> bool {
        matches!(self.kind, Kind::StreamOpen | Kind::StreamChunk | Kind::StreamClose)
    }

    /// True for kinds that expect a reply (`Call`, `Ping`).
    pub fn requires_response(&self) -> bool {
        matches!(self.kind, Kind::Call | Kind::Ping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_has_no_correlation() {
        assert_eq!(Frame::ping().correlation_id, 0);
    }

    #[test]
    fn pong_correlates_and_inherits_trace() {
        let ping = Frame::ping();
        let pong = Frame::pong(&ping);
        assert_eq!(pong.correlation_id, ping.message_id);
        assert_eq!(pong.trace_id, ping.trace_id);
    }

    #[test]
    fn stream_frames_share_correlation_id_and_trace_id() {
        let open = Frame::stream_open(b"hello".to_vec());
        let chunk = Frame::stream_chunk(&open, b"a".to_vec());
        let close = Frame::stream_close(&open);
        assert_eq!(chunk.correlation_id, open.message_id);
        assert_eq!(close.correlation_id, open.message_id);
        assert_eq!(chunk.trace_id, open.trace_id);
        assert_eq!(close.trace_id, open.trace_id);
    }

    #[test]
    fn response_and_error_propagate_the_causes_trace_id() {
        let call = Frame::call(b"hello".to_vec());
        let response = Frame::response(&call, Vec::new());
        let error = Frame::error(&call, Vec::new());
        assert_eq!(response.correlation_id, call.message_id);
        assert_eq!(response.trace_id, call.trace_id);
        assert_eq!(error.correlation_id, call.message_id);
        assert_eq!(error.trace_id, call.trace_id);
    }

    #[test]
    fn is_streaming_matches_exactly_the_stream_kinds() {
        let open = Frame::stream_open(Vec::new());
        assert!(open.is_streaming());
        assert!(Frame::stream_chunk(&open, Vec::new()).is_streaming());
        assert!(Frame::stream_close(&open).is_streaming());
        assert!(!Frame::call(Vec::new()).is_streaming());
        assert!(!Frame::ping().is_streaming());
    }

    #[test]
    fn requires_response_matches_call_and_ping_only() {
        let call = Frame::call(Vec::new());
        assert!(call.requires_response());
        assert!(Frame::ping().requires_response());
        assert!(!Frame::notify(Vec::new()).requires_response());
        assert!(!Frame::response(&call, Vec::new()).requires_response());
    }

    #[test]
    fn kind_round_trips_through_its_wire_byte() {
        for kind in [
            Kind::Call, Kind::Response, Kind::Error, Kind::Notify,
            Kind::StreamOpen, Kind::StreamChunk, Kind::StreamClose,
            Kind::AgentRegister, Kind::AgentDiscover, Kind::AgentHeartbeat,
            Kind::Ping, Kind::Pong,
        ] {
            assert_eq!(Kind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(Kind::from_u8(0x99), None);
    }
}
