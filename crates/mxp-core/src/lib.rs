//! MXP wire codec: the 64-byte framed header, payload checksum, and typed
//! frame value shared by every higher layer of this workspace.

mod codec;
mod error;
mod frame;
mod hash;

pub use codec::{decode, decode_header, encode, encode_header, FrameHeader, HEADER_LEN};
pub use error::DecodeError;
pub use frame::{Flags, Frame, Kind, MAX_PAYLOAD_LEN, VERSION};
pub use hash::{checksum, random_id};
