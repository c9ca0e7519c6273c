//! Protocol module containing message types and the binary codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_message, encode_message, payload_len, ProtocolError};
pub use messages::*;
