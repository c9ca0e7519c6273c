//! All lemonade wire message types.
//!
//! The remote procedure surface has three methods (`open`, `copy`, `paste`)
//! and three kinds of reply.  Requests and replies share one enum so a single
//! codec handles both directions.

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Total size of the common message header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Largest payload accepted on the wire (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

// ── Message type codes ────────────────────────────────────────────────────────

/// Message type codes.  Requests live in `0x01–0x7F`, replies in `0x80–0xFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    OpenRequest = 0x01,
    CopyRequest = 0x02,
    PasteRequest = 0x03,
    Ack = 0x81,
    Text = 0x82,
    Error = 0x8F,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MessageType::OpenRequest),
            0x02 => Ok(MessageType::CopyRequest),
            0x03 => Ok(MessageType::PasteRequest),
            0x81 => Ok(MessageType::Ack),
            0x82 => Ok(MessageType::Text),
            0x8F => Ok(MessageType::Error),
            _ => Err(()),
        }
    }
}

// ── Payload structs ───────────────────────────────────────────────────────────

/// Parameters of the `open` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenParams {
    /// URL to open; for an exposed file this is the `http://127.0.0.1:…` URL.
    pub uri: String,
    /// Rewrite a loopback host in `uri` to the caller's address.
    pub trans_loopback: bool,
}

/// A request or a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcMessage {
    /// `open` request.
    Open(OpenParams),
    /// `copy` request carrying the text to place on the clipboard.
    Copy(String),
    /// `paste` request (no payload).
    Paste,
    /// Successful reply that returns no data.
    Ack,
    /// Successful reply carrying text (answer to `paste`).
    Text(String),
    /// Failed reply; the message is shown to the user verbatim.
    Error(String),
}

impl RpcMessage {
    /// Returns the [`MessageType`] discriminant for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            RpcMessage::Open(_) => MessageType::OpenRequest,
            RpcMessage::Copy(_) => MessageType::CopyRequest,
            RpcMessage::Paste => MessageType::PasteRequest,
            RpcMessage::Ack => MessageType::Ack,
            RpcMessage::Text(_) => MessageType::Text,
            RpcMessage::Error(_) => MessageType::Error,
        }
    }

    /// Returns `true` for `open`, `copy` and `paste`.
    pub fn is_request(&self) -> bool {
        (self.message_type() as u8) < 0x80
    }

    /// Remote method name, used in log lines.
    pub fn method_name(&self) -> &'static str {
        match self {
            RpcMessage::Open(_) => "open",
            RpcMessage::Copy(_) => "copy",
            RpcMessage::Paste => "paste",
            RpcMessage::Ack => "ack",
            RpcMessage::Text(_) => "text",
            RpcMessage::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_byte_round_trip() {
        for ty in [
            MessageType::OpenRequest,
            MessageType::CopyRequest,
            MessageType::PasteRequest,
            MessageType::Ack,
            MessageType::Text,
            MessageType::Error,
        ] {
            assert_eq!(MessageType::try_from(ty as u8), Ok(ty));
        }
    }

    #[test]
    fn test_unknown_type_byte_is_rejected() {
        assert_eq!(MessageType::try_from(0x42), Err(()));
    }

    #[test]
    fn test_requests_and_replies_are_classified() {
        assert!(RpcMessage::Paste.is_request());
        assert!(RpcMessage::Copy("x".into()).is_request());
        assert!(!RpcMessage::Ack.is_request());
        assert!(!RpcMessage::Error("boom".into()).is_request());
    }
}
