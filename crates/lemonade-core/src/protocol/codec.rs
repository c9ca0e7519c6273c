//! Binary codec for encoding and decoding lemonade protocol messages.
//!
//! Wire format:
//! ```text
//! [version:1][msg_type:1][reserved:2][payload_len:4][payload:N]
//! ```
//! Total header size: 8 bytes. `payload_len` is big-endian.
//!
//! Payloads:
//!
//! | Message        | Payload                              |
//! |----------------|--------------------------------------|
//! | `Open`         | `[trans_loopback:1][uri: UTF-8]`     |
//! | `Copy`         | text, UTF-8                          |
//! | `Paste`, `Ack` | empty                                |
//! | `Text`         | text, UTF-8                          |
//! | `Error`        | message, UTF-8                       |

use thiserror::Error;

use crate::protocol::messages::{
    MessageType, OpenParams, RpcMessage, HEADER_SIZE, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION,
};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type byte in the header is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The protocol version in the header is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The payload could not be parsed (bad flag byte, UTF-8 error, etc.).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The payload exceeds [`MAX_PAYLOAD_SIZE`].
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`RpcMessage`] into a byte vector including the 8-byte header.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] when the payload does not fit
/// the frame limit.
///
/// # Examples
///
/// ```rust
/// use lemonade_core::protocol::{decode_message, encode_message, RpcMessage};
///
/// let msg = RpcMessage::Copy("hello".to_string());
/// let bytes = encode_message(&msg).unwrap();
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &RpcMessage) -> Result<Vec<u8>, ProtocolError> {
    let payload = encode_payload(msg);
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.push(PROTOCOL_VERSION);
    buf.push(msg.message_type() as u8);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Validates a header and returns the payload length it declares.
///
/// Stream readers call this after reading [`HEADER_SIZE`] bytes to learn how
/// many more bytes to read before calling [`decode_message`].
///
/// # Errors
///
/// Returns [`ProtocolError`] for a short header, an unknown version or type,
/// or a declared length above [`MAX_PAYLOAD_SIZE`].
pub fn payload_len(header: &[u8]) -> Result<usize, ProtocolError> {
    if header.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: header.len(),
        });
    }

    if header[0] != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(header[0]));
    }
    MessageType::try_from(header[1]).map_err(|_| ProtocolError::UnknownMessageType(header[1]))?;

    // header[2..4] is reserved and ignored on decode.
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    Ok(len)
}

/// Decodes one [`RpcMessage`] from the beginning of `bytes`.
///
/// Returns the decoded message and the number of bytes consumed (header +
/// payload) so the caller can advance its read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] when `bytes` does not yet hold
/// a complete frame, and other variants for malformed frames.
pub fn decode_message(bytes: &[u8]) -> Result<(RpcMessage, usize), ProtocolError> {
    let len = payload_len(bytes)?;
    let total_needed = HEADER_SIZE + len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::InsufficientData {
            needed: total_needed,
            available: bytes.len(),
        });
    }

    // Already validated by `payload_len`.
    let msg_type = MessageType::try_from(bytes[1])
        .map_err(|_| ProtocolError::UnknownMessageType(bytes[1]))?;
    let msg = decode_payload(msg_type, &bytes[HEADER_SIZE..total_needed])?;
    Ok((msg, total_needed))
}

// ── Payload encoding ──────────────────────────────────────────────────────────

fn encode_payload(msg: &RpcMessage) -> Vec<u8> {
    match msg {
        RpcMessage::Open(params) => {
            let mut buf = Vec::with_capacity(1 + params.uri.len());
            buf.push(u8::from(params.trans_loopback));
            buf.extend_from_slice(params.uri.as_bytes());
            buf
        }
        RpcMessage::Copy(text) | RpcMessage::Text(text) | RpcMessage::Error(text) => {
            text.as_bytes().to_vec()
        }
        RpcMessage::Paste | RpcMessage::Ack => Vec::new(),
    }
}

// ── Payload decoding ──────────────────────────────────────────────────────────

fn decode_payload(msg_type: MessageType, payload: &[u8]) -> Result<RpcMessage, ProtocolError> {
    match msg_type {
        MessageType::OpenRequest => decode_open(payload).map(RpcMessage::Open),
        MessageType::CopyRequest => decode_utf8(payload).map(RpcMessage::Copy),
        MessageType::PasteRequest => expect_empty(payload, RpcMessage::Paste),
        MessageType::Ack => expect_empty(payload, RpcMessage::Ack),
        MessageType::Text => decode_utf8(payload).map(RpcMessage::Text),
        MessageType::Error => decode_utf8(payload).map(RpcMessage::Error),
    }
}

fn decode_open(payload: &[u8]) -> Result<OpenParams, ProtocolError> {
    let (&flag, uri) = payload.split_first().ok_or(ProtocolError::InsufficientData {
        needed: 1,
        available: 0,
    })?;
    let trans_loopback = match flag {
        0 => false,
        1 => true,
        other => {
            return Err(ProtocolError::MalformedPayload(format!(
                "invalid trans_loopback flag: {other}"
            )))
        }
    };
    Ok(OpenParams {
        uri: decode_utf8(uri)?,
        trans_loopback,
    })
}

fn decode_utf8(bytes: &[u8]) -> Result<String, ProtocolError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ProtocolError::MalformedPayload(format!("invalid UTF-8: {e}")))
}

fn expect_empty(payload: &[u8], msg: RpcMessage) -> Result<RpcMessage, ProtocolError> {
    if payload.is_empty() {
        Ok(msg)
    } else {
        Err(ProtocolError::MalformedPayload(format!(
            "{} carries no payload, got {} bytes",
            msg.method_name(),
            payload.len()
        )))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout_for_copy() {
        // Arrange / Act
        let bytes = encode_message(&RpcMessage::Copy("hi".into())).unwrap();

        // Assert
        assert_eq!(bytes[0], PROTOCOL_VERSION);
        assert_eq!(bytes[1], 0x02);
        assert_eq!(&bytes[2..4], &[0, 0]);
        assert_eq!(&bytes[4..8], &2u32.to_be_bytes());
        assert_eq!(&bytes[8..], b"hi");
    }

    #[test]
    fn test_open_payload_starts_with_flag_byte() {
        let bytes = encode_message(&RpcMessage::Open(OpenParams {
            uri: "http://x".into(),
            trans_loopback: true,
        }))
        .unwrap();
        assert_eq!(bytes[HEADER_SIZE], 1);
        assert_eq!(&bytes[HEADER_SIZE + 1..], b"http://x");
    }

    #[test]
    fn test_paste_and_ack_have_empty_payload() {
        assert_eq!(encode_message(&RpcMessage::Paste).unwrap().len(), HEADER_SIZE);
        assert_eq!(encode_message(&RpcMessage::Ack).unwrap().len(), HEADER_SIZE);
    }

    #[test]
    fn test_decode_short_header_is_insufficient_data() {
        let result = decode_message(&[PROTOCOL_VERSION, 0x02, 0]);
        assert_eq!(
            result,
            Err(ProtocolError::InsufficientData {
                needed: HEADER_SIZE,
                available: 3
            })
        );
    }

    #[test]
    fn test_decode_truncated_payload_is_insufficient_data() {
        // Arrange
        let bytes = encode_message(&RpcMessage::Text("hello world".into())).unwrap();

        // Act
        let result = decode_message(&bytes[..bytes.len() - 3]);

        // Assert
        assert!(matches!(result, Err(ProtocolError::InsufficientData { .. })));
    }

    #[test]
    fn test_decode_rejects_wrong_version() {
        let mut bytes = encode_message(&RpcMessage::Ack).unwrap();
        bytes[0] = 0x7F;
        assert_eq!(
            decode_message(&bytes),
            Err(ProtocolError::UnsupportedVersion(0x7F))
        );
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let mut bytes = encode_message(&RpcMessage::Ack).unwrap();
        bytes[1] = 0x55;
        assert_eq!(
            decode_message(&bytes),
            Err(ProtocolError::UnknownMessageType(0x55))
        );
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let mut bytes = encode_message(&RpcMessage::Copy("ab".into())).unwrap();
        bytes[HEADER_SIZE] = 0xFF;
        assert!(matches!(
            decode_message(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_open_flag() {
        let mut bytes = encode_message(&RpcMessage::Open(OpenParams {
            uri: "x".into(),
            trans_loopback: false,
        }))
        .unwrap();
        bytes[HEADER_SIZE] = 7;
        assert!(matches!(
            decode_message(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_rejects_payload_on_ack() {
        let bytes = [PROTOCOL_VERSION, 0x81, 0, 0, 0, 0, 0, 1, b'x'];
        assert!(matches!(
            decode_message(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_payload_len_rejects_oversize_declaration() {
        let mut header = [PROTOCOL_VERSION, 0x02, 0, 0, 0, 0, 0, 0];
        header[4..8].copy_from_slice(&((MAX_PAYLOAD_SIZE as u32) + 1).to_be_bytes());
        assert!(matches!(
            payload_len(&header),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_oversize_payload() {
        let huge = "a".repeat(MAX_PAYLOAD_SIZE + 1);
        assert!(matches!(
            encode_message(&RpcMessage::Copy(huge)),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_decode_reports_consumed_length_with_trailing_bytes() {
        // Arrange: a frame followed by the start of the next one
        let mut buf = encode_message(&RpcMessage::Paste).unwrap();
        let first_len = buf.len();
        buf.extend_from_slice(&encode_message(&RpcMessage::Ack).unwrap()[..3]);

        // Act
        let (msg, consumed) = decode_message(&buf).unwrap();

        // Assert
        assert_eq!(msg, RpcMessage::Paste);
        assert_eq!(consumed, first_len);
    }
}
