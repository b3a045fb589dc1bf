//! WebSocket frame codec (RFC 6455 subset).
//!
//! ```text
//! byte 0      FIN | RSV1-3 | opcode(4)
//! byte 1      MASK | payload len(7)
//! bytes 2-3   16-bit length when len == 126
//! bytes 2-9   64-bit length when len == 127
//! next 4      mask, when MASK is set
//! rest        payload
//! ```
//!
//! Fragmentation and extensions are not supported. Payloads are capped at
//! [`MAX_PAYLOAD_LENGTH`] in both directions.

use thiserror::Error;

/// Largest payload accepted or produced, far below the 64-bit length range.
pub const MAX_PAYLOAD_LENGTH: usize = 0x2800;

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const OPCODE_BITS: u8 = 0x0F;
const LENGTH_BITS: u8 = 0x7F;
const LENGTH_16: u8 = 126;
const LENGTH_64: u8 = 127;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("payload length is too long: {0}")]
    PayloadTooLarge(u64),
    #[error("frame is truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("unknown opcode: {0:#x}")]
    UnknownOpCode(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl TryFrom<u8> for OpCode {
    type Error = FrameError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            other => Err(FrameError::UnknownOpCode(other)),
        }
    }
}

/// One WebSocket frame together with its wire encoding.
///
/// Outgoing frames are serialized when constructed; decoded frames keep a
/// private copy of the bytes they were read from.
#[derive(Clone, Debug)]
pub struct Frame {
    fin: bool,
    opcode: OpCode,
    mask: Option<[u8; 4]>,
    payload: Vec<u8>,
    encoded: Vec<u8>,
}

impl Frame {
    /// Build an unmasked frame, as a server sends them.
    pub fn new(fin: bool, opcode: OpCode, payload: &[u8]) -> Result<Self, FrameError> {
        Self::build(fin, opcode, None, payload)
    }

    /// Build a masked frame, as a client sends them.
    pub fn masked(
        fin: bool,
        opcode: OpCode,
        payload: &[u8],
        mask: [u8; 4],
    ) -> Result<Self, FrameError> {
        Self::build(fin, opcode, Some(mask), payload)
    }

    pub fn text(payload: &str) -> Result<Self, FrameError> {
        Self::new(true, OpCode::Text, payload.as_bytes())
    }

    pub fn ping(payload: &[u8]) -> Result<Self, FrameError> {
        Self::new(true, OpCode::Ping, payload)
    }

    pub fn close() -> Self {
        Frame {
            fin: true,
            opcode: OpCode::Close,
            mask: None,
            payload: Vec::new(),
            encoded: vec![FIN_BIT | OpCode::Close as u8, 0],
        }
    }

    fn build(
        fin: bool,
        opcode: OpCode,
        mask: Option<[u8; 4]>,
        payload: &[u8],
    ) -> Result<Self, FrameError> {
        let length = payload.len();
        if length > MAX_PAYLOAD_LENGTH {
            return Err(FrameError::PayloadTooLarge(length as u64));
        }

        let mut encoded = Vec::with_capacity(length + 8);

        let mut first = opcode as u8;
        if fin {
            first |= FIN_BIT;
        }
        encoded.push(first);

        let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
        if length < LENGTH_16 as usize {
            encoded.push(mask_bit | length as u8);
        } else {
            encoded.push(mask_bit | LENGTH_16);
            encoded.extend_from_slice(&(length as u16).to_be_bytes());
        }

        let header_len = encoded.len();
        if let Some(mask) = mask {
            encoded.extend_from_slice(&mask);
        }
        encoded.extend_from_slice(payload);

        if let Some(mask) = mask {
            let masked_start = header_len + mask.len();
            apply_mask(&mut encoded[masked_start..], mask);
        }

        Ok(Frame {
            fin,
            opcode,
            mask,
            payload: payload.to_vec(),
            encoded,
        })
    }

    /// Decode the frame at the start of `bytes`, unmasking its payload.
    ///
    /// Trailing bytes past the end of the frame are ignored; use
    /// [`Frame::encoded_len`] to step over them.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let mut cursor = 2;
        require(bytes, cursor)?;

        let fin = bytes[0] & FIN_BIT != 0;
        let opcode = OpCode::try_from(bytes[0] & OPCODE_BITS)?;
        let masked = bytes[1] & MASK_BIT != 0;

        let length = match bytes[1] & LENGTH_BITS {
            LENGTH_16 => {
                require(bytes, cursor + 2)?;
                let length = u16::from_be_bytes([bytes[2], bytes[3]]) as u64;
                cursor += 2;
                length
            }
            LENGTH_64 => {
                require(bytes, cursor + 8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[cursor..cursor + 8]);
                cursor += 8;
                u64::from_be_bytes(raw)
            }
            short => short as u64,
        };

        if length > MAX_PAYLOAD_LENGTH as u64 {
            return Err(FrameError::PayloadTooLarge(length));
        }
        let length = length as usize;

        let mask = if masked {
            require(bytes, cursor + 4)?;
            let mut mask = [0u8; 4];
            mask.copy_from_slice(&bytes[cursor..cursor + 4]);
            cursor += 4;
            Some(mask)
        } else {
            None
        };

        require(bytes, cursor + length)?;
        let mut payload = bytes[cursor..cursor + length].to_vec();
        if let Some(mask) = mask {
            apply_mask(&mut payload, mask);
        }

        Ok(Frame {
            fin,
            opcode,
            mask,
            payload,
            encoded: bytes[..cursor + length].to_vec(),
        })
    }

    pub fn fin(&self) -> bool {
        self.fin
    }

    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    pub fn mask(&self) -> Option<[u8; 4]> {
        self.mask
    }

    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// The unmasked payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The ready-to-send wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    pub fn encoded_len(&self) -> usize {
        self.encoded.len()
    }
}

fn require(bytes: &[u8], needed: usize) -> Result<(), FrameError> {
    if bytes.len() < needed {
        return Err(FrameError::Truncated {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

/// XOR each byte with `mask[i % 4]`. Applying it twice restores the input.
pub fn apply_mask(payload: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MASK: [u8; 4] = [0x37, 0xfa, 0x21, 0x3d];

    fn payload_of(length: usize) -> Vec<u8> {
        (0..length).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn round_trips_across_length_forms() {
        for length in [0, 1, 125, 126, 1000] {
            let payload = payload_of(length);

            let unmasked = Frame::new(true, OpCode::Binary, &payload).unwrap();
            let decoded = Frame::decode(unmasked.as_bytes()).unwrap();
            assert!(decoded.fin());
            assert_eq!(decoded.opcode(), OpCode::Binary);
            assert!(!decoded.is_masked());
            assert_eq!(decoded.payload(), &payload[..]);

            let masked = Frame::masked(false, OpCode::Text, &payload, MASK).unwrap();
            let decoded = Frame::decode(masked.as_bytes()).unwrap();
            assert!(!decoded.fin());
            assert_eq!(decoded.opcode(), OpCode::Text);
            assert_eq!(decoded.mask(), Some(MASK));
            assert_eq!(decoded.payload(), &payload[..]);
            assert_eq!(decoded.encoded_len(), masked.encoded_len());
        }
    }

    #[test]
    fn encodes_rfc_single_frame_examples() {
        let unmasked = Frame::text("Hello").unwrap();
        assert_eq!(
            unmasked.as_bytes(),
            &[0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f]
        );

        let masked = Frame::masked(true, OpCode::Text, b"Hello", MASK).unwrap();
        assert_eq!(
            masked.as_bytes(),
            &[0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58]
        );
    }

    #[test]
    fn uses_sixteen_bit_length_from_126() {
        let frame = Frame::new(true, OpCode::Binary, &payload_of(126)).unwrap();
        assert_eq!(&frame.as_bytes()[..4], &[0x82, 126, 0x00, 126]);
        assert_eq!(frame.encoded_len(), 4 + 126);
    }

    #[test]
    fn masking_twice_restores_payload() {
        let original = b"planning poker".to_vec();
        let mut bytes = original.clone();

        apply_mask(&mut bytes, MASK);
        assert_ne!(bytes, original);
        apply_mask(&mut bytes, MASK);
        assert_eq!(bytes, original);
    }

    #[test]
    fn decode_leaves_source_untouched() {
        let frame = Frame::masked(true, OpCode::Pong, b"Keep alive", MASK).unwrap();
        let source = frame.as_bytes().to_vec();

        let decoded = Frame::decode(&source).unwrap();

        assert_eq!(decoded.payload(), b"Keep alive");
        assert_eq!(source, frame.as_bytes());
    }

    #[test]
    fn rejects_oversized_payloads() {
        let too_big = payload_of(MAX_PAYLOAD_LENGTH + 1);
        assert_eq!(
            Frame::new(true, OpCode::Text, &too_big).unwrap_err(),
            FrameError::PayloadTooLarge(MAX_PAYLOAD_LENGTH as u64 + 1)
        );
        assert!(Frame::new(true, OpCode::Text, &payload_of(MAX_PAYLOAD_LENGTH)).is_ok());
    }

    #[test]
    fn rejects_sixty_four_bit_lengths_beyond_cap() {
        let mut bytes = vec![0x82, 127];
        bytes.extend_from_slice(&(70_000u64).to_be_bytes());

        assert_eq!(
            Frame::decode(&bytes).unwrap_err(),
            FrameError::PayloadTooLarge(70_000)
        );
    }

    #[test]
    fn accepts_small_payload_in_sixty_four_bit_form() {
        let mut bytes = vec![0x81, 127];
        bytes.extend_from_slice(&(2u64).to_be_bytes());
        bytes.extend_from_slice(b"ok");

        let frame = Frame::decode(&bytes).unwrap();
        assert_eq!(frame.payload(), b"ok");
    }

    #[test]
    fn reports_truncated_frames() {
        assert!(matches!(
            Frame::decode(&[0x81]),
            Err(FrameError::Truncated { .. })
        ));
        assert!(matches!(
            Frame::decode(&[0x81, 0x05, b'H']),
            Err(FrameError::Truncated {
                needed: 7,
                available: 3
            })
        ));
    }

    #[test]
    fn rejects_unknown_opcode() {
        assert_eq!(
            Frame::decode(&[0x83, 0x00]).unwrap_err(),
            FrameError::UnknownOpCode(0x3)
        );
    }

    #[test]
    fn close_frame_is_empty() {
        let close = Frame::close();
        assert_eq!(close.as_bytes(), &[0x88, 0x00]);
        assert_eq!(Frame::decode(close.as_bytes()).unwrap().opcode(), OpCode::Close);
    }
}
