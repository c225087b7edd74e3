use crate::error::DecodeError;
use crate::packet::Packet;
use std::fmt;

/// Parse a decimal integer with C `atoi` leniency.
///
/// Leading whitespace (as C `isspace` sees it, so vertical tab included) and
/// one sign are accepted, then the longest run of digits is taken and anything
/// after it ignored. No digits means 0, not an error. Values outside `i64`
/// saturate.
pub fn lenient_decimal(text: &[u8]) -> i64 {
    let start = text
        .iter()
        .position(|&b| !(b.is_ascii_whitespace() || b == 0x0B))
        .unwrap_or(text.len());
    let mut rest = &text[start..];

    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    rest.iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0i64, |value, &b| {
            let digit = i64::from(b - b'0');
            if negative {
                value.saturating_mul(10).saturating_sub(digit)
            } else {
                value.saturating_mul(10).saturating_add(digit)
            }
        })
}

/// Decode the numeric value carried in a response packet.
pub fn decode_numeric(packet: &[u8]) -> i64 {
    packet.get(1..).map(lenient_decimal).unwrap_or(0)
}

/// Copy the payload of `packet` into `dest` and return it as text.
///
/// Exactly `packet.len() - 1` bytes are copied and `dest[packet.len() - 1]` is
/// zeroed, so `dest` must hold at least `packet.len()` bytes. On error `dest`
/// is left untouched.
pub fn decode_string_into<'a>(packet: &[u8], dest: &'a mut [u8]) -> Result<&'a str, DecodeError> {
    let needed = packet.len().max(1);
    if dest.len() < needed {
        return Err(DecodeError::BufferTooSmall {
            needed,
            available: dest.len(),
        });
    }

    let payload = packet.get(1..).unwrap_or_default();
    dest[..payload.len()].copy_from_slice(payload);
    dest[payload.len()] = 0;

    let end = dest.iter().position(|&b| b == 0).unwrap_or(payload.len());
    std::str::from_utf8(&dest[..end]).map_err(|e| DecodeError::InvalidText {
        offset: e.valid_up_to(),
    })
}

/// Decode the payload of `packet` as an owned string.
pub fn decode_string(packet: &[u8]) -> Result<String, DecodeError> {
    let mut dest = vec![0u8; packet.len().max(1)];
    decode_string_into(packet, &mut dest).map(str::to_owned)
}

/// A response frame read back from the device after a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    packet: Packet,
}

impl Response {
    pub fn new(packet: Packet) -> Self {
        Self { packet }
    }

    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    pub fn into_packet(self) -> Packet {
        self.packet
    }

    /// Payload bytes up to the first zero.
    pub fn payload(&self) -> &[u8] {
        self.packet.payload_text_bytes()
    }

    /// True when the device answered with an empty payload.
    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }

    /// Lenient numeric value; see [`lenient_decimal`].
    pub fn numeric(&self) -> i64 {
        decode_numeric(&self.packet)
    }

    /// Strict numeric value: the whole payload must be a decimal integer.
    pub fn parse_numeric(&self) -> Result<i64, DecodeError> {
        let text = self.text()?;
        let parsed = text.trim().parse::<i64>();
        parsed.map_err(|_| DecodeError::NotNumeric { text })
    }

    pub fn text(&self) -> Result<String, DecodeError> {
        decode_string(&self.packet)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.payload()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(payload: &[u8]) -> Response {
        let mut frame = vec![0x01];
        frame.extend_from_slice(payload);
        Response::new(Packet::from_received(&frame, 8))
    }

    #[test]
    fn test_lenient_decimal() {
        assert_eq!(lenient_decimal(b"255"), 255);
        assert_eq!(lenient_decimal(b"  42xyz"), 42);
        assert_eq!(lenient_decimal(b"-17"), -17);
        assert_eq!(lenient_decimal(b"+8"), 8);
        assert_eq!(lenient_decimal(b"0012\0\0"), 12);
        assert_eq!(lenient_decimal(b"ABC"), 0);
        assert_eq!(lenient_decimal(b""), 0);
        assert_eq!(lenient_decimal(b"-"), 0);
    }

    #[test]
    fn test_lenient_decimal_skips_c_whitespace() {
        assert_eq!(lenient_decimal(b"\x0B5"), 5);
        assert_eq!(lenient_decimal(b"\t\n\x0C\r -3"), -3);
        assert_eq!(lenient_decimal(b"\x0B"), 0);
    }

    #[test]
    fn test_lenient_decimal_saturates() {
        assert_eq!(lenient_decimal(b"99999999999999999999999"), i64::MAX);
        assert_eq!(lenient_decimal(b"-99999999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_decode_numeric_ignores_marker() {
        assert_eq!(decode_numeric(&[0x01, b'2', b'5', b'5', 0, 0, 0, 0]), 255);
        assert_eq!(decode_numeric(&[0x01, b'X', b'1', 0, 0, 0, 0, 0]), 0);
        assert_eq!(decode_numeric(&[0x01]), 0);
        assert_eq!(decode_numeric(&[]), 0);
    }

    #[test]
    fn test_decode_string_into_writes_terminator() {
        let packet = [0x01, b'1', b'2', b'3', b'4', b'5', b'6', b'7'];
        let mut dest = [0xAAu8; 10];
        let text = decode_string_into(&packet, &mut dest).unwrap();
        assert_eq!(text, "1234567");
        assert_eq!(dest[7], 0);
        assert_eq!(&dest[8..], &[0xAA, 0xAA]);
    }

    #[test]
    fn test_decode_string_into_too_small() {
        let packet = [0x01, b'1', 0, 0, 0, 0, 0, 0];
        let mut dest = [0xAAu8; 7];
        assert_eq!(
            decode_string_into(&packet, &mut dest),
            Err(DecodeError::BufferTooSmall { needed: 8, available: 7 })
        );
        assert_eq!(dest, [0xAA; 7]);
    }

    #[test]
    fn test_decode_string_invalid_text() {
        let packet = [0x01, b'o', b'k', 0xFF, 0, 0, 0, 0];
        assert_eq!(decode_string(&packet), Err(DecodeError::InvalidText { offset: 2 }));
    }

    #[test]
    fn test_response_views() {
        let r = response(b"1");
        assert_eq!(r.numeric(), 1);
        assert_eq!(r.parse_numeric(), Ok(1));
        assert_eq!(r.text().unwrap(), "1");
        assert_eq!(r.to_string(), "1");
        assert!(!r.is_empty());
    }

    #[test]
    fn test_response_strict_parse_rejects_garbage() {
        let r = response(b"12ab");
        assert_eq!(r.numeric(), 12);
        assert_eq!(
            r.parse_numeric(),
            Err(DecodeError::NotNumeric {
                text: "12ab".to_string()
            })
        );
    }

    #[test]
    fn test_empty_response() {
        let r = response(b"");
        assert!(r.is_empty());
        assert_eq!(r.numeric(), 0);
        assert!(r.parse_numeric().is_err());
    }
}
