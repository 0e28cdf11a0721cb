//! Encoding detection and decoding
//!
//! Sniffs the character encoding of a raw markup stream from its first 4
//! bytes (BOMs plus the `<?xm` signature in every octet order, per the XML
//! spec's Appendix F), then honours an `encoding="..."` declaration found
//! in the prefix before the first `>` when the sniffed form is
//! ASCII-transparent or the CP037 EBCDIC page used by the PDF toolchain.
//!
//! Decoding converts the whole input to a `String` up front; the tokenizer
//! then pulls decoded characters one at a time.

use crate::error::{Error, Result};
use log::debug;
use memchr::memchr;

/// A character encoding this crate can sniff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Be,
    Utf16Le,
    Ucs4Be,
    Ucs4Le,
    /// UCS-4, unusual octet order 2143. Detected but not decodable.
    Ucs4Order2143,
    /// UCS-4, unusual octet order 3412. Detected but not decodable.
    Ucs4Order3412,
    Latin1,
    Ascii,
    /// EBCDIC code page 037.
    Cp037,
}

impl Encoding {
    /// Canonical name of this encoding.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Ucs4Be | Encoding::Ucs4Le | Encoding::Ucs4Order2143 | Encoding::Ucs4Order3412 => {
                "ISO-10646-UCS-4"
            }
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Ascii => "US-ASCII",
            Encoding::Cp037 => "CP037",
        }
    }

    /// Map a declared encoding label to a supported encoding.
    ///
    /// Matching is case-insensitive and accepts the common aliases.
    pub fn from_label(label: &str) -> Option<Encoding> {
        match label.to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Some(Encoding::Utf8),
            "UTF-16" | "UTF-16BE" | "UNICODEBIG" | "UNICODEBIGUNMARKED" => Some(Encoding::Utf16Be),
            "UTF-16LE" | "UNICODELITTLE" | "UNICODELITTLEUNMARKED" => Some(Encoding::Utf16Le),
            "ISO-10646-UCS-4" | "UCS-4" | "UTF-32" | "UTF-32BE" => Some(Encoding::Ucs4Be),
            "UTF-32LE" => Some(Encoding::Ucs4Le),
            "ISO-8859-1" | "ISO8859-1" | "ISO8859_1" | "LATIN1" | "L1" => Some(Encoding::Latin1),
            "US-ASCII" | "ASCII" => Some(Encoding::Ascii),
            "CP037" | "IBM037" | "EBCDIC-CP-US" => Some(Encoding::Cp037),
            _ => None,
        }
    }
}

/// Sniff the encoding from the first 4 bytes of the stream.
///
/// Fails with `TruncatedStream` when fewer than 4 bytes are available;
/// this is a hard precondition of the byte-level API, not a recoverable
/// condition.
pub fn sniff(input: &[u8]) -> Result<Encoding> {
    if input.len() < 4 {
        return Err(Error::TruncatedStream);
    }
    let (b0, b1, b2, b3) = (input[0], input[1], input[2], input[3]);

    let encoding = match (b0, b1, b2, b3) {
        // Byte order marks
        (0x00, 0x00, 0xFE, 0xFF) => Encoding::Ucs4Be,
        (0xFF, 0xFE, 0x00, 0x00) => Encoding::Ucs4Le,
        (0xFE, 0xFF, _, _) => Encoding::Utf16Be,
        (0xFF, 0xFE, _, _) => Encoding::Utf16Le,
        (0xEF, 0xBB, 0xBF, _) => Encoding::Utf8,
        // '<' of a declaration in each UCS-4 octet order
        (0x00, 0x00, 0x00, 0x3C) => Encoding::Ucs4Be,
        (0x3C, 0x00, 0x00, 0x00) => Encoding::Ucs4Le,
        (0x00, 0x00, 0x3C, 0x00) => Encoding::Ucs4Order2143,
        (0x00, 0x3C, 0x00, 0x00) => Encoding::Ucs4Order3412,
        // '<?' in UTF-16 without a BOM
        (0x00, 0x3C, 0x00, 0x3F) => Encoding::Utf16Be,
        (0x3C, 0x00, 0x3F, 0x00) => Encoding::Utf16Le,
        // '<?xm' in EBCDIC CP037
        (0x4C, 0x6F, 0xA7, 0x94) => Encoding::Cp037,
        _ => Encoding::Utf8,
    };
    Ok(encoding)
}

/// Detect the effective encoding of the input.
///
/// Sniffs the first 4 bytes, then scans for a declared encoding when the
/// sniffed form allows reading the declaration prefix byte-by-byte.
pub fn detect(input: &[u8]) -> Result<Encoding> {
    let sniffed = sniff(input)?;

    // The declaration is only reachable byte-by-byte when '<' and '>' are
    // single bytes: ASCII-transparent UTF-8 and the CP037 EBCDIC page.
    let gt = match sniffed {
        Encoding::Utf8 => b'>',
        Encoding::Cp037 => 0x6E, // '>' in CP037
        _ => {
            debug!("sniffed encoding {} (no declaration scan)", sniffed.name());
            return Ok(sniffed);
        }
    };

    let declared = memchr(gt, input)
        .map(|end| decode_with(sniffed, &input[..end]))
        .transpose()?
        .and_then(|prefix| declared_encoding(&prefix));

    match declared {
        Some(label) => {
            let encoding = Encoding::from_label(&label)
                .ok_or(Error::UnsupportedEncoding(label.clone()))?;
            debug!("sniffed {} overridden by declared {}", sniffed.name(), label);
            Ok(encoding)
        }
        None => {
            debug!("sniffed encoding {}", sniffed.name());
            Ok(sniffed)
        }
    }
}

/// Decode an entire raw byte stream to a `String`, honouring the sniffed
/// encoding and any declared override.
pub fn decode(input: &[u8]) -> Result<String> {
    let encoding = detect(input)?;
    decode_with(encoding, input)
}

/// Extract the value of an `encoding="..."` or `encoding='...'`
/// declaration from a decoded prefix.
///
/// Quote matching: take the first `"` and the first `'` after the
/// `encoding` keyword; whichever appears first and has a matching closing
/// quote of the same kind delimits the value. Ambiguity (equal positions
/// or no valid pair) means no override.
fn declared_encoding(decl: &str) -> Option<String> {
    let idx = decl.find("encoding")?;
    let rest = &decl[idx..];
    let dq = rest.find('"');
    let sq = rest.find('\'');
    if dq == sq {
        return None; // both None is the only way they can be equal
    }

    let single_first = match (dq, sq) {
        (None, Some(_)) => true,
        (Some(_), None) => false,
        (Some(d), Some(s)) => s < d,
        (None, None) => return None,
    };

    let (quote, open) = if single_first {
        ('\'', sq.unwrap())
    } else {
        ('"', dq.unwrap())
    };
    let body = &rest[open + 1..];
    let close = body.find(quote)?;
    Some(body[..close].to_string())
}

/// Decode bytes with a specific encoding, skipping any leading BOM.
fn decode_with(encoding: Encoding, input: &[u8]) -> Result<String> {
    match encoding {
        Encoding::Utf8 => {
            let input = input.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(input);
            String::from_utf8(input.to_vec()).map_err(|_| Error::MalformedInput("UTF-8"))
        }
        Encoding::Utf16Be => decode_utf16(input, &[0xFE, 0xFF], u16::from_be_bytes),
        Encoding::Utf16Le => decode_utf16(input, &[0xFF, 0xFE], u16::from_le_bytes),
        Encoding::Ucs4Be => decode_ucs4(input, &[0x00, 0x00, 0xFE, 0xFF], u32::from_be_bytes),
        Encoding::Ucs4Le => decode_ucs4(input, &[0xFF, 0xFE, 0x00, 0x00], u32::from_le_bytes),
        Encoding::Ucs4Order2143 | Encoding::Ucs4Order3412 => Err(Error::UnsupportedEncoding(
            "ISO-10646-UCS-4 (unusual octet order)".to_string(),
        )),
        Encoding::Latin1 => Ok(input.iter().map(|&b| b as char).collect()),
        Encoding::Ascii => {
            if input.is_ascii() {
                Ok(input.iter().map(|&b| b as char).collect())
            } else {
                Err(Error::MalformedInput("US-ASCII"))
            }
        }
        Encoding::Cp037 => Ok(input
            .iter()
            .map(|&b| char::from_u32(u32::from(CP037_TO_UNICODE[b as usize])).unwrap_or('\u{FFFD}'))
            .collect()),
    }
}

fn decode_utf16(input: &[u8], bom: &[u8], from_bytes: fn([u8; 2]) -> u16) -> Result<String> {
    let bytes = input.strip_prefix(bom).unwrap_or(input);
    if bytes.len() % 2 != 0 {
        return Err(Error::MalformedInput("UTF-16"));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| from_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| Error::MalformedInput("UTF-16"))
}

fn decode_ucs4(input: &[u8], bom: &[u8], from_bytes: fn([u8; 4]) -> u32) -> Result<String> {
    let bytes = input.strip_prefix(bom).unwrap_or(input);
    if bytes.len() % 4 != 0 {
        return Err(Error::MalformedInput("ISO-10646-UCS-4"));
    }
    bytes
        .chunks_exact(4)
        .map(|c| {
            char::from_u32(from_bytes([c[0], c[1], c[2], c[3]]))
                .ok_or(Error::MalformedInput("ISO-10646-UCS-4"))
        })
        .collect()
}

/// CP037 (EBCDIC) to Unicode, one entry per byte value.
#[rustfmt::skip]
const CP037_TO_UNICODE: [u16; 256] = [
    0x0000, 0x0001, 0x0002, 0x0003, 0x009C, 0x0009, 0x0086, 0x007F,
    0x0097, 0x008D, 0x008E, 0x000B, 0x000C, 0x000D, 0x000E, 0x000F,
    0x0010, 0x0011, 0x0012, 0x0013, 0x009D, 0x0085, 0x0008, 0x0087,
    0x0018, 0x0019, 0x0092, 0x008F, 0x001C, 0x001D, 0x001E, 0x001F,
    0x0080, 0x0081, 0x0082, 0x0083, 0x0084, 0x000A, 0x0017, 0x001B,
    0x0088, 0x0089, 0x008A, 0x008B, 0x008C, 0x0005, 0x0006, 0x0007,
    0x0090, 0x0091, 0x0016, 0x0093, 0x0094, 0x0095, 0x0096, 0x0004,
    0x0098, 0x0099, 0x009A, 0x009B, 0x0014, 0x0015, 0x009E, 0x001A,
    0x0020, 0x00A0, 0x00E2, 0x00E4, 0x00E0, 0x00E1, 0x00E3, 0x00E5,
    0x00E7, 0x00F1, 0x00A2, 0x002E, 0x003C, 0x0028, 0x002B, 0x007C,
    0x0026, 0x00E9, 0x00EA, 0x00EB, 0x00E8, 0x00ED, 0x00EE, 0x00EF,
    0x00EC, 0x00DF, 0x0021, 0x0024, 0x002A, 0x0029, 0x003B, 0x00AC,
    0x002D, 0x002F, 0x00C2, 0x00C4, 0x00C0, 0x00C1, 0x00C3, 0x00C5,
    0x00C7, 0x00D1, 0x00A6, 0x002C, 0x0025, 0x005F, 0x003E, 0x003F,
    0x00F8, 0x00C9, 0x00CA, 0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF,
    0x00CC, 0x0060, 0x003A, 0x0023, 0x0040, 0x0027, 0x003D, 0x0022,
    0x00D8, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067,
    0x0068, 0x0069, 0x00AB, 0x00BB, 0x00F0, 0x00FD, 0x00FE, 0x00B1,
    0x00B0, 0x006A, 0x006B, 0x006C, 0x006D, 0x006E, 0x006F, 0x0070,
    0x0071, 0x0072, 0x00AA, 0x00BA, 0x00E6, 0x00B8, 0x00C6, 0x00A4,
    0x00B5, 0x007E, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077, 0x0078,
    0x0079, 0x007A, 0x00A1, 0x00BF, 0x00D0, 0x00DD, 0x00DE, 0x00AE,
    0x005E, 0x00A3, 0x00A5, 0x00B7, 0x00A9, 0x00A7, 0x00B6, 0x00BC,
    0x00BD, 0x00BE, 0x005B, 0x005D, 0x00AF, 0x00A8, 0x00B4, 0x00D7,
    0x007B, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047,
    0x0048, 0x0049, 0x00AD, 0x00F4, 0x00F6, 0x00F2, 0x00F3, 0x00F5,
    0x007D, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F, 0x0050,
    0x0051, 0x0052, 0x00B9, 0x00FB, 0x00FC, 0x00F9, 0x00FA, 0x00FF,
    0x005C, 0x00F7, 0x0053, 0x0054, 0x0055, 0x0056, 0x0057, 0x0058,
    0x0059, 0x005A, 0x00B2, 0x00D4, 0x00D6, 0x00D2, 0x00D3, 0x00D5,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037,
    0x0038, 0x0039, 0x00B3, 0x00DB, 0x00DC, 0x00D9, 0x00DA, 0x009F,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_needs_four_bytes() {
        assert!(matches!(sniff(b"<r>"), Err(Error::TruncatedStream)));
        assert!(sniff(b"<r/>").is_ok());
    }

    #[test]
    fn test_sniff_boms() {
        assert_eq!(sniff(&[0xFE, 0xFF, 0x00, 0x3C]).unwrap(), Encoding::Utf16Be);
        assert_eq!(sniff(&[0xFF, 0xFE, 0x3C, 0x00]).unwrap(), Encoding::Utf16Le);
        assert_eq!(sniff(&[0xEF, 0xBB, 0xBF, 0x3C]).unwrap(), Encoding::Utf8);
        assert_eq!(sniff(&[0x00, 0x00, 0xFE, 0xFF]).unwrap(), Encoding::Ucs4Be);
        assert_eq!(sniff(&[0xFF, 0xFE, 0x00, 0x00]).unwrap(), Encoding::Ucs4Le);
    }

    #[test]
    fn test_sniff_unmarked_patterns() {
        assert_eq!(sniff(&[0x00, 0x3C, 0x00, 0x3F]).unwrap(), Encoding::Utf16Be);
        assert_eq!(sniff(&[0x3C, 0x00, 0x3F, 0x00]).unwrap(), Encoding::Utf16Le);
        assert_eq!(sniff(&[0x00, 0x00, 0x00, 0x3C]).unwrap(), Encoding::Ucs4Be);
        assert_eq!(sniff(&[0x3C, 0x00, 0x00, 0x00]).unwrap(), Encoding::Ucs4Le);
        assert_eq!(sniff(&[0x00, 0x00, 0x3C, 0x00]).unwrap(), Encoding::Ucs4Order2143);
        assert_eq!(sniff(&[0x00, 0x3C, 0x00, 0x00]).unwrap(), Encoding::Ucs4Order3412);
        assert_eq!(sniff(&[0x4C, 0x6F, 0xA7, 0x94]).unwrap(), Encoding::Cp037);
        assert_eq!(sniff(b"<roo").unwrap(), Encoding::Utf8);
    }

    #[test]
    fn test_declared_encoding_override() {
        let input = br#"<?xml version="1.0" encoding="ISO-8859-1"?><r/>"#;
        assert_eq!(detect(input).unwrap(), Encoding::Latin1);
    }

    #[test]
    fn test_declared_encoding_single_quotes() {
        let input = b"<?xml version='1.0' encoding='UTF-8'?><r/>";
        assert_eq!(detect(input).unwrap(), Encoding::Utf8);
    }

    #[test]
    fn test_no_declaration_keeps_sniffed() {
        assert_eq!(detect(b"<root>x</root>").unwrap(), Encoding::Utf8);
    }

    #[test]
    fn test_unknown_declared_encoding() {
        let input = br#"<?xml encoding="Shift_JIS"?><r/>"#;
        assert!(matches!(
            detect(input),
            Err(Error::UnsupportedEncoding(label)) if label == "Shift_JIS"
        ));
    }

    #[test]
    fn test_declared_encoding_quote_rules() {
        // First quote kind wins when both present
        assert_eq!(
            declared_encoding(r#"<?xml encoding='a"b'?"#),
            Some("a\"b".to_string())
        );
        // Unclosed quote: no override
        assert_eq!(declared_encoding("<?xml encoding=\"abc?"), None);
        // No quotes at all
        assert_eq!(declared_encoding("<?xml encoding=abc?"), None);
        // No keyword
        assert_eq!(declared_encoding("<?xml version=\"1.0\"?"), None);
    }

    #[test]
    fn test_decode_utf16_le() {
        let mut bytes = vec![0xFF, 0xFE];
        for b in b"<r/>" {
            bytes.push(*b);
            bytes.push(0x00);
        }
        assert_eq!(decode(&bytes).unwrap(), "<r/>");
    }

    #[test]
    fn test_decode_utf16_be_unmarked() {
        let mut bytes = Vec::new();
        for b in b"<?xml?><r/>" {
            bytes.push(0x00);
            bytes.push(*b);
        }
        assert_eq!(decode(&bytes).unwrap(), "<?xml?><r/>");
    }

    #[test]
    fn test_decode_latin1_via_declaration() {
        let mut bytes = b"<?xml encoding=\"ISO-8859-1\"?><r>".to_vec();
        bytes.push(0xE9); // e-acute in Latin-1, invalid as UTF-8
        bytes.extend_from_slice(b"</r>");
        let decoded = decode(&bytes).unwrap();
        assert!(decoded.contains('\u{e9}'));
    }

    #[test]
    fn test_decode_cp037() {
        // "<?xml?>" plus a letter in CP037
        let bytes = [0x4C, 0x6F, 0xA7, 0x94, 0x93, 0x6F, 0x6E];
        assert_eq!(decode(&bytes).unwrap(), "<?xml?>");
    }

    #[test]
    fn test_decode_utf8_bom_stripped() {
        let bytes = [0xEF, 0xBB, 0xBF, b'<', b'r', b'/', b'>'];
        assert_eq!(decode(&bytes).unwrap(), "<r/>");
    }

    #[test]
    fn test_decode_unusual_ucs4_order_unsupported() {
        let bytes = [0x00, 0x00, 0x3C, 0x00, 0x00, 0x00, 0x3F, 0x00];
        assert!(matches!(decode(&bytes), Err(Error::UnsupportedEncoding(_))));
    }
}
