//! Minimal validating Base64 codec.
//!
//! Just enough to round-trip the small JSON status document through the
//! contents API, not a general-purpose library. Decoding is strict: the
//! 4-byte group structure and the alphabet are validated, and anything
//! malformed returns a typed error instead of best-effort garbage.

use crate::error::DecodeError;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const PAD: u8 = b'=';

/// Encode `input` with standard padding.
pub fn encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);
    for chunk in input.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);

        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        if chunk.len() > 1 {
            out.push(ALPHABET[(((b1 & 0x0F) << 2) | (b2 >> 6)) as usize] as char);
        } else {
            out.push(PAD as char);
        }
        if chunk.len() > 2 {
            out.push(ALPHABET[(b2 & 0x3F) as usize] as char);
        } else {
            out.push(PAD as char);
        }
    }
    out
}

fn sextet(b: u8) -> Result<u8, DecodeError> {
    match b {
        b'A'..=b'Z' => Ok(b - b'A'),
        b'a'..=b'z' => Ok(b - b'a' + 26),
        b'0'..=b'9' => Ok(b - b'0' + 52),
        b'+' => Ok(62),
        b'/' => Ok(63),
        _ => Err(DecodeError::BadCharacter),
    }
}

/// Decode standard padded Base64.
///
/// ASCII whitespace is skipped first — the contents API wraps its payload at
/// 60 columns with embedded newlines. After stripping, the length must be a
/// multiple of 4 and padding may only occupy the last two positions.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    let cleaned: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if cleaned.len() % 4 != 0 {
        return Err(DecodeError::BadLength);
    }

    let mut out = Vec::with_capacity(cleaned.len() / 4 * 3);
    let groups = cleaned.len() / 4;

    for (i, group) in cleaned.chunks_exact(4).enumerate() {
        let last = i + 1 == groups;
        let pad = group.iter().rev().take_while(|&&b| b == PAD).count();

        // Padding is only legal at the very end, one or two bytes of it.
        if pad > 0 && !last {
            return Err(DecodeError::BadCharacter);
        }
        if pad > 2 || group[..4 - pad].contains(&PAD) {
            return Err(DecodeError::BadCharacter);
        }

        let s0 = sextet(group[0])?;
        let s1 = sextet(group[1])?;
        out.push((s0 << 2) | (s1 >> 4));
        if pad < 2 {
            let s2 = sextet(group[2])?;
            out.push((s1 << 4) | (s2 >> 2));
            if pad < 1 {
                let s3 = sextet(group[3])?;
                out.push((s2 << 6) | s3);
            }
        }
    }

    Ok(out)
}
