//! Base64 prefix matching against raw public-key bytes.

use crate::error::Error;

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// The longest prefix that can constrain a 32-byte key: ceil(256 / 6).
const MAX_PREFIX_CHARS: usize = 43;

/// Word-sized compare for prefixes of at most 64 bits.
#[derive(Debug, Clone, Copy)]
struct FastMask {
    mask: u64,
    target: u64,
}

/// A compiled base64 prefix.
///
/// Each character pins six bits at the most significant end of the byte
/// string, so testing a candidate never allocates or encodes: the first
/// `bits` bits of the raw key are compared directly. Prefixes of up to
/// ten characters collapse to a single masked u64 comparison.
#[derive(Debug, Clone)]
pub struct Base64Prefix {
    text: String,
    /// Decoded prefix bits, MSB-first. 33 bytes cover 43 characters.
    bytes: [u8; 33],
    /// Number of decoded bits, at most 258.
    bits: usize,
    fast: Option<FastMask>,
    /// A 43-character prefix can pin bits past position 255; if any of
    /// those are nonzero no 32-byte string ever matches.
    impossible: bool,
}

impl Base64Prefix {
    /// Compile a prefix. Trailing '=' padding is tolerated; anything
    /// outside the standard alphabet is rejected.
    pub fn new(prefix: &str) -> Result<Self, Error> {
        let trimmed = prefix.trim_end_matches('=');
        if trimmed.is_empty() {
            return Err(Error::InvalidPrefix("prefix is empty".into()));
        }
        if trimmed.len() > MAX_PREFIX_CHARS {
            return Err(Error::InvalidPrefix(format!(
                "prefix longer than {} characters",
                MAX_PREFIX_CHARS
            )));
        }

        let mut bytes = [0u8; 33];
        for (i, c) in trimmed.bytes().enumerate() {
            let value = BASE64_ALPHABET
                .iter()
                .position(|&d| d == c)
                .ok_or_else(|| {
                    Error::InvalidPrefix(format!("invalid base64 character {:?}", c as char))
                })? as u16;

            // Place six bits at offset 6*i from the MSB of byte 0.
            let bit_offset = (6 * i) % 8;
            let byte_index = (6 * i) / 8;
            let spread = value << (10 - bit_offset);
            bytes[byte_index] |= (spread >> 8) as u8;
            bytes[byte_index + 1] |= spread as u8;
        }

        let bits = 6 * trimmed.len();
        let impossible = bits > 256 && bytes[32] != 0;
        let fast = (bits <= 64).then(|| {
            let mut mask_bytes = [0u8; 8];
            for (i, m) in mask_bytes.iter_mut().enumerate() {
                let covered = bits.saturating_sub(8 * i).min(8);
                if covered > 0 {
                    *m = 0xffu8 << (8 - covered);
                }
            }
            let mask = u64::from_le_bytes(mask_bytes);
            let target = u64::from_le_bytes(bytes[..8].try_into().unwrap()) & mask;
            FastMask { mask, target }
        });

        Ok(Self {
            text: trimmed.to_string(),
            bytes,
            bits,
            fast,
            impossible,
        })
    }

    /// Test whether the base64 encoding of `candidate` starts with this
    /// prefix.
    #[inline]
    pub fn matches(&self, candidate: &[u8; 32]) -> bool {
        if let Some(fast) = &self.fast {
            let word = u64::from_le_bytes(candidate[..8].try_into().unwrap());
            return word & fast.mask == fast.target;
        }
        self.matches_general(candidate)
    }

    fn matches_general(&self, candidate: &[u8; 32]) -> bool {
        if self.impossible {
            return false;
        }

        let bits = self.bits.min(256);
        let full = bits / 8;
        let rem = bits % 8;

        if candidate[..full] != self.bytes[..full] {
            return false;
        }
        rem == 0 || (candidate[full] ^ self.bytes[full]) >> (8 - rem) == 0
    }

    /// The prefix as given, without padding.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of public-key bits the prefix pins down.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Expected number of candidates per match: each pinned bit halves
    /// the hit rate.
    pub fn estimated_attempts(&self) -> f64 {
        2f64.powi(self.bits.min(256) as i32)
    }

    /// A human-readable difficulty estimate for the startup banner.
    pub fn difficulty_description(&self) -> String {
        match self.estimated_attempts() {
            x if x <= 1e6 => "Very Easy (< 1 second)".into(),
            x if x <= 1e9 => "Easy (seconds)".into(),
            x if x <= 1e11 => "Medium (minutes)".into(),
            x if x <= 1e13 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    #[test]
    fn matches_encoding_prefixes_of_any_length() {
        let plain: [u8; 32] = *b"Strange women lying in ponds dis";
        let encoded = STANDARD.encode(plain);

        for i in 1..encoded.len() {
            let prefix = &encoded[..i];
            let test = Base64Prefix::new(prefix).unwrap();
            assert!(test.matches(&plain), "prefix {:?}", prefix);
        }
    }

    #[test]
    fn agrees_with_encoder_on_random_inputs() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let mut plain = [0u8; 32];
            rand::Rng::fill(&mut rng, &mut plain[..]);
            let encoded = STANDARD.encode(plain);

            for len in 1..=10 {
                let prefix = &encoded[..len];
                assert!(Base64Prefix::new(prefix).unwrap().matches(&plain));

                // Flip the last character to a guaranteed mismatch.
                let mut wrong = prefix.to_string();
                let last = wrong.pop().unwrap();
                wrong.push(if last == 'A' { 'B' } else { 'A' });
                assert!(!Base64Prefix::new(&wrong).unwrap().matches(&plain));
            }
        }
    }

    #[test]
    fn single_character_is_a_six_bit_prefix() {
        let a = Base64Prefix::new("A").unwrap();
        assert_eq!(a.bits(), 6);
        assert!(a.matches(&block(0b0000_0000)));
        assert!(a.matches(&block(0b0000_0001)));
        assert!(a.matches(&block(0b0000_0011)));
        assert!(!a.matches(&block(0b0000_0100)));

        let b = Base64Prefix::new("B").unwrap();
        assert!(b.matches(&block(0b0000_0100)));
        assert!(b.matches(&block(0b0000_0111)));
        assert!(!b.matches(&block(0b0000_0000)));
        assert!(!b.matches(&block(0b0000_0001)));
    }

    #[test]
    fn two_characters_are_a_twelve_bit_prefix() {
        let ab = Base64Prefix::new("AB").unwrap();
        assert!(ab.matches(&block2(0b0000_0000, 0b0001_0000)));
        assert!(ab.matches(&block2(0b0000_0000, 0b0001_0010)));
        assert!(!ab.matches(&block2(0b0000_0100, 0b0001_0000)));
        assert!(!ab.matches(&block2(0b0000_0000, 0b0010_0000)));
    }

    #[test]
    fn padding_is_ignored() {
        let padded = Base64Prefix::new("QUJ=").unwrap();
        let bare = Base64Prefix::new("QUJ").unwrap();
        assert_eq!(padded.bits(), bare.bits());
        assert_eq!(padded.text(), "QUJ");
    }

    #[test]
    fn long_prefixes_take_the_general_path() {
        // 11 characters = 66 bits, beyond the u64 fast path.
        let plain: [u8; 32] = *b"tributed swords is no basis for!";
        let encoded = STANDARD.encode(plain);
        let test = Base64Prefix::new(&encoded[..11]).unwrap();
        assert!(test.matches(&plain));

        let mut other = plain;
        other[8] ^= 0x80;
        assert!(!test.matches(&other));
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(Base64Prefix::new("").is_err());
        assert!(Base64Prefix::new("=").is_err());
        assert!(Base64Prefix::new("ab cd").is_err());
        assert!(Base64Prefix::new("no-dashes").is_err());
        assert!(Base64Prefix::new(&"A".repeat(44)).is_err());
        assert!(Base64Prefix::new(&"A".repeat(43)).is_ok());
    }

    fn block(first: u8) -> [u8; 32] {
        let mut m = [0u8; 32];
        m[0] = first;
        m
    }

    fn block2(first: u8, second: u8) -> [u8; 32] {
        let mut m = [0u8; 32];
        m[0] = first;
        m[1] = second;
        m
    }
}
