//! One-time codes for phone/email verification and password recovery.

use rand::Rng;
use std::fmt;
use subtle::ConstantTimeEq;

/// Number of digits in a one-time code
pub const OTP_LEN: usize = 6;

/// A six-digit one-time code. Compare with [`OtpCode::matches`].
#[derive(Clone)]
pub struct OtpCode([u8; OTP_LEN]);

impl OtpCode {
    /// Parse exactly six ASCII digits and nothing else.
    pub fn parse(input: &str) -> Option<Self> {
        let bytes = input.as_bytes();
        if bytes.len() != OTP_LEN || !bytes.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let mut code = [0u8; OTP_LEN];
        code.copy_from_slice(bytes);
        Some(Self(code))
    }

    /// Draw a uniformly random code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut code = [0u8; OTP_LEN];
        for digit in &mut code {
            *digit = b'0' + rng.gen_range(0..10u8);
        }
        Self(code)
    }

    /// Check a submitted value against this code in constant time.
    pub fn matches(&self, submitted: &str) -> bool {
        match Self::parse(submitted) {
            Some(other) => bool::from(self.0[..].ct_eq(&other.0[..])),
            None => false,
        }
    }

    /// Code digits as text.
    pub fn as_str(&self) -> &str {
        // Constructed only from ASCII digits
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}
