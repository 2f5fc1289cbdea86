use anyhow::{anyhow, Result};
use base32::Alphabet;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha1 = Hmac<Sha1>;

const DIGITS: u32 = 6;
const TIME_STEP: u64 = 30;

/// Generate the one-time-password code for the current 30-second window.
///
/// # Errors
/// Returns an error if the secret is empty or not valid base32, or if the
/// system clock is before the unix epoch.
pub fn totp_now(secret: &str) -> Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    totp_at(secret, now)
}

/// Generate the one-time-password code for an explicit unix timestamp.
///
/// Pure function of (secret, time): the same pair always produces the same
/// code, so a displayed code and a submitted code agree within one window.
///
/// # Errors
/// Returns an error if the secret is empty or not valid base32.
pub fn totp_at(secret: &str, unix_time: u64) -> Result<String> {
    let key = decode_secret(secret)?;

    hotp(&key, unix_time / TIME_STEP)
}

/// Decode a base32 shared secret (RFC 4648 alphabet, optional padding).
fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let trimmed = secret.trim_end_matches('=');

    if trimmed.is_empty() {
        return Err(anyhow!("OTP secret is empty"));
    }

    base32::decode(Alphabet::Rfc4648 { padding: false }, trimmed)
        .ok_or_else(|| anyhow!("OTP secret is not valid base32"))
}

// RFC 4226 dynamic truncation over HMAC-SHA-1
fn hotp(key: &[u8], counter: u64) -> Result<String> {
    let mut mac =
        HmacSha1::new_from_slice(key).map_err(|e| anyhow!("Error keying HMAC: {}", e))?;
    mac.update(&counter.to_be_bytes());

    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    let code = binary % 10u32.pow(DIGITS);

    Ok(format!("{code:0width$}", width = DIGITS as usize))
}
