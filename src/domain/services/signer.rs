use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum distance between a signature timestamp and the verifier's clock.
pub const SIGNATURE_TOLERANCE_MS: i64 = 5 * 60 * 1000;

/// Timestamped HMAC-SHA256 signatures for outbound webhook bodies.
///
/// The signed message is the decimal millisecond timestamp immediately
/// followed by the exact body bytes. The header value is
/// `t=<timestamp_ms>,v1=<hex digest>`.
pub struct Signer;

impl Signer {
    /// Build the `X-Webhook-Signature` header value.
    pub fn sign(body: &[u8], secret: &str, timestamp_ms: i64) -> String {
        let digest = hex::encode(Self::digest(body, secret, timestamp_ms));
        format!("t={timestamp_ms},v1={digest}")
    }

    /// Verify a header against the current clock.
    pub fn verify(body: &[u8], secret: &str, header: &str) -> bool {
        let now_ms = (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        Self::verify_at(body, secret, header, now_ms)
    }

    /// Verify a header against an explicit clock. Malformed input returns `false`.
    pub fn verify_at(body: &[u8], secret: &str, header: &str, now_ms: i64) -> bool {
        // Step 1: Parse the header; anything unexpected fails closed.
        let Some((timestamp_ms, expected)) = parse_header(header) else {
            return false;
        };

        // Step 2: Reject stale or far-future signatures.
        if now_ms.abs_diff(timestamp_ms) > SIGNATURE_TOLERANCE_MS as u64 {
            return false;
        }

        // Step 3: Recompute and compare in constant time.
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp_ms.to_string().as_bytes());
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }

    fn digest(body: &[u8], secret: &str, timestamp_ms: i64) -> Vec<u8> {
        // HMAC accepts keys of any length, including empty.
        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return Vec::new(),
        };
        mac.update(timestamp_ms.to_string().as_bytes());
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}

fn parse_header(header: &str) -> Option<(i64, Vec<u8>)> {
    let mut timestamp = None;
    let mut digest = None;

    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=')?;
        match key {
            "t" if timestamp.is_none() => timestamp = Some(value.parse::<i64>().ok()?),
            "v1" if digest.is_none() => digest = Some(hex::decode(value).ok()?),
            _ => return None,
        }
    }

    let digest = digest?;
    if digest.len() != 32 {
        return None;
    }
    Some((timestamp?, digest))
}
