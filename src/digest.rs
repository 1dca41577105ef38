//! Reference keyed digest (HMAC-SHA1).

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{Error, Result};
use crate::types::Digest;

/// Output length of HMAC-SHA1 in bytes.
pub const HMAC_SHA1_LEN: usize = 20;

type HmacSha1 = Hmac<Sha1>;

/// Compute HMAC-SHA1 of `message` under `secret`.
///
/// Never fails: if the primitive cannot be initialised the empty digest is
/// returned, which callers treat as "not yet computed".
pub fn compute(secret: &[u8], message: &[u8]) -> Digest {
    match try_compute(secret, message) {
        Ok(digest) => digest,
        Err(e) => {
            tracing::warn!("HMAC calculation failed: {}", e);
            Digest::empty()
        }
    }
}

/// Fallible form of [`compute`].
pub fn try_compute(secret: &[u8], message: &[u8]) -> Result<Digest> {
    let mut mac = <HmacSha1 as Mac>::new_from_slice(secret).map_err(|_| Error::DigestUnavailable)?;
    mac.update(message);
    Ok(Digest::from(mac.finalize().into_bytes().to_vec()))
}
