//! Expiring, url-bound link signatures.
//!
//! A link signature is the HMAC-SHA256 of `"{url}:{exp}"` under the process
//! secret, hex encoded and truncated to 16 characters (64 bits). The short
//! form keeps buffer links compact; 64 bits is still far out of reach for an
//! online forger who has to round-trip every guess through the server.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of an issued link.
pub const LINK_TTL_SECS: i64 = 600;

/// Hex characters kept from the digest.
pub const SIGNATURE_LEN: usize = 16;

/// A minted buffer link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLink {
    pub target_url: String,
    /// Unix seconds.
    pub expires_at: i64,
    pub signature: String,
}

#[derive(Clone)]
pub struct LinkSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for LinkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSigner").finish_non_exhaustive()
    }
}

impl LinkSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn sign(&self, url: &str, exp: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC-SHA256 accepts any key length");
        mac.update(url.as_bytes());
        mac.update(b":");
        mac.update(exp.as_bytes());

        let mut signature = hex::encode(mac.finalize().into_bytes());
        signature.truncate(SIGNATURE_LEN);
        signature
    }

    pub fn issue(&self, url: &str) -> SignedLink {
        self.issue_at(url, Utc::now().timestamp())
    }

    pub fn issue_at(&self, url: &str, now: i64) -> SignedLink {
        let expires_at = now + LINK_TTL_SECS;
        SignedLink {
            target_url: url.to_string(),
            expires_at,
            signature: self.sign(url, &expires_at.to_string()),
        }
    }

    /// Check a redeemed link.
    ///
    /// `exp` is signed exactly as received, so `0600` and `600` are different
    /// links. Plain string equality is used for the signature: the threat is
    /// link forgery, and response timing over the network does not leak
    /// enough to matter at this signature length.
    pub fn verify(&self, url: &str, exp: &str, sig: &str) -> bool {
        self.verify_at(url, exp, sig, Utc::now().timestamp())
    }

    pub fn verify_at(&self, url: &str, exp: &str, sig: &str, now: i64) -> bool {
        let Ok(expires_at) = exp.parse::<i64>() else {
            return false;
        };
        if now > expires_at {
            return false;
        }
        self.sign(url, exp) == sig
    }
}
