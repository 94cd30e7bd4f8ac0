use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Scheme tag at the start of every encoded hash.
pub const HASH_SCHEME: &str = "sha256";
/// Iterations used for newly created hashes.
pub const DEFAULT_ROUNDS: u32 = 50_000;
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

/// A parsed `sha256$<salt-hex>$<rounds>$<digest-hex>` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: Vec<u8>,
    rounds: u32,
    digest: Vec<u8>,
}

impl PasswordHash {
    /// Hash `password` with a fresh random salt.
    pub fn new(password: &str) -> Self {
        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self::with_salt(password, salt, DEFAULT_ROUNDS)
    }

    pub fn with_salt(password: &str, salt: Vec<u8>, rounds: u32) -> Self {
        let rounds = rounds.max(1);
        let digest = stretch(password, &salt, rounds);
        Self {
            salt,
            rounds,
            digest,
        }
    }

    pub fn parse(encoded: &str) -> Result<Self, String> {
        let mut parts = encoded.trim().split('$');
        let scheme = parts.next().unwrap_or_default();
        if scheme != HASH_SCHEME {
            return Err(format!("unsupported scheme '{scheme}'"));
        }
        let (Some(salt), Some(rounds), Some(digest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err("expected sha256$salt$rounds$digest".to_string());
        };

        let salt = hex_decode(salt).ok_or("salt is not hex")?;
        let rounds: u32 = rounds
            .parse()
            .map_err(|_| format!("rounds '{rounds}' is not a number"))?;
        if rounds == 0 {
            return Err("rounds must be positive".to_string());
        }
        let digest = hex_decode(digest).ok_or("digest is not hex")?;
        if digest.len() != DIGEST_LEN {
            return Err(format!("digest must be {DIGEST_LEN} bytes"));
        }
        Ok(Self {
            salt,
            rounds,
            digest,
        })
    }

    pub fn encode(&self) -> String {
        format!(
            "{HASH_SCHEME}${}${}${}",
            hex_encode_lower(&self.salt),
            self.rounds,
            hex_encode_lower(&self.digest)
        )
    }

    pub fn verify(&self, password: &str) -> bool {
        constant_time_eq(&stretch(password, &self.salt, self.rounds), &self.digest)
    }
}

/// Encoded hash for a new credential entry.
pub fn hash_password(password: &str) -> String {
    PasswordHash::new(password).encode()
}

/// Check `password` against an encoded hash. Unparseable hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    PasswordHash::parse(encoded)
        .map(|hash| hash.verify(password))
        .unwrap_or(false)
}

fn stretch(password: &str, salt: &[u8], rounds: u32) -> Vec<u8> {
    let mut digest = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..rounds {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(salt)
            .chain_update(password.as_bytes())
            .finalize();
    }
    digest.to_vec()
}

pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

pub(crate) fn hex_encode_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len().saturating_mul(2));
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn hex_decode(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}
