// Hash computation and checksum verification

use crate::error::Error;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

/// Hash algorithm types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Get the algorithm prefix for formatted output
    pub fn prefix(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "sha1" => Some(HashAlgorithm::Sha1),
            "sha256" => Some(HashAlgorithm::Sha256),
            "sha512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Infer the algorithm from a bare hex digest's length.
    fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(HashAlgorithm::Sha1),
            64 => Some(HashAlgorithm::Sha256),
            128 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

/// Hex digest of `data`.
pub fn hex_digest(data: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
    }
}

/// Compute hash of data and return formatted string (e.g., "sha1:abc123...")
#[cfg(test)]
pub fn compute_hash(data: &[u8], algorithm: HashAlgorithm) -> String {
    format!("{}:{}", algorithm.prefix(), hex_digest(data, algorithm))
}

/// Split an expected checksum into algorithm and hex digest.
///
/// Accepts "algorithm:hex" or a bare hex digest, whose algorithm is inferred from its length.
pub fn parse_hash(expected: &str) -> Option<(HashAlgorithm, String)> {
    let expected = expected.trim();
    if let Some((prefix, hex)) = expected.split_once(':') {
        let algorithm = HashAlgorithm::from_prefix(&prefix.to_ascii_lowercase())?;
        return Some((algorithm, hex.to_ascii_lowercase()));
    }
    HashAlgorithm::from_hex_len(expected.len()).map(|a| (a, expected.to_ascii_lowercase()))
}

/// Check `data` against `expected`. An unrecognised checksum format counts as a mismatch.
pub fn verify(name: &str, data: &[u8], expected: &str) -> Result<(), Error> {
    let Some((algorithm, expected_hex)) = parse_hash(expected) else {
        return Err(Error::ChecksumMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: "<unsupported checksum format>".to_string(),
        });
    };

    let actual = hex_digest(data, algorithm);
    if actual != expected_hex {
        return Err(Error::ChecksumMismatch {
            name: name.to_string(),
            expected: format!("{}:{}", algorithm.prefix(), expected_hex),
            actual: format!("{}:{}", algorithm.prefix(), actual),
        });
    }
    Ok(())
}
