//! Credential hashing and verification
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 digests next to a per-record
//! random salt. Both fields are lowercase hex in the "User" metadata.
//!
//! The salt is generated as `salt_bytes` random bytes and hex-encoded; the
//! PBKDF2 salt input is the ASCII text of that hex string, which is how every
//! existing record in the table was produced.

use std::ffi::OsStr;

use log::debug;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::config::AuthConfig;
use crate::error::CredentialError;

/// Iteration count used for every record created by this crate.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Random salt length before hex encoding (32 bytes = 64 hex chars).
pub const DEFAULT_SALT_BYTES: usize = 32;

/// Smallest salt the hasher will generate.
pub const MIN_SALT_BYTES: usize = 32;

/// Upper bound on a stored iteration count, as a multiple of the configured one.
pub const MAX_ITERATION_FACTOR: u32 = 10;

/// SHA-256 output length.
const DIGEST_LEN: usize = 32;

/// Salt used for the throwaway derivation when an account does not exist.
const DUMMY_SALT: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Hash and salt produced for a new credential record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedCredential {
    pub hash: String,
    pub salt: String,
}

/// Persisted credential fields needed to check a login attempt.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub identifier: String,
    pub password_hash: String,
    pub salt: String,
    /// Iteration count stored with the record; `None` means the configured one.
    pub iterations: Option<u32>,
}

impl CredentialRecord {
    /// Verifies `password` using the record's own iteration count when present.
    ///
    /// A stored count below the configured one, or more than
    /// [`MAX_ITERATION_FACTOR`] times it, is treated as corrupt and rejected
    /// without hashing.
    pub fn verify(&self, hasher: &PasswordHasher, password: &str) -> bool {
        match self.iterations {
            Some(n) if !hasher.accepts_stored_iterations(n) => {
                debug!(
                    "Credential for {} stores an out-of-range iteration count {}",
                    self.identifier, n
                );
                false
            }
            Some(n) => hasher
                .with_iterations(n)
                .verify(password, &self.password_hash, &self.salt),
            None => hasher.verify(password, &self.password_hash, &self.salt),
        }
    }
}

/// PBKDF2-HMAC-SHA256 hasher with a fixed iteration count and salt size.
///
/// Cheap to copy and free of shared state, so a single instance can be used
/// from any number of threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    iterations: u32,
    salt_bytes: usize,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            salt_bytes: DEFAULT_SALT_BYTES,
        }
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32, salt_bytes: usize) -> Result<Self, CredentialError> {
        if iterations == 0 {
            return Err(CredentialError::InvalidParams(
                "iteration count must be greater than 0".into(),
            ));
        }
        if salt_bytes < MIN_SALT_BYTES {
            return Err(CredentialError::InvalidParams(format!(
                "salt must be at least {} bytes, got {}",
                MIN_SALT_BYTES, salt_bytes
            )));
        }
        Ok(Self {
            iterations,
            salt_bytes,
        })
    }

    /// Builds the hasher from the configured iteration count and salt size.
    pub fn from_config(config: &AuthConfig) -> Result<Self, CredentialError> {
        Self::new(config.iterations, config.salt_bytes)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn salt_bytes(&self) -> usize {
        self.salt_bytes
    }

    /// Whether a per-record iteration count lies in
    /// `[iterations, iterations * MAX_ITERATION_FACTOR]`.
    pub fn accepts_stored_iterations(&self, stored: u32) -> bool {
        stored >= self.iterations && stored <= self.iterations.saturating_mul(MAX_ITERATION_FACTOR)
    }

    /// Same salt size, different iteration count. A zero count is kept as-is
    /// and therefore rejects everything.
    pub fn with_iterations(&self, iterations: u32) -> Self {
        Self {
            iterations,
            salt_bytes: self.salt_bytes,
        }
    }

    /// Generates a fresh salt and derives the hash for `password`.
    pub fn derive(&self, password: &str) -> Result<DerivedCredential, CredentialError> {
        let salt = generate_salt(self.salt_bytes)?;
        Ok(self.derive_with_salt(password, &salt))
    }

    /// Like [`derive`](Self::derive) for passwords taken from argv or the
    /// environment, which are not guaranteed to be UTF-8.
    pub fn derive_os(&self, password: &OsStr) -> Result<DerivedCredential, CredentialError> {
        let password = password.to_str().ok_or_else(|| {
            CredentialError::Encoding("password is not valid UTF-8".into())
        })?;
        self.derive(password)
    }

    /// Derives the hash for `password` under an existing salt.
    pub fn derive_with_salt(&self, password: &str, salt: &str) -> DerivedCredential {
        let digest = pbkdf2_digest(password.as_bytes(), salt.as_bytes(), self.iterations);
        DerivedCredential {
            hash: hex::encode(digest),
            salt: salt.to_string(),
        }
    }

    /// Returns `true` only when `password` reproduces `stored_hash` under `salt`.
    ///
    /// Malformed stored data is reported as a mismatch, never as an error.
    pub fn verify(&self, password: &str, stored_hash: &str, salt: &str) -> bool {
        match self.check(password, stored_hash, salt) {
            Ok(matched) => matched,
            Err(e) => {
                debug!("Rejecting credential: {}", e);
                false
            }
        }
    }

    /// Runs one derivation whose result is discarded, so a missing account
    /// costs the same as a wrong password.
    pub fn burn(&self, password: &str) {
        let _ = pbkdf2_digest(password.as_bytes(), DUMMY_SALT.as_bytes(), self.iterations);
    }

    fn check(&self, password: &str, stored_hash: &str, salt: &str) -> Result<bool, CredentialError> {
        if self.iterations == 0 {
            return Err(CredentialError::InvalidParams("zero iteration count".into()));
        }
        let salt_len = hex::decode(salt)
            .map_err(|e| {
                CredentialError::MalformedStoredData(format!("salt is not hexadecimal: {}", e))
            })?
            .len();
        if salt_len < MIN_SALT_BYTES {
            return Err(CredentialError::MalformedStoredData(format!(
                "salt is {} bytes, expected at least {}",
                salt_len, MIN_SALT_BYTES
            )));
        }
        let expected = hex::decode(stored_hash).map_err(|e| {
            CredentialError::MalformedStoredData(format!("hash is not hexadecimal: {}", e))
        })?;
        if expected.len() != DIGEST_LEN {
            return Err(CredentialError::MalformedStoredData(format!(
                "hash is {} bytes, expected {}",
                expected.len(),
                DIGEST_LEN
            )));
        }

        let actual = pbkdf2_digest(password.as_bytes(), salt.as_bytes(), self.iterations);
        Ok(constant_time_eq(&actual, &expected))
    }
}

fn pbkdf2_digest(password: &[u8], salt: &[u8], iterations: u32) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    out
}

fn generate_salt(bytes: usize) -> Result<String, CredentialError> {
    let mut salt = vec![0u8; bytes];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CredentialError::Entropy(e.to_string()))?;
    Ok(hex::encode(salt))
}

/// Constant-time byte comparison to prevent timing attacks.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(1_000, DEFAULT_SALT_BYTES).unwrap()
    }

    #[test]
    fn derive_then_verify_round_trips() {
        let hasher = fast_hasher();
        let cred = hasher.derive("Tr0ub4dor&3").unwrap();
        assert!(hasher.verify("Tr0ub4dor&3", &cred.hash, &cred.salt));
    }

    #[test]
    fn verify_is_case_sensitive() {
        let hasher = fast_hasher();
        let cred = hasher.derive("Tr0ub4dor&3").unwrap();
        assert!(!hasher.verify("tr0ub4dor&3", &cred.hash, &cred.salt));
    }

    #[test]
    fn different_password_is_rejected() {
        let hasher = fast_hasher();
        let cred = hasher.derive("correct horse").unwrap();
        assert!(!hasher.verify("battery staple", &cred.hash, &cred.salt));
        assert!(!hasher.verify("", &cred.hash, &cred.salt));
    }

    #[test]
    fn salts_are_unique_per_derivation() {
        let hasher = fast_hasher();
        let first = hasher.derive("same-password").unwrap();
        let second = hasher.derive("same-password").unwrap();
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn output_is_lowercase_hex_of_expected_length() {
        let hasher = fast_hasher();
        let cred = hasher.derive("pw").unwrap();
        assert_eq!(cred.salt.len(), DEFAULT_SALT_BYTES * 2);
        assert_eq!(cred.hash.len(), DIGEST_LEN * 2);
        let is_lower_hex = |s: &str| s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));
        assert!(is_lower_hex(&cred.salt));
        assert!(is_lower_hex(&cred.hash));
    }

    #[test]
    fn verify_is_stable_across_calls() {
        let hasher = fast_hasher();
        let cred = hasher.derive("stable").unwrap();
        let results: Vec<bool> = (0..3)
            .map(|_| hasher.verify("stable", &cred.hash, &cred.salt))
            .collect();
        assert_eq!(results, vec![true, true, true]);
    }

    #[test]
    fn corrupt_hash_or_salt_rejects_instead_of_failing() {
        let hasher = fast_hasher();
        let cred = hasher.derive("pw").unwrap();
        assert!(!hasher.verify("pw", "not-hex", &cred.salt));
        assert!(!hasher.verify("pw", &cred.hash, "not-hex"));
        assert!(!hasher.verify("pw", &cred.hash, ""));
        assert!(!hasher.verify("pw", &cred.hash[..32], &cred.salt));
    }

    #[test]
    fn short_salt_is_rejected_even_when_digest_matches() {
        let hasher = fast_hasher();
        let almost = "ab".repeat(MIN_SALT_BYTES - 1);
        for salt in ["00", almost.as_str()] {
            let cred = hasher.derive_with_salt("pw", salt);
            assert!(!hasher.verify("pw", &cred.hash, salt));
        }
        let salt = "ab".repeat(MIN_SALT_BYTES);
        let cred = hasher.derive_with_salt("pw", &salt);
        assert!(hasher.verify("pw", &cred.hash, &salt));
    }

    #[test]
    fn uppercase_stored_hash_still_matches() {
        let hasher = fast_hasher();
        let cred = hasher.derive("pw").unwrap();
        assert!(hasher.verify("pw", &cred.hash.to_uppercase(), &cred.salt));
    }

    #[test]
    fn iteration_mismatch_rejects() {
        let hasher = fast_hasher();
        let cred = hasher.derive("pw").unwrap();
        assert!(!hasher.with_iterations(1_001).verify("pw", &cred.hash, &cred.salt));
        assert!(!hasher.with_iterations(0).verify("pw", &cred.hash, &cred.salt));
    }

    #[test]
    fn matches_records_written_at_production_cost() {
        // Digest of "Tr0ub4dor&3" under a 64-char salt at 100,000 iterations.
        let hasher = PasswordHasher::default();
        let salt = "a".repeat(64);
        let hash = "5ce184051a36b592aa1862de3a1a1a8877aee0062341dc2a8939de6db3f79d6f";
        assert!(hasher.verify("Tr0ub4dor&3", hash, &salt));
        assert!(!hasher.verify("tr0ub4dor&3", hash, &salt));
        assert_eq!(hasher.derive_with_salt("Tr0ub4dor&3", &salt).hash, hash);
    }

    #[test]
    fn pbkdf2_known_answers() {
        assert_eq!(
            hex::encode(pbkdf2_digest(b"password", b"salt", 1)),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
        assert_eq!(
            hex::encode(pbkdf2_digest(b"password", b"salt", 4096)),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn rejects_weak_parameters() {
        assert!(matches!(
            PasswordHasher::new(0, DEFAULT_SALT_BYTES),
            Err(CredentialError::InvalidParams(_))
        ));
        assert!(matches!(
            PasswordHasher::new(DEFAULT_ITERATIONS, 16),
            Err(CredentialError::InvalidParams(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_password_is_an_encoding_error() {
        use std::os::unix::ffi::OsStrExt;

        let hasher = fast_hasher();
        let bad = OsStr::from_bytes(&[0x66, 0x6f, 0xff, 0x6f]);
        assert!(matches!(hasher.derive_os(bad), Err(CredentialError::Encoding(_))));
        assert!(hasher.derive_os(OsStr::new("fine")).is_ok());
    }

    #[test]
    fn record_uses_its_own_iteration_count() {
        let hasher = fast_hasher();
        let cred = hasher.with_iterations(2_000).derive("pw").unwrap();
        let record = CredentialRecord {
            identifier: "analyst1".into(),
            password_hash: cred.hash.clone(),
            salt: cred.salt.clone(),
            iterations: Some(2_000),
        };
        assert!(record.verify(&hasher, "pw"));

        let unpinned = CredentialRecord {
            iterations: None,
            ..record.clone()
        };
        assert!(!unpinned.verify(&hasher, "pw"));

        let zeroed = CredentialRecord {
            iterations: Some(0),
            ..record
        };
        assert!(!zeroed.verify(&hasher, "pw"));
    }

    #[test]
    fn out_of_range_record_iterations_are_rejected() {
        let hasher = fast_hasher();

        let weak = hasher.with_iterations(1).derive("pw").unwrap();
        let record = CredentialRecord {
            identifier: "trader1".into(),
            password_hash: weak.hash,
            salt: weak.salt,
            iterations: Some(1),
        };
        assert!(!record.verify(&hasher, "pw"));

        // Would take hours if it were hashed.
        let huge = CredentialRecord {
            iterations: Some(4_000_000_000),
            ..record
        };
        assert!(!huge.verify(&hasher, "pw"));

        assert!(hasher.accepts_stored_iterations(1_000));
        assert!(hasher.accepts_stored_iterations(10_000));
        assert!(!hasher.accepts_stored_iterations(10_001));
        assert!(!hasher.accepts_stored_iterations(999));
    }

    #[test]
    fn hasher_is_shareable_across_threads() {
        let hasher = fast_hasher();
        let cred = hasher.derive("threaded").unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cred = cred.clone();
                std::thread::spawn(move || hasher.verify("threaded", &cred.hash, &cred.salt))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
