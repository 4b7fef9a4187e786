//! One-way credential hashing.
//!
//! Passwords are Argon2id-hashed into PHC strings. Verification reads the
//! algorithm parameters back out of the stored string, so hashes written
//! under an older cost factor keep verifying after the default changes.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("credential hashing failed: {0}")]
pub struct CredentialError(String);

/// Hash a plaintext password with a fresh random salt.
pub fn hash(plaintext: &SecretString) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| CredentialError(err.to_string()))
}

/// Check a plaintext password against a stored PHC hash.
///
/// A malformed stored hash verifies as `false` rather than erroring; the
/// caller cannot distinguish it from a wrong password, which is the point.
#[must_use]
pub fn verify(plaintext: &SecretString, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plaintext.expose_secret().as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{Algorithm, Params, Version};

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn hash_then_verify_round_trip() {
        let hashed = hash(&secret("Passw0rd!")).unwrap();
        assert!(verify(&secret("Passw0rd!"), &hashed));
        assert!(!verify(&secret("passw0rd!"), &hashed));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash(&secret("same")).unwrap();
        let b = hash(&secret("same")).unwrap();
        assert_ne!(a, b);
        assert!(verify(&secret("same"), &a));
        assert!(verify(&secret("same"), &b));
    }

    #[test]
    fn verify_accepts_other_cost_factors() {
        // Hash produced under a deliberately cheap parameter set; verify
        // must read the parameters from the PHC string, not assume ours.
        let params = Params::new(8, 1, 1, None).unwrap();
        let cheap = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let hashed = cheap
            .hash_password(b"Passw0rd!", &salt)
            .unwrap()
            .to_string();

        assert!(verify(&secret("Passw0rd!"), &hashed));
        assert!(!verify(&secret("other"), &hashed));
    }

    #[test]
    fn malformed_stored_hash_fails_closed() {
        assert!(!verify(&secret("anything"), "not-a-phc-string"));
    }
}
