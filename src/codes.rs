//! One-time and referral code generation.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of the public referral token.
pub const REFERRAL_CODE_LEN: usize = 8;

/// 6-digit verification/reset code, uniform over `100000..=999999`.
///
/// No uniqueness guarantee; codes are scoped to one email and the latest
/// request wins.
#[must_use]
pub fn numeric_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// 8-character referral code over `[A-Za-z0-9]`, independent per character.
///
/// Collision handling is the registry's job: it checks the referral-code
/// index and regenerates on a hit.
#[must_use]
pub fn referral_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_code_is_six_digits_in_range() {
        for _ in 0..200 {
            let code = numeric_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn referral_code_is_eight_alphanumerics() {
        for _ in 0..200 {
            let code = referral_code();
            assert_eq!(code.len(), REFERRAL_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn referral_codes_vary() {
        let a = referral_code();
        let b = referral_code();
        let c = referral_code();
        // Three identical draws from a 62^8 space means a broken RNG.
        assert!(!(a == b && b == c));
    }
}
