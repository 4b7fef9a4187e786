//! Persisted record shapes and the key namespace.
//!
//! Field names and encodings are wire-exact with the store layout this
//! service has always used: user records are camelCase JSON with the hash
//! stored under `password`, referral counters are decimal strings, reset
//! codes are raw strings.

use serde::{Deserialize, Serialize};

pub const VERIFICATION_PREFIX: &str = "verification:";
pub const USER_PREFIX: &str = "user:";
pub const REFERRALS_PREFIX: &str = "referrals:";
pub const RESET_PREFIX: &str = "reset:";
/// Secondary index: referral code -> owner email.
pub const REFCODE_PREFIX: &str = "refcode:";

#[must_use]
pub fn verification_key(email: &str) -> String {
    format!("{VERIFICATION_PREFIX}{email}")
}

#[must_use]
pub fn user_key(email: &str) -> String {
    format!("{USER_PREFIX}{email}")
}

#[must_use]
pub fn referrals_key(email: &str) -> String {
    format!("{REFERRALS_PREFIX}{email}")
}

#[must_use]
pub fn reset_key(email: &str) -> String {
    format!("{RESET_PREFIX}{email}")
}

#[must_use]
pub fn refcode_key(code: &str) -> String {
    format!("{REFCODE_PREFIX}{code}")
}

/// Transient record created by send-code, destroyed by a successful
/// confirmation. Holds the plaintext password until hashing happens at
/// verification time; the latest request for an email wins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingVerification {
    pub code: String,
    pub password: String,
}

/// Registered wait-list member. Created exactly once per email; `position`
/// and `referral_code` never change afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    pub position: u64,
    pub referral_code: String,
    #[serde(default)]
    pub solana_wallet: Option<String>,
    #[serde(default)]
    pub ton_wallet: Option<String>,
}

/// Parse a stored referral counter. Counters are decimal strings; garbage
/// reads as zero rather than wedging the referrer forever.
#[must_use]
pub fn parse_referral_count(raw: &[u8]) -> u32 {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}
