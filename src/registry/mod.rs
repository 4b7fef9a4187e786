//! Wait-list registry: the registration/verification/referral state
//! machine over the key-value store.
//!
//! Benign results (bad email, unknown user, wrong code) come back as enum
//! variants; `Err` is reserved for dependency failures (store I/O,
//! exhausted delivery, hashing), which callers report as internal errors.
//!
//! Concurrency: the store serializes individual key operations but there
//! are no multi-key transactions. `confirm_verification` is the one
//! operation with a read-then-write invariant (position = user count + 1,
//! referral counter increment), so it serializes behind a registry-level
//! mutex; everything else runs unserialized.

pub mod models;

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::codes;
use crate::credentials::{self, CredentialError};
use crate::notifier::{deliver, DeliveryError, Message, Notifier, RetryPolicy};
use crate::store::{KeyValueStore, StoreError};

use models::{
    parse_referral_count, refcode_key, referrals_key, reset_key, user_key, verification_key,
    PendingVerification, User, REFERRALS_PREFIX, USER_PREFIX,
};

/// Referral counters never exceed this; later referrals are dropped.
pub const MAX_REFERRALS: u32 = 20;

/// Attempts to draw an unused referral code before giving up.
const REFERRAL_CODE_ATTEMPTS: u32 = 16;

/// Advisory wallet length bounds; violations are logged, never rejected.
const SOLANA_WALLET_LEN: std::ops::RangeInclusive<usize> = 42..=44;
const TON_WALLET_LEN: std::ops::RangeInclusive<usize> = 46..=48;

/// Hard failures. Everything user-addressable is an outcome variant, not
/// an error.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("stored record {key} is corrupted: {source}")]
    CorruptRecord {
        key: String,
        source: serde_json::Error,
    },

    #[error("could not allocate an unused referral code")]
    ReferralCodesExhausted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    /// Pending record persisted and code delivered.
    CodeSent,
    InvalidEmail,
    AlreadyRegistered,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Verified(VerifiedRegistration),
    InvalidOrExpiredCode,
}

/// Result of a successful confirmation: the member's queue position and
/// their own referral link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedRegistration {
    pub position: u64,
    pub referral_link: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletUpdate {
    Updated,
    UserNotFound,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authentication {
    Authenticated(AccountSummary),
    UserNotFound,
    InvalidCredentials,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSummary {
    pub position: u64,
    pub solana_wallet: Option<String>,
    pub ton_wallet: Option<String>,
    pub referral_link: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResetRequest {
    CodeSent,
    UserNotFound,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResetCodeCheck {
    Valid,
    InvalidOrExpiredCode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResetCompletion {
    PasswordChanged,
    UserNotFound,
}

/// Aggregate view: total members plus per-referrer counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferralSnapshot {
    pub total_users: u64,
    pub referrals: BTreeMap<String, u32>,
}

/// Email sanity check: something before `@`, something after, a dot in
/// the domain.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// The wait-list registry. Store and notifier are injected handles; there
/// is no process-wide state, so tests run against an in-memory store.
pub struct Waitlist {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
    referral_base: Url,
    /// Serializes count-then-create and the counter increment.
    confirm_lock: Mutex<()>,
}

impl Waitlist {
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        referral_base: Url,
    ) -> Self {
        Self {
            store,
            notifier,
            retry: RetryPolicy::default(),
            referral_base,
            confirm_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Issue a verification code for a new registration.
    ///
    /// The pending record is persisted before delivery is attempted: an
    /// exhausted delivery leaves a valid, undelivered code that a repeat
    /// request overwrites.
    pub async fn request_verification(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Registration, RegistryError> {
        if !valid_email(email) {
            return Ok(Registration::InvalidEmail);
        }

        if self.store.get(&user_key(email))?.is_some() {
            debug!(email, "verification requested for registered email");
            return Ok(Registration::AlreadyRegistered);
        }

        let code = codes::numeric_code();
        let pending = PendingVerification {
            code: code.clone(),
            password: password.expose_secret().to_string(),
        };
        self.store
            .put(&verification_key(email), &encode(&pending))?;
        debug!(email, "stored pending verification");

        deliver(
            self.notifier.as_ref(),
            &verification_message(email, &code),
            self.retry,
        )
        .await?;

        Ok(Registration::CodeSent)
    }

    /// Consume a verification code, creating the user and crediting the
    /// referrer when a referral token resolves.
    pub async fn confirm_verification(
        &self,
        email: &str,
        submitted_code: &str,
        referral_token: Option<&str>,
    ) -> Result<Confirmation, RegistryError> {
        let _guard = self.confirm_lock.lock().await;

        let Some(pending) = self.load_pending(email)? else {
            return Ok(Confirmation::InvalidOrExpiredCode);
        };
        if pending.code != submitted_code {
            return Ok(Confirmation::InvalidOrExpiredCode);
        }

        let password_hash = credentials::hash(&SecretString::from(pending.password))?;
        let position = self.total_user_count()? + 1;
        let referral_code = self.unused_referral_code()?;

        let user = User {
            email: email.to_string(),
            password_hash,
            position,
            referral_code: referral_code.clone(),
            solana_wallet: None,
            ton_wallet: None,
        };
        self.store.put(&user_key(email), &encode(&user))?;
        self.store
            .put(&refcode_key(&referral_code), email.as_bytes())?;
        info!(email, position, referral_code, "user registered");

        if let Some(token) = referral_token.filter(|t| !t.is_empty() && *t != email) {
            self.credit_referral(token)?;
        }

        self.store.delete(&verification_key(email))?;

        Ok(Confirmation::Verified(VerifiedRegistration {
            position,
            referral_link: self.referral_link(&referral_code),
        }))
    }

    /// Attach wallet addresses. Provided, non-blank values overwrite the
    /// stored ones after trimming; blank or absent inputs leave existing
    /// values untouched. There is no way to clear a wallet on this path.
    pub fn submit_wallet(
        &self,
        email: &str,
        solana_wallet: Option<&str>,
        ton_wallet: Option<&str>,
    ) -> Result<WalletUpdate, RegistryError> {
        let Some(mut user) = self.load_user(email)? else {
            return Ok(WalletUpdate::UserNotFound);
        };

        if let Some(address) = trimmed(solana_wallet) {
            if !SOLANA_WALLET_LEN.contains(&address.len()) {
                warn!(email, address, "unexpected Solana wallet length");
            }
            user.solana_wallet = Some(address.to_string());
        }
        if let Some(address) = trimmed(ton_wallet) {
            if !TON_WALLET_LEN.contains(&address.len()) {
                warn!(email, address, "unexpected TON wallet length");
            }
            user.ton_wallet = Some(address.to_string());
        }

        self.store.put(&user_key(email), &encode(&user))?;
        debug!(email, "stored wallet addresses");
        Ok(WalletUpdate::Updated)
    }

    /// Password check returning the member's wait-list view on success.
    pub fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Authentication, RegistryError> {
        let Some(user) = self.load_user(email)? else {
            return Ok(Authentication::UserNotFound);
        };

        if !credentials::verify(password, &user.password_hash) {
            return Ok(Authentication::InvalidCredentials);
        }

        Ok(Authentication::Authenticated(AccountSummary {
            position: user.position,
            solana_wallet: user.solana_wallet,
            ton_wallet: user.ton_wallet,
            referral_link: self.referral_link(&user.referral_code),
        }))
    }

    /// Issue a password-reset code. Unknown emails get a benign
    /// `UserNotFound` and no record is created.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<ResetRequest, RegistryError> {
        if self.store.get(&user_key(email))?.is_none() {
            return Ok(ResetRequest::UserNotFound);
        }

        let code = codes::numeric_code();
        self.store.put(&reset_key(email), code.as_bytes())?;
        debug!(email, "stored password reset code");

        deliver(
            self.notifier.as_ref(),
            &reset_message(email, &code),
            self.retry,
        )
        .await?;

        Ok(ResetRequest::CodeSent)
    }

    /// Check a reset code without consuming it.
    pub fn confirm_password_reset(
        &self,
        email: &str,
        submitted_code: &str,
    ) -> Result<ResetCodeCheck, RegistryError> {
        let stored = self.store.get(&reset_key(email))?;
        match stored {
            Some(code) if code == submitted_code.as_bytes() => Ok(ResetCodeCheck::Valid),
            _ => Ok(ResetCodeCheck::InvalidOrExpiredCode),
        }
    }

    /// Replace the stored password hash and consume the reset record.
    pub fn complete_password_reset(
        &self,
        email: &str,
        new_password: &SecretString,
    ) -> Result<ResetCompletion, RegistryError> {
        let Some(mut user) = self.load_user(email)? else {
            return Ok(ResetCompletion::UserNotFound);
        };

        user.password_hash = credentials::hash(new_password)?;
        self.store.put(&user_key(email), &encode(&user))?;
        self.store.delete(&reset_key(email))?;
        info!(email, "password reset");

        Ok(ResetCompletion::PasswordChanged)
    }

    /// Exact member count via a scan of the user range. O(n), which is
    /// fine at wait-list scale.
    pub fn total_user_count(&self) -> Result<u64, RegistryError> {
        Ok(self.store.scan_prefix(USER_PREFIX)?.len() as u64)
    }

    /// Total members plus the email -> referral-count mapping.
    pub fn referral_snapshot(&self) -> Result<ReferralSnapshot, RegistryError> {
        let total_users = self.total_user_count()?;
        let mut referrals = BTreeMap::new();
        for (key, value) in self.store.scan_prefix(REFERRALS_PREFIX)? {
            let email = key[REFERRALS_PREFIX.len()..].to_string();
            referrals.insert(email, parse_referral_count(&value));
        }
        Ok(ReferralSnapshot {
            total_users,
            referrals,
        })
    }

    /// Liveness probe for the health endpoint: one cheap read.
    pub fn probe(&self) -> Result<(), RegistryError> {
        self.store.get(&user_key("\u{0}"))?;
        Ok(())
    }

    fn credit_referral(&self, token: &str) -> Result<(), RegistryError> {
        let Some(raw) = self.store.get(&refcode_key(token))? else {
            debug!(token, "no referrer for referral token");
            return Ok(());
        };
        let referrer = String::from_utf8_lossy(&raw).to_string();

        let count = self
            .store
            .get(&referrals_key(&referrer))?
            .map(|raw| parse_referral_count(&raw))
            .unwrap_or(0);
        if count >= MAX_REFERRALS {
            debug!(referrer, count, "referral cap reached, referral dropped");
            return Ok(());
        }

        let count = count + 1;
        self.store
            .put(&referrals_key(&referrer), count.to_string().as_bytes())?;
        info!(referrer, count, "referral credited");
        Ok(())
    }

    /// Draw referral codes until one is absent from the index.
    fn unused_referral_code(&self) -> Result<String, RegistryError> {
        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let code = codes::referral_code();
            if self.store.get(&refcode_key(&code))?.is_none() {
                return Ok(code);
            }
            warn!(code, "referral code collision, regenerating");
        }
        Err(RegistryError::ReferralCodesExhausted)
    }

    fn referral_link(&self, referral_code: &str) -> String {
        let mut link = self.referral_base.clone();
        link.query_pairs_mut().append_pair("ref", referral_code);
        link.to_string()
    }

    fn load_pending(&self, email: &str) -> Result<Option<PendingVerification>, RegistryError> {
        self.load_record(&verification_key(email))
    }

    fn load_user(&self, email: &str) -> Result<Option<User>, RegistryError> {
        self.load_record(&user_key(email))
    }

    fn load_record<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, RegistryError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| RegistryError::CorruptRecord {
                key: key.to_string(),
                source,
            })
    }
}

fn encode<T: serde::Serialize>(record: &T) -> Vec<u8> {
    // Records are plain structs; serialization cannot fail.
    serde_json::to_vec(record).unwrap_or_default()
}

fn trimmed(input: Option<&str>) -> Option<&str> {
    input.map(str::trim).filter(|s| !s.is_empty())
}

fn verification_message(email: &str, code: &str) -> Message {
    Message {
        to: email.to_string(),
        subject: "Wait-List Verification Code".to_string(),
        body: format!(
            "Hello,\n\nThank you for joining the wait-list! Your verification code is:\n\n\
             {code}\n\nPlease enter this code on the website to verify your email.\n\n\
             Best regards,\nThe Waitlist Team"
        ),
    }
}

fn reset_message(email: &str, code: &str) -> Message {
    Message {
        to: email.to_string(),
        subject: "Password Reset Code".to_string(),
        body: format!(
            "Hello,\n\nYou requested to reset your wait-list password. Your reset code is:\n\n\
             {code}\n\nPlease enter this code on the website to reset your password.\n\n\
             Best regards,\nThe Waitlist Team"
        ),
    }
}
