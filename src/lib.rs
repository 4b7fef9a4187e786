//! # Waitlist
//!
//! Wait-list registration service: users register an email/password,
//! verify ownership via a one-time code, receive a queue position,
//! optionally attach Solana/TON wallet addresses, and can refer other
//! registrants through a personal referral code (capped at
//! [`registry::MAX_REFERRALS`] per referrer). A parallel flow resets
//! passwords via a second one-time code.
//!
//! ## Data model
//!
//! Everything persists in one flat, ordered key space partitioned by
//! prefix (`user:`, `verification:`, `referrals:`, `reset:`, plus the
//! `refcode:` index from referral code to owner). Records are JSON except
//! counters (decimal strings) and reset codes (raw strings).
//!
//! ## Layers
//!
//! - [`store`]: the key-value contract plus redb and in-memory backends.
//! - [`registry`]: the state machine and its invariants.
//! - [`notifier`]: message delivery with linear-backoff retries.
//! - [`api`]: the axum HTTP surface.
//! - [`cli`]: argument parsing, logging setup and the server action.

pub mod api;
pub mod cli;
pub mod codes;
pub mod credentials;
pub mod notifier;
pub mod registry;
pub mod store;
