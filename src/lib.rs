//! # wg_vanity
//!
//! Brute-force search for WireGuard (Curve25519) keypairs whose
//! base64-encoded public key starts with a chosen prefix.
//!
//! Instead of deriving a fresh keypair per candidate, workers walk the
//! curve by a fixed increment Q = 8*B and test the Montgomery
//! u-coordinate of every point they pass, amortizing the modular
//! inversion over whole batches. A found offset n converts back to a
//! private key as s0 ± 8n.
//!
//! ## Architecture
//!
//! - `curve`: field and Edwards point arithmetic, batched division
//! - `crypto`: keypair generation, clamping, offset recovery
//! - `matcher`: base64 prefix compilation and candidate testing
//! - `worker`: batch enumerator, worker threads, pool coordination
//! - `config`: runtime configuration

pub mod config;
pub mod crypto;
pub mod curve;
pub mod error;
pub mod matcher;
pub mod worker;

pub use config::Config;
pub use crypto::{add_offset, decode_public, Keypair};
pub use error::Error;
pub use matcher::Base64Prefix;
pub use worker::{PoolOptions, SearchOutcome, SearchReport, VanityResult, WorkerPool};
