//! Runtime configuration for the vanity key search.

use clap::{Args, Parser, Subcommand};

use crate::error::Error;
use crate::matcher::Base64Prefix;

/// WireGuard vanity key search
///
/// Finds a Curve25519 keypair whose base64-encoded public key starts
/// with the given prefix, by walking the curve in fixed increments
/// instead of deriving a fresh keypair per candidate.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub search: SearchConfig,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add an offset to a private key read from stdin (base64, one line)
    /// and print the resulting vanity private key.
    Add(AddConfig),
}

#[derive(Args, Debug, Clone)]
pub struct SearchConfig {
    /// Prefix of the base64-encoded public key
    #[arg(short, long, default_value = "AY/")]
    pub prefix: String,

    /// Start from this public key instead of generating a keypair;
    /// the private key stays with you and only the offset is printed
    #[arg(long)]
    pub public: Option<String>,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Stop after this many seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Stop after finding this many keys
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Candidates tested per batched inversion
    #[arg(short, long, default_value = "1024")]
    pub batch_size: usize,

    /// Give up after this many candidates per worker
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Print only the decimal offset of each match
    #[arg(long)]
    pub offset_only: bool,

    /// Progress report interval in seconds
    #[arg(short, long, default_value = "5")]
    pub report_interval: u64,
}

#[derive(Args, Debug, Clone)]
pub struct AddConfig {
    /// Decimal offset to add to the private key
    #[arg(short, long)]
    pub offset: String,
}

impl SearchConfig {
    /// Number of workers, defaulting to the CPU count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Validates the configuration and compiles the prefix.
    pub fn validate(&self) -> Result<Base64Prefix, Error> {
        if self.count == 0 {
            return Err(Error::InvalidConfig("count must be at least 1".into()));
        }

        let batch = self.batch_size;
        if !(2..=8192).contains(&batch) || !batch.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "batch size must be a power of two in [2, 8192], got {}",
                batch
            )));
        }

        Base64Prefix::new(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(prefix: &str, batch_size: usize) -> SearchConfig {
        SearchConfig {
            prefix: prefix.into(),
            public: None,
            workers: None,
            timeout: None,
            count: 1,
            batch_size,
            limit: None,
            offset_only: false,
            report_interval: 5,
        }
    }

    #[test]
    fn accepts_valid_configuration() {
        assert!(make_config("AY/", 1024).validate().is_ok());
        assert!(make_config("a", 2).validate().is_ok());
        assert!(make_config("2025", 8192).validate().is_ok());
    }

    #[test]
    fn rejects_bad_prefix() {
        assert!(make_config("not!base64", 1024).validate().is_err());
        assert!(make_config("", 1024).validate().is_err());
    }

    #[test]
    fn rejects_bad_batch_size() {
        assert!(make_config("AY/", 0).validate().is_err());
        assert!(make_config("AY/", 1000).validate().is_err());
        assert!(make_config("AY/", 16384).validate().is_err());
        assert!(make_config("AY/", 3).validate().is_err());
    }
}
