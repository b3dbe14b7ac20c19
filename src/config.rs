//! Process-wide defaults resolved once at startup.
//!
//! The only environment-dependent value is the worker-thread count: it is
//! derived from the host CPU count, optionally overridden by `SEQKIT_THREADS`,
//! and then injected as the default of the `--threads` flag so a user can still
//! override it per invocation.

use std::env;
use std::thread;

/// Environment variable overriding the computed default thread count.
pub const THREADS_ENV: &str = "SEQKIT_THREADS";

/// Upper bound applied to the CPU-derived default (not to explicit overrides).
pub const MAX_DEFAULT_THREADS: usize = 4;

pub const DEFAULT_LINE_WIDTH: i64 = 60;
pub const DEFAULT_ALPHABET_GUESS_SEQ_LENGTH: i64 = 10_000;
pub const DEFAULT_COMPRESS_LEVEL: i64 = -1;
pub const DEFAULT_OUT_FILE: &str = "-";

/// Default pattern for extracting a record ID from a FASTA/Q header.
pub const DEFAULT_ID_REGEXP: &str = r"^(\S+)\s?";

/// Pattern used instead of `--id-regexp` when `--id-ncbi` is given,
/// e.g. `>gi|110645304|ref|NC_002516.2| Pseud...`.
pub const NCBI_ID_REGEXP: &str = r"\|([^\|]+)\| ";

/// Compute the default worker-thread count.
///
/// `min(host_cpus, 4)`, replaced by `env_value` when it parses as a base-10
/// integer. A result below 1 falls back to the full, uncapped host CPU count.
/// A malformed override is ignored, never reported.
pub fn resolve_default_threads(host_cpus: usize, env_value: &str) -> usize {
    let mut base = host_cpus.min(MAX_DEFAULT_THREADS) as i64;
    if !env_value.is_empty() {
        if let Ok(t) = env_value.parse::<i64>() {
            base = t;
        }
    }
    if base < 1 {
        return host_cpus;
    }
    base as usize
}

/// Number of logical CPUs visible to this process.
pub fn host_cpu_count() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Materialized defaults, computed once and handed to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub threads: usize,
    pub line_width: i64,
    pub alphabet_guess_seq_length: i64,
    pub compress_level: i64,
    pub out_file: String,
    pub id_regexp: String,
}

impl Defaults {
    /// Build defaults for the given host CPU count and raw `SEQKIT_THREADS` value.
    pub fn with_threads(host_cpus: usize, env_value: &str) -> Self {
        Self {
            threads: resolve_default_threads(host_cpus, env_value),
            line_width: DEFAULT_LINE_WIDTH,
            alphabet_guess_seq_length: DEFAULT_ALPHABET_GUESS_SEQ_LENGTH,
            compress_level: DEFAULT_COMPRESS_LEVEL,
            out_file: DEFAULT_OUT_FILE.to_string(),
            id_regexp: DEFAULT_ID_REGEXP.to_string(),
        }
    }

    /// Read the host and the process environment. Call once per process.
    pub fn from_env() -> Self {
        let env_value = env::var(THREADS_ENV).unwrap_or_default();
        Self::with_threads(host_cpu_count(), &env_value)
    }
}
