//! Default values for taxon configuration.
//!
//! Single source of truth for defaults shared across crates. Run
//! configuration resolves every optional knob against these constants at
//! construction time, so no component ever sees an unset field.

// ─── Hierarchy shape ───────────────────────────────────────────────────────

/// Default cluster counts per level, finest first.
///
/// | Level | Count | Meaning |
/// |-------|-------|------------------------|
/// | 0     | 50    | Topic clusters         |
/// | 1     | 25    | Super-clusters         |
/// | 2     | 5     | Top-level categories   |
pub const LEVEL_KS: &[usize] = &[50, 25, 5];

/// Seed for the partitioner's random state. Fixed so repeated runs over the
/// same input produce the same group membership.
pub const RANDOM_SEED: u64 = 42;

/// Number of k-means restarts; the lowest-inertia run wins.
pub const KMEANS_RESTARTS: usize = 10;

// ─── Concurrency and batching ──────────────────────────────────────────────

/// Number of texts per embedding request.
pub const EMBED_BATCH_SIZE: usize = 128;

/// Maximum embedding batches in flight at once.
pub const EMBED_CONCURRENCY: usize = 8;

/// Maximum label-generation calls in flight at once.
pub const LABEL_CONCURRENCY: usize = 5;

// ─── Prompt truncation ─────────────────────────────────────────────────────

/// Maximum number of member texts included in a labeling prompt.
pub const MAX_ITEMS_PER_PROMPT: usize = 60;

/// Maximum characters of member text included in a labeling prompt.
pub const MAX_CHARS_PER_PROMPT: usize = 8000;

// ─── Retry policy ──────────────────────────────────────────────────────────

/// Additional attempts after the first failure.
pub const MAX_RETRIES: u32 = 6;

/// Base backoff delay in milliseconds.
pub const BASE_DELAY_MS: u64 = 1000;

/// Backoff delay cap in milliseconds (jitter is added on top).
pub const MAX_DELAY_MS: u64 = 30_000;

/// HTTP statuses treated as transient.
pub const RETRYABLE_HTTP_STATUS: &[u16] = &[408, 409, 425, 429, 500, 502, 503, 504];
