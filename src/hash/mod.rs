//! Container digest functions and detection.
//!
//! A container's digest covers `[VERSION_OFFSET, total_size)`.  Two hash
//! functions are in circulation; which one produced a given container is not
//! recorded anywhere, so it is recovered by recomputing both and comparing
//! against the stored digest.  The primary function wins a tie.

use crate::container::{hashed_range, stored_digest};
use crate::header::{Digest, DIGEST_LEN};

// ── HashFunction ─────────────────────────────────────────────────────────────

/// Which of the two digest functions to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum HashFunction {
    #[default]
    Primary,
    Alternate,
}

impl HashFunction {
    /// Human-readable name (diagnostics only).
    pub fn name(self) -> &'static str {
        match self {
            HashFunction::Primary   => "primary",
            HashFunction::Alternate => "alternate",
        }
    }
}

// ── Hasher trait ─────────────────────────────────────────────────────────────

/// The pair of deterministic digest functions.  Implementations must be pure.
pub trait ContainerHasher: Send + Sync {
    fn primary(&self, bytes: &[u8]) -> Digest;
    fn alternate(&self, bytes: &[u8]) -> Digest;

    fn digest(&self, func: HashFunction, bytes: &[u8]) -> Digest {
        match func {
            HashFunction::Primary   => self.primary(bytes),
            HashFunction::Alternate => self.alternate(bytes),
        }
    }
}

/// MD5 as primary (the digest DXBC containers carry), BLAKE3 truncated to
/// 16 bytes as alternate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardHasher;

impl ContainerHasher for StandardHasher {
    fn primary(&self, bytes: &[u8]) -> Digest {
        md5::compute(bytes).0
    }

    fn alternate(&self, bytes: &[u8]) -> Digest {
        let full = blake3::hash(bytes);
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&full.as_bytes()[..DIGEST_LEN]);
        out
    }
}

// ── Container-level helpers ──────────────────────────────────────────────────

/// Digest of a complete container's hashed range.
pub fn compute_digest(hasher: &dyn ContainerHasher, func: HashFunction, container: &[u8]) -> Digest {
    hasher.digest(func, hashed_range(container))
}

/// Which function, if either, produced the digest stored in `container`.
pub fn detect_hash_function(hasher: &dyn ContainerHasher, container: &[u8]) -> Option<HashFunction> {
    let stored = stored_digest(container)?;
    let range = hashed_range(container);
    if hasher.primary(range) == stored {
        Some(HashFunction::Primary)
    } else if hasher.alternate(range) == stored {
        Some(HashFunction::Alternate)
    } else {
        None
    }
}
